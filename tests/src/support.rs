use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use forge_common::config::Config;
use forge_common::error::ForgeError;
use forge_core::ReconService;
use forge_core::prober::HostProbe;
use forge_core::snapshot::{SnapshotPool, VisualSnapshotter};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CHAOS_KEY: &str = "chaos-test-key";
pub const SHODAN_KEY: &str = "shodan-test-key";

/// Answers with fixed status codes and remembers every host it was asked about.
#[derive(Default)]
pub struct ScriptedProbe {
    pub statuses: BTreeMap<String, u16>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub fn new(statuses: &[(&str, u16)]) -> Self {
        Self {
            statuses: statuses.iter().map(|(h, s)| (h.to_string(), *s)).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        let mut calls = self.calls.lock().unwrap().clone();
        calls.sort();
        calls
    }
}

#[async_trait]
impl HostProbe for ScriptedProbe {
    async fn status(&self, host: &str) -> Option<u16> {
        self.calls.lock().unwrap().push(host.to_string());
        self.statuses.get(host).copied()
    }
}

/// Writes a placeholder image instead of driving a browser.
pub struct FileCamera;

#[async_trait]
impl VisualSnapshotter for FileCamera {
    async fn capture(&self, _url: &str, output: &Path) -> Result<(), ForgeError> {
        tokio::fs::write(output, b"\x89PNG").await.map_err(|e| ForgeError::io(output, e))
    }
}

pub fn config(server: &MockServer, dir: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.sources.crtsh_url = server.uri();
    cfg.sources.chaos_url = server.uri();
    cfg.sources.shodan_url = server.uri();
    cfg.sources.chaos_key = Some(CHAOS_KEY.to_string());
    cfg.sources.shodan_key = Some(SHODAN_KEY.to_string());
    cfg.artifacts.root = dir.join("screenshots");
    cfg.artifacts.export_dir = dir.to_path_buf();
    cfg
}

/// Service using the real source clients against `server`.
pub fn service(server: &MockServer, dir: &Path, probe: Arc<ScriptedProbe>) -> ReconService {
    let cfg = config(server, dir);
    let clients = forge_sources::build_clients(&cfg.sources).unwrap();
    let pool = SnapshotPool::new(vec![Arc::new(FileCamera)]);
    ReconService::new(cfg, clients, probe, Some(pool))
}

pub async fn mount_crtsh(server: &MockServer, domain: &str, names: &[&str]) {
    let entries: Vec<String> = names
        .iter()
        .map(|name| format!(r#"{{"name_value": "{name}"}}"#))
        .collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("q", format!("%.{domain}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("[{}]", entries.join(","))))
        .mount(server)
        .await;
}

pub fn chaos_mock(domain: &str, labels: &[&str]) -> Mock {
    let quoted: Vec<String> = labels.iter().map(|l| format!("\"{l}\"")).collect();
    Mock::given(method("GET"))
        .and(path(format!("/dns/{domain}/subdomains")))
        .and(header("Authorization", format!("Bearer {CHAOS_KEY}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"domain": "{domain}", "subdomains": [{}]}}"#,
            quoted.join(",")
        )))
}

pub async fn mount_shodan(server: &MockServer, domain: &str, labels: &[&str]) {
    let records: Vec<String> = labels
        .iter()
        .map(|l| format!(r#"{{"subdomain": "{l}", "type": "A"}}"#))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/dns/domain/{domain}")))
        .and(query_param("key", SHODAN_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(r#"{{"data": [{}]}}"#, records.join(","))))
        .mount(server)
        .await;
}
