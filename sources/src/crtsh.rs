//! Certificate transparency lookups through crt.sh.
//!
//! crt.sh answers with full certificate names, several per entry separated by
//! newlines and sometimes wildcards. They are narrowed down to labels of the
//! requested domain so every source speaks the same language.

use async_trait::async_trait;
use forge_common::source::SourceKind;
use forge_common::Domain;
use serde::Deserialize;

use crate::{SourceClient, SourceError, dedup_labels, read_body};

#[derive(Debug, Deserialize)]
struct CertEntry {
    #[serde(default)]
    name_value: Option<String>,
}

pub struct CrtShClient {
    http: reqwest::Client,
    base_url: String,
}

impl CrtShClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SourceClient for CrtShClient {
    fn kind(&self) -> SourceKind {
        SourceKind::CertTransparency
    }

    async fn query(&self, domain: &Domain) -> Result<Vec<String>, SourceError> {
        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .query(&[("q", format!("%.{domain}").as_str()), ("output", "json")])
            .send()
            .await?;

        let body: String = read_body(response).await?;
        let entries: Vec<CertEntry> = serde_json::from_str(&body)?;

        Ok(labels_from_entries(domain, entries))
    }
}

fn labels_from_entries(domain: &Domain, entries: Vec<CertEntry>) -> Vec<String> {
    let names = entries
        .into_iter()
        .filter_map(|entry| entry.name_value)
        .flat_map(|value| {
            value
                .lines()
                .map(|line| line.trim().trim_start_matches("*.").to_string())
                .collect::<Vec<String>>()
        });

    dedup_labels(names.filter_map(|name| domain.label_of(&name).map(str::to_string)))
}
