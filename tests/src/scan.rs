use std::sync::Arc;

use forge_common::error::ForgeError;
use forge_common::source::{SourceKind, SourceSet};
use forge_core::ScanOptions;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::support::{self, ScriptedProbe};

#[tokio::test]
async fn three_sources_merge_into_one_probed_record() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    support::mount_crtsh(&server, "example.com", &["www.example.com\\n*.api.example.com", "example.com"]).await;
    support::chaos_mock("example.com", &["api", "mail"]).mount(&server).await;
    support::mount_shodan(&server, "example.com", &["", "www"]).await;

    let probe = Arc::new(ScriptedProbe::new(&[("www.example.com", 200), ("api.example.com", 401)]));
    let svc = support::service(&server, dir.path(), probe.clone());

    let record = svc.scan("example.com", &ScanOptions::default()).await.unwrap();

    assert_eq!(record.num_subdomains, 3);
    assert_eq!(probe.calls(), vec!["api.example.com", "mail.example.com", "www.example.com"]);
    assert_eq!(record.subdomain_statuses["www.example.com"], Some(200));
    assert_eq!(record.subdomain_statuses["api.example.com"], Some(401));
    assert_eq!(record.subdomain_statuses["mail.example.com"], None);
}

#[tokio::test]
async fn rejected_key_degrades_to_remaining_sources() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/dns/example.com/subdomains"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error": "unauthorized"}"#))
        .mount(&server)
        .await;
    support::mount_shodan(&server, "example.com", &["vpn"]).await;

    let svc = support::service(&server, dir.path(), Arc::new(ScriptedProbe::default()));
    let options = ScanOptions {
        sources: SourceSet::none().with(SourceKind::PassiveDns).with(SourceKind::SearchApi),
        ..ScanOptions::default()
    };

    let record = svc.scan("example.com", &options).await.unwrap();
    assert_eq!(record.subdomain_statuses.keys().collect::<Vec<_>>(), vec!["vpn.example.com"]);
}

#[tokio::test]
async fn every_source_down_still_records_an_empty_scan() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let svc = support::service(&server, dir.path(), Arc::new(ScriptedProbe::default()));
    let record = svc.scan("example.com", &ScanOptions::default()).await.unwrap();

    assert_eq!(record.num_subdomains, 0);
    assert_eq!(svc.history().len(), 1);
}

#[tokio::test]
async fn invalid_domain_never_reaches_the_sources() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let svc = support::service(&server, dir.path(), Arc::new(ScriptedProbe::default()));
    let err = svc.scan("not a domain", &ScanOptions::default()).await.unwrap_err();

    assert!(matches!(err, ForgeError::InvalidDomain(_)));
}

#[tokio::test]
async fn screenshots_and_csv_are_removed_with_the_record() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    support::chaos_mock("example.com", &["www", "api"]).mount(&server).await;

    let probe = Arc::new(ScriptedProbe::new(&[("www.example.com", 200)]));
    let svc = support::service(&server, dir.path(), probe);
    let options = ScanOptions {
        sources: SourceSet::none().with(SourceKind::PassiveDns),
        capture_screenshots: true,
        export_csv: true,
    };

    let record = svc.scan("example.com", &options).await.unwrap();

    let shot = record.screenshot_of("www.example.com").unwrap().clone();
    assert!(shot.exists());
    assert_eq!(shot, dir.path().join("screenshots/example.com/www.example.com.png"));
    let csv = std::fs::read_to_string(svc.csv_path(&record.domain)).unwrap();
    assert!(csv.contains("api.example.com,\n"));
    assert!(csv.contains("www.example.com,200\n"));

    svc.delete_record(record.id).await.unwrap();
    assert!(!dir.path().join("screenshots/example.com").exists());
    assert!(matches!(svc.record(record.id), Err(ForgeError::RecordNotFound(_))));
}
