use std::sync::Arc;
use std::time::Duration;

use forge_common::Domain;
use forge_common::config::MonitorConfig;
use forge_common::record::ScanOrigin;
use forge_common::source::{SourceKind, SourceSet};
use forge_core::{DomainOutcome, MonitorOptions, ScanOptions};
use wiremock::MockServer;

use crate::support::{self, ScriptedProbe};

fn chaos_only() -> SourceSet {
    SourceSet::none().with(SourceKind::PassiveDns)
}

fn scan_options() -> ScanOptions {
    ScanOptions {
        sources: chaos_only(),
        ..ScanOptions::default()
    }
}

fn monitor_options() -> MonitorOptions {
    MonitorOptions {
        sources: Some(chaos_only()),
        capture_screenshots: None,
    }
}

#[tokio::test]
async fn cycle_reports_only_the_new_subdomain() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    support::chaos_mock("example.com", &["www"]).up_to_n_times(1).mount(&server).await;
    support::chaos_mock("example.com", &["www", "beta"]).mount(&server).await;

    let probe = Arc::new(ScriptedProbe::new(&[("www.example.com", 200), ("beta.example.com", 200)]));
    let svc = support::service(&server, dir.path(), probe.clone());

    svc.scan("example.com", &scan_options()).await.unwrap();
    svc.add_monitor_with("example.com", monitor_options()).unwrap();
    probe.calls.lock().unwrap().clear();

    let report = svc.scheduler(MonitorConfig::default()).run_cycle().await;

    let domain: Domain = "example.com".parse().unwrap();
    assert_eq!(
        report.new_subdomains(&domain).map(|found| found.iter().cloned().collect::<Vec<_>>()),
        Some(vec!["beta.example.com".to_string()])
    );
    assert_eq!(probe.calls(), vec!["beta.example.com"]);
    assert_eq!(svc.monitors()[0].new_subdomains, vec!["beta.example.com"]);

    let latest = svc.store().latest_for(&domain).unwrap();
    assert_eq!(latest.origin, ScanOrigin::Monitor);
    assert_eq!(latest.num_subdomains, 2);
}

#[tokio::test]
async fn paused_domain_is_left_alone() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    support::chaos_mock("example.com", &["www"]).mount(&server).await;

    let probe = Arc::new(ScriptedProbe::default());
    let svc = support::service(&server, dir.path(), probe.clone());
    svc.add_monitor_with("example.com", monitor_options()).unwrap();
    svc.pause_monitor("example.com").unwrap();

    let scheduler = svc.scheduler(MonitorConfig::default());
    assert!(scheduler.run_cycle().await.outcomes.is_empty());
    assert!(probe.calls().is_empty());

    svc.resume_monitor("example.com").unwrap();
    let report = scheduler.run_cycle().await;
    let domain: Domain = "example.com".parse().unwrap();
    assert_eq!(report.outcomes[&domain], DomainOutcome::Baseline { subdomains: 1 });
}

#[tokio::test]
async fn removed_domain_loses_history_and_artifacts() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    support::chaos_mock("example.com", &["www"]).mount(&server).await;

    let probe = Arc::new(ScriptedProbe::new(&[("www.example.com", 200)]));
    let svc = support::service(&server, dir.path(), probe);
    let options = ScanOptions {
        capture_screenshots: true,
        ..scan_options()
    };
    svc.scan("example.com", &options).await.unwrap();
    svc.add_monitor_with("example.com", monitor_options()).unwrap();

    assert_eq!(svc.remove_monitor("example.com").await.unwrap(), 1);
    assert!(svc.history().is_empty());
    assert!(!dir.path().join("screenshots/example.com").exists());
    assert!(svc.scheduler(MonitorConfig::default()).run_cycle().await.outcomes.is_empty());
}

#[tokio::test]
async fn interactive_scans_proceed_while_the_monitor_runs() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    support::chaos_mock("watched.com", &["www", "new"]).mount(&server).await;
    support::chaos_mock("other.com", &["www"]).mount(&server).await;

    let probe = Arc::new(ScriptedProbe::default());
    let svc = support::service(&server, dir.path(), probe);
    svc.add_monitor_with("watched.com", monitor_options()).unwrap();

    let handle = svc
        .scheduler(MonitorConfig {
            interval: Duration::from_millis(20),
            ..MonitorConfig::default()
        })
        .spawn();

    let record = svc.scan("other.com", &scan_options()).await.unwrap();
    assert_eq!(record.num_subdomains, 1);

    let watched: Domain = "watched.com".parse().unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while !svc.store().has_history(&watched) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    handle.shutdown().await;
    assert_eq!(svc.store().known_set(&watched).len(), 2);
}
