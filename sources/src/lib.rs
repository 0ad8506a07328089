//! The **abstraction** over passive subdomain sources.
//!
//! Each provider (certificate transparency, passive DNS, search API) has its own
//! endpoint, authentication and response schema, but callers only ever see
//! [`SourceClient::fetch`]: a list of labels for a domain that is empty when
//! the provider could not be used.
//!
//! **Architectural Note:**
//! A source must never fail the scan that asked it. Concrete clients report
//! problems through [`SourceClient::query`]; the provided `fetch` turns every
//! error into a logged diagnostic and an empty result, so the aggregator can
//! merge whatever the remaining sources return.

use std::sync::Arc;

use async_trait::async_trait;
use forge_common::config::SourceSettings;
use forge_common::error::ForgeError;
use forge_common::source::SourceKind;
use forge_common::Domain;
use tracing::{debug, warn};

mod chaos;
mod crtsh;
mod error;
mod shodan;

pub use chaos::ChaosClient;
pub use crtsh::CrtShClient;
pub use error::SourceError;
pub use shodan::ShodanClient;

/// A single passive reconnaissance provider.
#[async_trait]
pub trait SourceClient: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Performs the request and decodes the provider specific payload into labels.
    async fn query(&self, domain: &Domain) -> Result<Vec<String>, SourceError>;

    /// Like [`SourceClient::query`] but never fails.
    async fn fetch(&self, domain: &Domain) -> Vec<String> {
        match self.query(domain).await {
            Ok(labels) => {
                debug!(source = %self.kind(), %domain, count = labels.len(), "source answered");
                labels
            }
            Err(err) => {
                let unavailable = ForgeError::SourceUnavailable {
                    kind: self.kind(),
                    reason: err.to_string(),
                };
                warn!(%domain, "{unavailable}");
                Vec::new()
            }
        }
    }
}

/// Builds one client per known source from the configured endpoints and keys.
pub fn build_clients(settings: &SourceSettings) -> Result<Vec<Arc<dyn SourceClient>>, SourceError> {
    let http: reqwest::Client = http_client(settings)?;

    Ok(vec![
        Arc::new(CrtShClient::new(http.clone(), &settings.crtsh_url)),
        Arc::new(ChaosClient::new(http.clone(), &settings.chaos_url, settings.chaos_key.clone())),
        Arc::new(ShodanClient::new(http, &settings.shodan_url, settings.shodan_key.clone())),
    ])
}

/// Shared HTTP client with the per request ceiling applied.
pub fn http_client(settings: &SourceSettings) -> Result<reqwest::Client, SourceError> {
    let client = reqwest::Client::builder()
        .timeout(settings.timeout)
        .user_agent(concat!("forge/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Reads a successful response body or turns the status into an error.
pub(crate) async fn read_body(response: reqwest::Response) -> Result<String, SourceError> {
    let status = response.status();
    let body: String = response.text().await?;
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            body: truncate(&body, 200),
        });
    }
    Ok(body)
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Drops labels that cannot prefix a host name and keeps the first
/// occurrence of every other one.
pub(crate) fn dedup_labels<I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    labels
        .into_iter()
        .filter(|label| is_host_label(label))
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

fn is_host_label(label: &str) -> bool {
    !label.contains(['/', '\\']) && label.split('.').all(|part| !part.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    #[async_trait]
    impl SourceClient for Broken {
        fn kind(&self) -> SourceKind {
            SourceKind::SearchApi
        }

        async fn query(&self, _domain: &Domain) -> Result<Vec<String>, SourceError> {
            Err(SourceError::MissingKey(SourceKind::SearchApi))
        }
    }

    #[tokio::test]
    async fn fetch_swallows_query_errors() {
        let domain: Domain = "example.com".parse().unwrap();
        assert!(Broken.fetch(&domain).await.is_empty());
    }

    #[test]
    fn dedup_keeps_order_and_case() {
        let labels = vec!["www".into(), "".into(), "API".into(), "www".into(), "api".into()];
        assert_eq!(dedup_labels(labels), vec!["www", "API", "api"]);
    }

    #[test]
    fn dedup_drops_labels_that_are_not_host_names() {
        let labels = vec![
            "../../escaped".into(),
            "a/b".into(),
            "a\\b".into(),
            "dev..internal".into(),
            ".lead".into(),
            "x.y".into(),
        ];
        assert_eq!(dedup_labels(labels), vec!["x.y"]);
    }

    #[test]
    fn truncate_marks_cut_bodies() {
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("abc", 3), "abc");
    }

    #[test]
    fn builds_one_client_per_kind() {
        let clients = build_clients(&SourceSettings::default()).unwrap();
        let kinds: Vec<SourceKind> = clients.iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, SourceKind::ALL.to_vec());
    }
}
