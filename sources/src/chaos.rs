use async_trait::async_trait;
use forge_common::source::SourceKind;
use forge_common::Domain;
use serde::Deserialize;

use crate::{SourceClient, SourceError, dedup_labels, read_body};

#[derive(Debug, Deserialize)]
struct ChaosResponse {
    #[serde(default)]
    subdomains: Vec<String>,
}

/// Passive DNS dataset of ProjectDiscovery Chaos.
pub struct ChaosClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ChaosClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl SourceClient for ChaosClient {
    fn kind(&self) -> SourceKind {
        SourceKind::PassiveDns
    }

    async fn query(&self, domain: &Domain) -> Result<Vec<String>, SourceError> {
        let key: &str = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingKey(self.kind()))?;

        let response = self
            .http
            .get(format!("{}/dns/{domain}/subdomains", self.base_url))
            .bearer_auth(key)
            .send()
            .await?;

        let body: String = read_body(response).await?;
        let decoded: ChaosResponse = serde_json::from_str(&body)?;

        Ok(dedup_labels(decoded.subdomains))
    }
}
