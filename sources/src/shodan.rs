use async_trait::async_trait;
use forge_common::source::SourceKind;
use forge_common::Domain;
use serde::Deserialize;

use crate::{SourceClient, SourceError, dedup_labels, read_body};

#[derive(Debug, Deserialize)]
struct DomainInfo {
    #[serde(default)]
    data: Vec<DnsRecord>,
}

#[derive(Debug, Deserialize)]
struct DnsRecord {
    #[serde(default)]
    subdomain: String,
}

/// Shodan's DNS domain endpoint.
///
/// Apex records come back with an empty `subdomain` and are dropped.
pub struct ShodanClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ShodanClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl SourceClient for ShodanClient {
    fn kind(&self) -> SourceKind {
        SourceKind::SearchApi
    }

    async fn query(&self, domain: &Domain) -> Result<Vec<String>, SourceError> {
        let key: &str = self
            .api_key
            .as_deref()
            .ok_or(SourceError::MissingKey(self.kind()))?;

        let response = self
            .http
            .get(format!("{}/dns/domain/{domain}", self.base_url))
            .query(&[("key", key)])
            .send()
            .await?;

        let body: String = read_body(response).await?;
        let info: DomainInfo = serde_json::from_str(&body)?;

        Ok(dedup_labels(info.data.into_iter().map(|record| record.subdomain)))
    }
}
