use forge_common::source::SourceKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no API key configured for {0}")]
    MissingKey(SourceKind),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}
