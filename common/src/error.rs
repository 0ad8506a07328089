use std::path::PathBuf;

use thiserror::Error;

use crate::domain::Domain;
use crate::record::RecordId;
use crate::source::SourceKind;

/// Failures the recon core can observe.
///
/// Only [`ForgeError::InvalidDomain`], [`ForgeError::RecordNotFound`],
/// [`ForgeError::NotMonitored`] and artifact I/O reach callers. Source, probe
/// and capture failures are logged where they happen and the scan carries on
/// with whatever data is left.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("invalid domain name: {0:?}")]
    InvalidDomain(String),

    #[error("source {kind} unavailable: {reason}")]
    SourceUnavailable { kind: SourceKind, reason: String },

    #[error("probe of {0} timed out")]
    ProbeTimeout(String),

    #[error("{host} is unreachable: {reason}")]
    ProbeUnreachable { host: String, reason: String },

    #[error("no scan record with id {0}")]
    RecordNotFound(RecordId),

    #[error("screenshot of {host} failed: {reason}")]
    CaptureFailure { host: String, reason: String },

    #[error("{0} is not monitored")]
    NotMonitored(Domain),

    #[error("artifact I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ForgeError {
    pub fn capture(host: impl Into<String>, reason: impl ToString) -> Self {
        Self::CaptureFailure {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
