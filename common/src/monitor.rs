//! Monitoring state of a domain as exposed to callers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;
use crate::source::SourceSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    Active,
    Paused,
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Paused => f.write_str("paused"),
        }
    }
}

/// Snapshot of one monitor entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorView {
    pub domain: Domain,
    pub state: MonitorState,
    /// Subdomains found by the scheduler since the entry was added, oldest first.
    pub new_subdomains: Vec<String>,
    pub sources: SourceSet,
    pub capture_screenshots: bool,
}
