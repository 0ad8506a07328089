//! # Scan History Records
//!
//! Every finished scan, interactive or scheduled, is stored as an immutable
//! [`ScanRecord`]. Records are addressed by a [`RecordId`] that is never reused,
//! so deleting one record never shifts the identity of another.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::domain::Domain;

/// Liveness outcome per subdomain. `None` means unreachable or timed out.
pub type ProbeResult = BTreeMap<String, Option<u16>>;

/// Stable identifier of a stored scan record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(RecordId)
    }
}

/// What produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOrigin {
    /// Requested by a user.
    Interactive,
    /// Written by the background monitor.
    Monitor,
}

/// A record before the store has assigned it an id.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub domain: Domain,
    pub origin: ScanOrigin,
    pub subdomain_statuses: ProbeResult,
    /// `Some` when screenshots were requested, even if every capture failed.
    pub screenshots: Option<BTreeMap<String, PathBuf>>,
}

impl NewRecord {
    pub fn new(domain: Domain, origin: ScanOrigin, subdomain_statuses: ProbeResult) -> Self {
        Self {
            domain,
            origin,
            subdomain_statuses,
            screenshots: None,
        }
    }

    pub fn with_screenshots(mut self, screenshots: BTreeMap<String, PathBuf>) -> Self {
        self.screenshots = Some(screenshots);
        self
    }
}

/// A completed scan as kept in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub id: RecordId,
    pub timestamp: DateTime<Local>,
    pub domain: Domain,
    pub origin: ScanOrigin,
    pub subdomain_statuses: ProbeResult,
    pub screenshots: Option<BTreeMap<String, PathBuf>>,
    pub num_subdomains: usize,
}

impl ScanRecord {
    pub fn from_new(id: RecordId, new: NewRecord) -> Self {
        let num_subdomains: usize = new.subdomain_statuses.len();
        Self {
            id,
            timestamp: Local::now(),
            domain: new.domain,
            origin: new.origin,
            subdomain_statuses: new.subdomain_statuses,
            screenshots: new.screenshots,
            num_subdomains,
        }
    }

    /// Number of subdomains that answered the liveness probe.
    pub fn live_count(&self) -> usize {
        self.subdomain_statuses.values().filter(|s| s.is_some()).count()
    }

    pub fn screenshot_of(&self, subdomain: &str) -> Option<&PathBuf> {
        self.screenshots.as_ref()?.get(subdomain)
    }
}
