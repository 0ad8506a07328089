use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::source::SourceSet;

pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(3600);
pub const DEFAULT_MONITOR_POOL: usize = 10;
pub const DEFAULT_DOMAIN_DEADLINE: Duration = Duration::from_secs(300);
pub const DEFAULT_ARTIFACT_ROOT: &str = "static/screenshots";
pub const DEFAULT_EXPORT_DIR: &str = "static";

pub const CRTSH_BASE_URL: &str = "https://crt.sh";
pub const CHAOS_BASE_URL: &str = "https://dns.projectdiscovery.io";
pub const SHODAN_BASE_URL: &str = "https://api.shodan.io";

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub sources: SourceSettings,
    pub probe: ProbeSettings,
    pub monitor: MonitorConfig,
    pub artifacts: ArtifactSettings,
}

/// Credentials and endpoints of the passive sources.
///
/// Keys are never compiled in; they come from flags or the environment.
#[derive(Clone)]
pub struct SourceSettings {
    pub chaos_key: Option<String>,
    pub shodan_key: Option<String>,
    pub crtsh_url: String,
    pub chaos_url: String,
    pub shodan_url: String,
    /// Upper bound for a single source request.
    pub timeout: Duration,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            chaos_key: None,
            shodan_key: None,
            crtsh_url: CRTSH_BASE_URL.to_string(),
            chaos_url: CHAOS_BASE_URL.to_string(),
            shodan_url: SHODAN_BASE_URL.to_string(),
            timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }
}

impl fmt::Debug for SourceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSettings")
            .field("chaos_key", &redact(&self.chaos_key))
            .field("shodan_key", &redact(&self.shodan_key))
            .field("crtsh_url", &self.crtsh_url)
            .field("chaos_url", &self.chaos_url)
            .field("shodan_url", &self.shodan_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn redact(key: &Option<String>) -> &'static str {
    match key {
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub timeout: Duration,
    /// Concurrent probes for interactive scans. `None` means one task per host.
    pub interactive_pool: Option<usize>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PROBE_TIMEOUT,
            interactive_pool: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Pause between two scheduler cycles.
    pub interval: Duration,
    /// Concurrent liveness probes while re-scanning a domain.
    pub probe_pool: usize,
    /// Soft limit for one domain within a cycle.
    pub domain_deadline: Duration,
    /// Sources a new monitor entry starts with.
    pub sources: SourceSet,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_MONITOR_INTERVAL,
            probe_pool: DEFAULT_MONITOR_POOL,
            domain_deadline: DEFAULT_DOMAIN_DEADLINE,
            sources: SourceSet::all(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtifactSettings {
    /// Root of the per-domain screenshot directories.
    pub root: PathBuf,
    /// Number of browser handles kept for screenshots.
    pub snapshot_handles: usize,
    /// Where `{domain}_subdomains.csv` files are written.
    pub export_dir: PathBuf,
}

impl Default for ArtifactSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ARTIFACT_ROOT),
            snapshot_handles: 2,
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
        }
    }
}
