pub mod monitor;
pub mod scan;
pub mod sources;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use forge_common::config::Config;
use forge_common::source::{SourceKind, SourceSet};

#[derive(Parser)]
#[command(name = "forge")]
#[command(about = "Passive subdomain recon, liveness probing and monitoring.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Chaos (passive DNS) API key
    #[arg(long, global = true, env = "CHAOS_API_KEY", hide_env_values = true)]
    pub chaos_key: Option<String>,

    /// Shodan API key
    #[arg(long, global = true, env = "SHODAN_API_KEY", hide_env_values = true)]
    pub shodan_key: Option<String>,

    /// Seconds before a source request is abandoned
    #[arg(long, global = true, default_value_t = 15)]
    pub source_timeout: u64,

    /// Seconds before a liveness probe counts as unreachable
    #[arg(long, global = true, default_value_t = 5)]
    pub probe_timeout: u64,

    /// Root directory for screenshots
    #[arg(long, global = true, env = "FORGE_ARTIFACT_DIR", default_value = "static/screenshots")]
    pub artifact_dir: PathBuf,

    /// Directory for CSV exports
    #[arg(long, global = true, default_value = "static")]
    pub export_dir: PathBuf,

    /// Concurrent browser handles for screenshots
    #[arg(long, global = true, default_value_t = 2)]
    pub browsers: usize,

    /// More log output (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enumerate and probe the subdomains of a domain
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// Re-scan domains periodically and report new subdomains
    #[command(alias = "m")]
    Monitor(MonitorArgs),
    /// Show the passive sources and whether they are usable
    Sources,
}

#[derive(Args)]
pub struct SourceArgs {
    /// Comma separated sources (crtsh, chaos, shodan); all by default
    #[arg(long, value_delimiter = ',')]
    pub sources: Vec<SourceKind>,
}

impl SourceArgs {
    pub fn selected(&self) -> SourceSet {
        if self.sources.is_empty() {
            SourceSet::all()
        } else {
            self.sources.iter().copied().collect()
        }
    }
}

#[derive(Args)]
pub struct ScanArgs {
    #[arg(value_parser = trimmed)]
    pub domain: String,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Capture a thumbnail of every subdomain
    #[arg(long)]
    pub screenshots: bool,

    /// Write `<domain>_subdomains.csv` to the export directory
    #[arg(long)]
    pub csv: bool,

    /// Limit concurrent probes; one per subdomain when unset
    #[arg(long)]
    pub pool: Option<usize>,
}

#[derive(Args)]
pub struct MonitorArgs {
    #[arg(required = true, value_parser = trimmed)]
    pub domains: Vec<String>,

    #[command(flatten)]
    pub sources: SourceArgs,

    /// Seconds between two cycles
    #[arg(long, default_value_t = 3600)]
    pub interval: u64,

    /// Concurrent probes per domain
    #[arg(long, default_value_t = 10)]
    pub pool: usize,

    /// Seconds one domain may take within a cycle
    #[arg(long, default_value_t = 300)]
    pub deadline: u64,

    /// Capture thumbnails of new subdomains
    #[arg(long)]
    pub screenshots: bool,

    /// Stop after this many cycles instead of running until Ctrl-C
    #[arg(long)]
    pub cycles: Option<u32>,
}

/// Strips surrounding whitespace before the domain reaches validation.
fn trimmed(raw: &str) -> Result<String, String> {
    Ok(raw.trim().to_string())
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn config(&self) -> Config {
        let mut cfg = Config::default();

        cfg.sources.chaos_key = self.chaos_key.clone().filter(|k| !k.is_empty());
        cfg.sources.shodan_key = self.shodan_key.clone().filter(|k| !k.is_empty());
        cfg.sources.timeout = Duration::from_secs(self.source_timeout);
        cfg.probe.timeout = Duration::from_secs(self.probe_timeout);
        cfg.artifacts.root = self.artifact_dir.clone();
        cfg.artifacts.export_dir = self.export_dir.clone();
        cfg.artifacts.snapshot_handles = self.browsers;

        match &self.command {
            Commands::Scan(args) => {
                cfg.probe.interactive_pool = args.pool;
            }
            Commands::Monitor(args) => {
                cfg.monitor.interval = Duration::from_secs(args.interval);
                cfg.monitor.probe_pool = args.pool;
                cfg.monitor.domain_deadline = Duration::from_secs(args.deadline);
                cfg.monitor.sources = args.sources.selected();
            }
            Commands::Sources => {}
        }

        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_flags_map_onto_config() {
        let cli = CommandLine::try_parse_from([
            "forge", "scan", "example.com", "--sources", "chaos,crtsh", "--pool", "4", "--chaos-key", "k",
        ])
        .unwrap();

        let Commands::Scan(args) = &cli.command else {
            panic!("expected scan");
        };
        let selected = args.sources.selected();
        assert!(selected.contains(SourceKind::PassiveDns));
        assert!(!selected.contains(SourceKind::SearchApi));

        let cfg = cli.config();
        assert_eq!(cfg.probe.interactive_pool, Some(4));
        assert_eq!(cfg.sources.chaos_key.as_deref(), Some("k"));
    }

    #[test]
    fn domain_arguments_are_trimmed() {
        let cli = CommandLine::try_parse_from(["forge", "monitor", " example.com ", "other.org\n"]).unwrap();

        let Commands::Monitor(args) = &cli.command else {
            panic!("expected monitor");
        };
        assert_eq!(args.domains, vec!["example.com", "other.org"]);
    }

    #[test]
    fn monitor_requires_a_domain() {
        assert!(CommandLine::try_parse_from(["forge", "monitor"]).is_err());
    }

    #[test]
    fn unknown_source_is_rejected() {
        assert!(CommandLine::try_parse_from(["forge", "scan", "example.com", "--sources", "bing"]).is_err());
    }
}
