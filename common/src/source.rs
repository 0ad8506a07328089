//! Passive reconnaissance sources a scan can draw from.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One family of third-party subdomain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Certificate transparency logs (crt.sh).
    CertTransparency,
    /// Passive DNS dataset (ProjectDiscovery Chaos).
    PassiveDns,
    /// Search engine DNS API (Shodan).
    SearchApi,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [Self::CertTransparency, Self::PassiveDns, Self::SearchApi];

    /// Short name used on the command line.
    pub fn short_name(self) -> &'static str {
        match self {
            Self::CertTransparency => "crtsh",
            Self::PassiveDns => "chaos",
            Self::SearchApi => "shodan",
        }
    }

    /// Whether the provider refuses requests without an API key.
    pub fn needs_key(self) -> bool {
        !matches!(self, Self::CertTransparency)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crtsh" | "crt.sh" | "ct" | "cert-transparency" => Ok(Self::CertTransparency),
            "chaos" | "passive-dns" | "pdns" => Ok(Self::PassiveDns),
            "shodan" | "search-api" => Ok(Self::SearchApi),
            other => Err(format!("unknown source: {other}")),
        }
    }
}

/// The set of sources enabled for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSet(BTreeSet<SourceKind>);

impl SourceSet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        SourceKind::ALL.into_iter().collect()
    }

    pub fn with(mut self, kind: SourceKind) -> Self {
        self.0.insert(kind);
        self
    }

    pub fn contains(&self, kind: SourceKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = SourceKind> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<SourceKind> for SourceSet {
    fn from_iter<I: IntoIterator<Item = SourceKind>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for SourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(SourceKind::short_name).collect();
        f.write_str(&names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_names() {
        assert_eq!("crtsh".parse::<SourceKind>(), Ok(SourceKind::CertTransparency));
        assert_eq!("Chaos".parse::<SourceKind>(), Ok(SourceKind::PassiveDns));
        assert_eq!("search-api".parse::<SourceKind>(), Ok(SourceKind::SearchApi));
        assert!("bing".parse::<SourceKind>().is_err());
    }

    #[test]
    fn all_contains_every_kind_once() {
        let set = SourceSet::all();
        assert_eq!(set.len(), 3);
        assert_eq!(set.to_string(), "crtsh,chaos,shodan");
    }

    #[test]
    fn none_is_empty() {
        assert!(SourceSet::none().is_empty());
        assert!(SourceSet::none().with(SourceKind::SearchApi).contains(SourceKind::SearchApi));
    }
}
