//! # Scan Target Model
//!
//! A [`Domain`] is the only accepted input for a scan or a monitor entry.
//!
//! It is validated once, on construction, against the pattern
//! `one or more "label." segments followed by an alphabetic TLD of at least
//! two letters`. Everything downstream (sources, store, scheduler) can rely on
//! holding a well formed name and never re-validates.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ForgeError;

static DOMAIN_PATTERN: OnceLock<Regex> = OnceLock::new();

fn domain_pattern() -> &'static Regex {
    DOMAIN_PATTERN.get_or_init(|| {
        Regex::new(r"^(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}$").expect("domain pattern is valid")
    })
}

/// A validated domain name such as `example.com`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Domain(String);

impl Domain {
    /// Validates `input` exactly as given and wraps it. The case is kept.
    pub fn parse(input: &str) -> Result<Self, ForgeError> {
        if is_valid(input) {
            Ok(Self(input.to_string()))
        } else {
            Err(ForgeError::InvalidDomain(input.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the full host name `<label>.<domain>` for a discovered label.
    pub fn subdomain(&self, label: &str) -> String {
        format!("{label}.{}", self.0)
    }

    /// Returns true when `host` is a strict subdomain of this domain.
    /// DNS names compare ASCII case-insensitively.
    pub fn owns(&self, host: &str) -> bool {
        let Some(split) = host.len().checked_sub(self.0.len() + 1) else {
            return false;
        };
        split > 0
            && host.as_bytes()[split] == b'.'
            && host.is_char_boundary(split + 1)
            && host[split + 1..].eq_ignore_ascii_case(&self.0)
    }

    /// Strips the `.<domain>` suffix from `host`, yielding its label part.
    pub fn label_of<'a>(&self, host: &'a str) -> Option<&'a str> {
        if !self.owns(host) {
            return None;
        }
        Some(&host[..host.len() - self.0.len() - 1])
    }
}

/// Checks a raw string against the domain pattern without allocating.
pub fn is_valid(input: &str) -> bool {
    domain_pattern().is_match(input)
}

impl FromStr for Domain {
    type Err = ForgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Domain {
    type Error = ForgeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
