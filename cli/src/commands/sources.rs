use colored::*;
use forge_common::config::Config;
use forge_common::source::SourceKind;

use crate::terminal::{colors, print};

pub fn sources(cfg: &Config) -> anyhow::Result<()> {
    print::set_key_width(SourceKind::ALL.iter().map(|kind| kind.short_name()));

    for kind in SourceKind::ALL {
        let key: Option<&String> = match kind {
            SourceKind::CertTransparency => None,
            SourceKind::PassiveDns => cfg.sources.chaos_key.as_ref(),
            SourceKind::SearchApi => cfg.sources.shodan_key.as_ref(),
        };

        let state: ColoredString = if !kind.needs_key() {
            "ready (no key needed)".color(colors::STATUS_OK)
        } else if key.is_some() {
            "ready".color(colors::STATUS_OK)
        } else {
            "disabled, no API key".color(colors::STATUS_CLIENT_ERR)
        };
        print::aligned_line(kind.short_name(), state);
    }

    print::end_of_program();
    Ok(())
}
