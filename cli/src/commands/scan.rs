use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::*;
use forge_common::config::Config;
use forge_common::record::ScanRecord;
use forge_core::{ReconService, ScanOptions};
use tracing::{Instrument, info_span};

use crate::commands::ScanArgs;
use crate::terminal::{colors, print, spinner};

pub async fn scan(args: ScanArgs, cfg: Config) -> anyhow::Result<()> {
    let service = ReconService::with_http(cfg)?;
    let options = ScanOptions {
        sources: args.sources.selected(),
        capture_screenshots: args.screenshots,
        export_csv: args.csv,
    };

    let span = info_span!("scan", indicatif.pb_show = true);
    spinner::report(&span, &format!("enumerating {}", args.domain.bold()));

    let start_time: Instant = Instant::now();
    let record: Arc<ScanRecord> = service.scan(&args.domain, &options).instrument(span).await?;

    scan_ends(&record, start_time.elapsed());
    if options.export_csv {
        print::print_status(format!("CSV written to {}", service.csv_path(&record.domain).display()));
    }
    print::end_of_program();
    Ok(())
}

fn scan_ends(record: &ScanRecord, total_time: Duration) {
    if record.num_subdomains == 0 {
        print::header("zero subdomains found");
        print::no_results();
        return;
    }

    print::header(&format!("subdomains of {}", record.domain));
    print::set_key_width(record.subdomain_statuses.keys().map(String::as_str));

    for (subdomain, status) in &record.subdomain_statuses {
        let value: ColoredString = match status {
            Some(code) => code.to_string().color(colors::for_status(*status)),
            None => "unreachable".color(colors::UNREACHABLE),
        };
        print::aligned_line(subdomain, value);
    }

    if let Some(shots) = &record.screenshots {
        print::blank();
        print::print_status(format!("{} screenshots captured", shots.len()));
    }

    print_summary(record, total_time);
}

fn print_summary(record: &ScanRecord, total_time: Duration) {
    let live: ColoredString = format!("{} live", record.live_count()).bold().green();
    let total: ColoredString = format!("{} subdomains", record.num_subdomains).bold();
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output: String = format!("Scan #{} Complete: {live} of {total} in {total_time}", record.id);

    print::fat_separator();
    print::centerln(&output);
}
