use colored::*;
use forge_common::config::Config;
use forge_common::monitor::MonitorView;
use forge_core::{CycleReport, MonitorOptions, ReconService};
use tracing::info;

use crate::commands::MonitorArgs;
use crate::terminal::{colors, print};

pub async fn monitor(args: MonitorArgs, cfg: Config) -> anyhow::Result<()> {
    let monitor_cfg = cfg.monitor.clone();
    let service = ReconService::with_http(cfg)?;

    for domain in &args.domains {
        service.add_monitor_with(
            domain,
            MonitorOptions {
                sources: Some(args.sources.selected()),
                capture_screenshots: Some(args.screenshots),
            },
        )?;
    }

    let scheduler = service.scheduler(monitor_cfg.clone());

    match args.cycles {
        Some(cycles) => {
            for cycle in 1..=cycles {
                print::header(&format!("cycle {cycle} of {cycles}"));
                let report: CycleReport = scheduler.run_cycle().await;
                print_report(&report);
                if cycle < cycles {
                    tokio::time::sleep(monitor_cfg.interval).await;
                }
            }
        }
        None => {
            let handle = scheduler.spawn();
            info!("monitoring {} domains, press Ctrl-C to stop", args.domains.len());
            tokio::signal::ctrl_c().await?;
            handle.shutdown().await;
        }
    }

    print_monitors(&service.monitors());
    print::end_of_program();
    Ok(())
}

fn print_report(report: &CycleReport) {
    for (domain, found) in report
        .outcomes
        .keys()
        .filter_map(|domain| Some((domain, report.new_subdomains(domain)?)))
    {
        print::print_status(format!("{} new under {}", found.len().to_string().green().bold(), domain));
    }
    print::print_status(report.to_string());
}

fn print_monitors(monitors: &[MonitorView]) {
    print::header("monitored domains");

    for (idx, view) in monitors.iter().enumerate() {
        print::tree_head(idx, view.domain.as_str());

        let mut details: Vec<(String, ColoredString)> = vec![
            ("State".to_string(), view.state.to_string().color(colors::ACCENT)),
            ("Sources".to_string(), view.sources.to_string().normal()),
        ];
        if view.new_subdomains.is_empty() {
            details.push(("New".to_string(), "none yet".color(colors::SEPARATOR)));
        }
        for subdomain in &view.new_subdomains {
            details.push(("New".to_string(), subdomain.color(colors::PRIMARY)));
        }
        print::as_tree_one_level(details);

        if idx + 1 != monitors.len() {
            print::blank();
        }
    }
}
