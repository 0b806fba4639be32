use std::time::Duration;

use colored::*;
use phantom_common::config::{Config, PingConfig};
use phantom_core::ping::{self, PingReport};

use crate::commands::PingArgs;
use crate::terminal::{colors, format, print, spinner::Spinner};

pub async fn ping(args: PingArgs, cfg: &Config) -> anyhow::Result<()> {
    if !is_root::is_root() {
        anyhow::bail!("'ping' needs raw sockets; run it as root");
    }

    let ping_cfg: PingConfig = ping_config(&args);
    let spinner: Spinner = Spinner::start(format!("Pinging {} ({} requests)", args.target, ping_cfg.count));
    let report: PingReport = ping::ping(args.target, &ping_cfg).await?;
    drop(spinner);

    ping_ends(&report, cfg);
    Ok(())
}

fn ping_config(args: &PingArgs) -> PingConfig {
    PingConfig {
        count: args.count,
        timeout: Duration::from_millis(args.timeout_ms),
        interval: Duration::from_millis(args.interval_ms),
    }
}

fn ping_ends(report: &PingReport, cfg: &Config) {
    if report.received == 0 {
        print::nothing_found(&format!("{} did not answer", report.target), cfg);
        return;
    }

    print::section("ping statistics", cfg);
    if cfg.quiet < 2 {
        print::fields(&time_rows(report));
    }

    let received: ColoredString = format!("{}/{} replies", report.received, report.sent).bold().green();
    let target: ColoredString = report.target.to_string().color(colors::IPV4_ADDR);
    let loss: ColoredString = format!("{:.1}% loss", report.loss_percent()).bold().yellow();
    print::summary(&format!("Ping complete: {received} from {target}, {loss}"), cfg);
}

fn time_rows(report: &PingReport) -> Vec<(&'static str, ColoredString)> {
    [
        ("min", report.min_time()),
        ("avg", report.avg_time()),
        ("max", report.max_time()),
    ]
    .into_iter()
    .filter_map(|(key, time)| time.map(|time| (key, format::millis(time).normal())))
    .collect()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
