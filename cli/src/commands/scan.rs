use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use colored::*;
use phantom_common::{
    config::{Config, ScanConfig},
    network::ports::PortList,
};
use phantom_core::network::resolve_target;
use phantom_core::scanner::{self, PortResult, PortScanner, PortStatus, ScanType};

use crate::commands::ScanArgs;
use crate::terminal::{colors, format, print, spinner::Spinner};

pub async fn scan(args: ScanArgs, cfg: &Config) -> anyhow::Result<()> {
    let host: IpAddr = resolve_target(&args.target).await?;
    let ports: PortList = args.ports.clone().unwrap_or_default();
    let scan_type: ScanType = scan_type(&args);
    let scanner: PortScanner = PortScanner::new(scan_config(&args));

    if cfg.quiet == 0 {
        print::fields(&[
            ("target", format!("{} ({})", args.target, host).color(colors::IPV4_ADDR)),
            ("ports", ports.len().to_string().normal()),
            ("mode", scan_type.to_string().color(colors::ACCENT)),
        ]);
    }

    let spinner: Spinner = Spinner::start(format!("Scanning {} ports on {}", ports.len(), host));
    let start_time: Instant = Instant::now();
    let results: Vec<PortResult> = scanner.scan_ports(host, ports.as_slice(), scan_type).await?;
    drop(spinner);

    scan_ends(host, &results, start_time.elapsed(), cfg);
    Ok(())
}

fn scan_type(args: &ScanArgs) -> ScanType {
    match (args.udp, args.syn) {
        (true, _) => ScanType::Udp,
        (_, true) => ScanType::Syn,
        _ => ScanType::TcpConnect,
    }
}

fn scan_config(args: &ScanArgs) -> ScanConfig {
    ScanConfig {
        timeout: Duration::from_millis(args.timeout_ms),
        concurrency: args.concurrency,
        rate_limit: Duration::from_millis(args.rate_ms),
        banner_grab: args.banner,
        ..ScanConfig::default()
    }
}

/// Closed ports are left out of the listing.
fn reportable(results: &[PortResult]) -> Vec<&PortResult> {
    results
        .iter()
        .filter(|result| result.status != PortStatus::Closed)
        .collect()
}

const PORT_TABLE_HEADERS: [&str; 5] = ["PORT", "STATE", "SERVICE", "TIME", "BANNER"];

fn scan_ends(host: IpAddr, results: &[PortResult], total_time: Duration, cfg: &Config) {
    let shown: Vec<&PortResult> = reportable(results);
    if shown.is_empty() {
        print::nothing_found(&format!("no ports answered on {host}"), cfg);
        return;
    }

    print::section("port scan", cfg);
    match cfg.quiet {
        2 => {
            for result in &shown {
                print::compact(&format!("{}/{}", result.port, format::port_status(result.status)));
            }
        }
        _ => {
            let rows: Vec<Vec<ColoredString>> = shown.iter().map(|result| format::port_row(result)).collect();
            print::table(&PORT_TABLE_HEADERS, &rows);
        }
    }

    if cfg.quiet == 0 {
        print_services(results);
    }

    let open: ColoredString = format!("{} open", scanner::open_ports(results).len()).bold().green();
    let host: ColoredString = host.to_string().color(colors::IPV4_ADDR);
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    print::summary(
        &format!("Scan complete: {open} of {} ports on {host} in {total_time}", results.len()),
        cfg,
    );
}

fn print_services(results: &[PortResult]) {
    let services: BTreeMap<String, Vec<u16>> = scanner::service_summary(results);
    if services.is_empty() {
        return;
    }

    print::blank();
    let rows: Vec<(&str, ColoredString)> = services
        .iter()
        .map(|(service, ports)| {
            let ports: Vec<String> = ports.iter().map(u16::to_string).collect();
            (service.as_str(), ports.join(", ").color(colors::ACCENT))
        })
        .collect();
    print::fields(&rows);
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
