use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use colored::*;
use phantom_common::config::{Config, DnsConfig};
use phantom_core::resolver::DnsClient;
use phantom_protocols::dns::{DnsRecord, DnsRecordType};

use crate::commands::DnsArgs;
use crate::terminal::{colors, format, print, spinner::Spinner};

pub async fn dns(args: DnsArgs, cfg: &Config) -> anyhow::Result<()> {
    let dns_cfg: DnsConfig = dns_config(&args);
    let client: DnsClient = DnsClient::new(dns_cfg);
    let start_time: Instant = Instant::now();

    if args.enumerate {
        let spinner: Spinner = Spinner::start(format!("Enumerating {}", args.domain));
        let found: BTreeMap<DnsRecordType, Vec<DnsRecord>> = client.enumerate(&args.domain).await;
        drop(spinner);

        let records: Vec<DnsRecord> = found.into_values().flatten().collect();
        lookup_ends(&args.domain, &records, start_time.elapsed(), cfg);
        return Ok(());
    }

    if args.axfr {
        let spinner: Spinner = Spinner::start(format!("Requesting zone transfer of {}", args.domain));
        let records: Vec<DnsRecord> = client.zone_transfer(&args.domain, args.server).await;
        drop(spinner);

        lookup_ends(&args.domain, &records, start_time.elapsed(), cfg);
        return Ok(());
    }

    let spinner: Spinner = Spinner::start(format!("Querying {} {}", args.record_type, args.domain));
    let records: Vec<DnsRecord> = client.query(&args.domain, args.record_type).await;
    drop(spinner);

    lookup_ends(&args.domain, &records, start_time.elapsed(), cfg);
    Ok(())
}

fn dns_config(args: &DnsArgs) -> DnsConfig {
    let defaults: DnsConfig = DnsConfig::default();
    let server: IpAddr = args.server.unwrap_or(defaults.server);
    DnsConfig {
        server,
        port: args.port,
        timeout: Duration::from_millis(args.timeout_ms),
        retries: args.retries,
        ..defaults
    }
}

fn lookup_ends(domain: &str, records: &[DnsRecord], total_time: Duration, cfg: &Config) {
    if records.is_empty() {
        print::nothing_found(&format!("no records for {domain}"), cfg);
        return;
    }

    print::section("dns records", cfg);
    for (idx, record) in records.iter().enumerate() {
        match cfg.quiet {
            2 => print::compact(&format!("{} {}", record.record_type(), format::record_value(record))),
            _ => print::entry(idx, record.name(), &format::record_details(record)),
        }
    }

    let found: ColoredString = format!("{} records", records.len()).bold().green();
    let domain: ColoredString = domain.color(colors::DOMAIN);
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    print::summary(&format!("Lookup complete: {found} for {domain} in {total_time}"), cfg);
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
