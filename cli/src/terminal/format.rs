use std::net::IpAddr;
use std::time::Duration;

use crate::terminal::colors;
use colored::*;
use phantom_core::scanner::{PortResult, PortStatus};
use phantom_protocols::dns::{DnsRecord, DnsRecordType};

const HEXDUMP_WIDTH: usize = 16;
pub const HEX_COLUMN_WIDTH: usize = HEXDUMP_WIDTH * 3 - 1;

pub fn port_status(status: PortStatus) -> ColoredString {
    let text: String = status.to_string();
    match status {
        PortStatus::Open => text.color(colors::PORT_OPEN).bold(),
        PortStatus::Closed => text.color(colors::PORT_CLOSED),
        PortStatus::Filtered => text.color(colors::PORT_FILTERED),
        PortStatus::Error => text.color(colors::PORT_ERROR),
    }
}

pub fn millis(duration: Duration) -> String {
    format!("{:.2} ms", duration.as_secs_f64() * 1000.0)
}

/// Record data, prefixed with the preference for MX.
pub fn record_value(record: &DnsRecord) -> ColoredString {
    match record.record_type() {
        DnsRecordType::A | DnsRecordType::AAAA => match record.data().parse::<IpAddr>() {
            Ok(IpAddr::V4(ip)) => ip.to_string().color(colors::IPV4_ADDR),
            Ok(IpAddr::V6(ip)) => ip.to_string().color(colors::IPV6_ADDR),
            Err(_) => record.data().color(colors::RECORD_DATA),
        },
        DnsRecordType::CNAME | DnsRecordType::NS => record.data().color(colors::DOMAIN),
        DnsRecordType::MX => match record.priority() {
            Some(priority) => format!("{} {}", priority, record.data()).color(colors::DOMAIN),
            None => record.data().color(colors::DOMAIN),
        },
        _ => record.data().color(colors::RECORD_DATA),
    }
}

pub fn record_details(record: &DnsRecord) -> Vec<(&'static str, ColoredString)> {
    vec![
        ("type", record.record_type().mnemonic().color(colors::ACCENT)),
        ("ttl", format!("{}s", record.ttl()).normal()),
        ("data", record_value(record)),
    ]
}

/// Cells for the port table: port, state, service, time, banner.
pub fn port_row(result: &PortResult) -> Vec<ColoredString> {
    vec![
        result.port.to_string().color(colors::PRIMARY),
        port_status(result.status),
        result.service.as_deref().unwrap_or("-").color(colors::ACCENT),
        millis(result.response_time).normal(),
        result.banner.as_deref().unwrap_or("").color(colors::RECORD_DATA),
    ]
}

pub struct HexRow {
    pub offset: usize,
    pub hex: String,
    pub ascii: String,
}

/// Splits `bytes` into offset / hex / ascii rows of sixteen bytes.
pub fn hexdump(bytes: &[u8]) -> Vec<HexRow> {
    bytes
        .chunks(HEXDUMP_WIDTH)
        .enumerate()
        .map(|(row, chunk)| HexRow {
            offset: row * HEXDUMP_WIDTH,
            hex: chunk.iter().map(|b| format!("{:02x}", b)).collect::<Vec<String>>().join(" "),
            ascii: chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect(),
        })
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
