use std::net::Ipv4Addr;

use colored::*;
use phantom_common::config::Config;
use phantom_core::craft;
use phantom_protocols::packet::{
    PacketConfig, PacketConfigBuilder, Protocol,
    tcp::{FLAG_ACK, FLAG_FIN, FLAG_MASK, FLAG_NS, FLAG_PSH, FLAG_RST, FLAG_SYN, FLAG_URG},
};

use crate::commands::CraftArgs;
use crate::terminal::{colors, format, print};

const FLAG_NAMES: [(&str, u16); 7] = [
    ("fin", FLAG_FIN),
    ("syn", FLAG_SYN),
    ("rst", FLAG_RST),
    ("psh", FLAG_PSH),
    ("ack", FLAG_ACK),
    ("urg", FLAG_URG),
    ("ns", FLAG_NS),
];

pub async fn craft(args: CraftArgs, cfg: &Config) -> anyhow::Result<()> {
    let packet_cfg: PacketConfig = craft::with_routed_source(&packet_config(&args).build()?);

    let packet: Vec<u8> = if args.send {
        if !is_root::is_root() {
            anyhow::bail!("'craft --send' needs raw sockets; run it as root");
        }
        let send_cfg: PacketConfig = packet_cfg.clone();
        tokio::task::spawn_blocking(move || craft::craft_and_send(&send_cfg)).await??
    } else {
        craft::craft(&packet_cfg)?
    };

    print_packet(&packet_cfg, &packet, args.send, cfg);
    Ok(())
}

fn packet_config(args: &CraftArgs) -> PacketConfigBuilder {
    let mut builder: PacketConfigBuilder = PacketConfig::builder()
        .dest_ip(args.dest_ip.to_string())
        .dest_port(args.dest_port)
        .protocol(args.protocol)
        .ttl(args.ttl)
        .flags(args.flags);

    if let Some(source_ip) = args.source_ip {
        builder = builder.source_ip(source_ip.to_string());
    }
    if let Some(source_port) = args.source_port {
        builder = builder.source_port(source_port);
    }
    if let Some(payload) = &args.payload {
        builder = builder.payload(payload.as_bytes());
    }
    builder
}

/// Accepts a number ("18", "0x12") or comma separated flag names ("syn,ack").
pub fn parse_tcp_flags(s: &str) -> Result<u16, String> {
    let s: &str = s.trim();
    let numeric: Option<Result<u16, std::num::ParseIntError>> = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => Some(u16::from_str_radix(hex, 16)),
        None if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() => Some(s.parse::<u16>()),
        None => None,
    };

    let flags: u16 = match numeric {
        Some(parsed) => parsed.map_err(|e| format!("invalid flag value '{s}': {e}"))?,
        None => s
            .split([',', '|', '+'])
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .try_fold(0u16, |acc, name| {
                FLAG_NAMES
                    .iter()
                    .find(|(flag, _)| flag.eq_ignore_ascii_case(name))
                    .map(|(_, bit)| acc | bit)
                    .ok_or_else(|| format!("unknown TCP flag '{name}'"))
            })?,
    };

    if flags & !FLAG_MASK != 0 {
        return Err(format!("TCP flags fit in 9 bits, got {flags:#x}"));
    }
    Ok(flags)
}

fn flag_names(flags: u16) -> String {
    let names: Vec<String> = FLAG_NAMES
        .iter()
        .filter(|(_, bit)| flags & bit != 0)
        .map(|(name, _)| name.to_uppercase())
        .collect();
    if names.is_empty() { String::from("none") } else { names.join(",") }
}

fn print_packet(config: &PacketConfig, packet: &[u8], sent: bool, cfg: &Config) {
    print::section("crafted packet", cfg);
    if cfg.quiet < 2 {
        print::fields(&packet_fields(config, packet.len()));
        print::blank();
    }
    print::hexdump(&format::hexdump(packet));

    let verb: &str = if sent { "Sent" } else { "Built" };
    print::summary(
        &format!(
            "{verb} {} byte {} packet for {}",
            packet.len().to_string().bold().green(),
            config.protocol(),
            config.dest_ip().to_string().color(colors::IPV4_ADDR)
        ),
        cfg,
    );
}

/// Header fields of the packet as built, including a routed source address.
fn packet_fields(config: &PacketConfig, len: usize) -> Vec<(&'static str, ColoredString)> {
    let source: String = config
        .source_ip()
        .map_or_else(|| String::from("kernel"), |ip: Ipv4Addr| ip.to_string());
    let mut rows: Vec<(&'static str, ColoredString)> = vec![
        ("protocol", config.protocol().to_string().to_uppercase().normal()),
        ("source", source.color(colors::IPV4_ADDR)),
        (
            "dest",
            format!("{}:{}", config.dest_ip(), config.dest_port()).color(colors::IPV4_ADDR),
        ),
        ("ttl", config.ttl().to_string().normal()),
    ];
    if config.protocol() == Protocol::Tcp {
        rows.push(("flags", flag_names(config.flags()).color(colors::ACCENT)));
    }
    rows.push(("length", format!("{len} bytes").normal()));
    rows
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
