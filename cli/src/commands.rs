pub mod craft;
pub mod dns;
pub mod ping;
pub mod scan;

use std::net::{IpAddr, Ipv4Addr};

use clap::{Args, Parser, Subcommand};
use phantom_common::network::{ports::PortList, target::Target};
use phantom_protocols::dns::DnsRecordType;
use phantom_protocols::packet::Protocol;

#[derive(Parser)]
#[command(name = "phantom")]
#[command(about = "DNS lookups, port scans and hand-built packets.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// Print less; repeat to print only results
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Print more; repeat for packet level detail
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Skip the start-up banner
    #[arg(long, global = true)]
    pub no_banner: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Query DNS records of a domain
    #[command(alias = "d")]
    Dns(DnsArgs),
    /// Scan ports of a host
    #[command(alias = "s")]
    Scan(ScanArgs),
    /// Send ICMP echo requests (requires root)
    #[command(alias = "p")]
    Ping(PingArgs),
    /// Build a TCP, UDP or ICMP packet and optionally send it
    #[command(alias = "c")]
    Craft(CraftArgs),
}

#[derive(Args)]
pub struct DnsArgs {
    pub domain: String,

    /// Record type to ask for
    #[arg(short = 't', long = "type", default_value = "A")]
    pub record_type: DnsRecordType,

    /// Query every common record type
    #[arg(long, conflicts_with_all = ["record_type", "axfr"])]
    pub enumerate: bool,

    /// Request a zone transfer over TCP
    #[arg(long)]
    pub axfr: bool,

    /// Name server to ask
    #[arg(long)]
    pub server: Option<IpAddr>,

    #[arg(long, default_value_t = 53)]
    pub port: u16,

    /// Per-attempt timeout
    #[arg(long, default_value_t = 5000)]
    pub timeout_ms: u64,

    /// Attempts before giving up
    #[arg(long, default_value_t = 3)]
    pub retries: u32,
}

#[derive(Args)]
pub struct ScanArgs {
    pub target: Target,

    /// Ports to probe, e.g. "22,80,8000-8100"
    #[arg(short, long)]
    pub ports: Option<PortList>,

    #[arg(long, conflicts_with = "syn")]
    pub udp: bool,

    /// Half-open scan (requires root, falls back to connect otherwise)
    #[arg(long)]
    pub syn: bool,

    /// Read a banner from open TCP ports
    #[arg(long)]
    pub banner: bool,

    #[arg(long, default_value_t = 10)]
    pub concurrency: usize,

    /// Per-port timeout
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,

    /// Minimum delay between probes
    #[arg(long, default_value_t = 100)]
    pub rate_ms: u64,
}

#[derive(Args)]
pub struct PingArgs {
    pub target: Ipv4Addr,

    #[arg(short, long, default_value_t = 4)]
    pub count: u16,

    /// Wait for each reply
    #[arg(long, default_value_t = 1000)]
    pub timeout_ms: u64,

    #[arg(long, default_value_t = 1000)]
    pub interval_ms: u64,
}

#[derive(Args)]
pub struct CraftArgs {
    pub protocol: Protocol,

    pub dest_ip: Ipv4Addr,

    #[arg(long, default_value_t = 80)]
    pub dest_port: u32,

    #[arg(long)]
    pub source_ip: Option<Ipv4Addr>,

    /// Random when omitted
    #[arg(long)]
    pub source_port: Option<u32>,

    /// TCP flags: a number ("18", "0x12") or names ("syn,ack")
    #[arg(long, default_value = "syn", value_parser = craft::parse_tcp_flags)]
    pub flags: u16,

    #[arg(long, default_value_t = 64)]
    pub ttl: u8,

    #[arg(long)]
    pub payload: Option<String>,

    /// Put the packet on the wire (requires root)
    #[arg(long)]
    pub send: bool,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
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
