//! Transport-layer packet construction.
//!
//! A [`PacketConfig`] is validated once by [`PacketConfigBuilder::build`];
//! the builders in [`tcp`], [`udp`] and [`icmp`] trust it afterwards. Every
//! builder has a `_with_rng` variant so random fields (source port, sequence
//! number, ICMP identifier) can come from a caller-supplied generator.

pub mod icmp;
pub mod tcp;
pub mod udp;

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use rand::Rng;

use crate::error::{ProtocolError, Result};

pub use icmp::{build_icmp, build_icmp_echo, build_icmp_echo_with_rng};
pub use tcp::{build_tcp, build_tcp_with_rng};
pub use udp::{build_udp, build_udp_with_rng};

pub const DEFAULT_TTL: u8 = 64;
pub const DEFAULT_DEST_PORT: u16 = 80;
pub const IPV4_PSEUDO_HDR_LEN: usize = 12;

const EPHEMERAL_PORT_MIN: u16 = 1024;
/// Largest payload that still fits a 16-bit length field behind a TCP header.
const MAX_PAYLOAD_LEN: usize = u16::MAX as usize - tcp::TCP_HDR_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
}

impl Protocol {
    /// IANA protocol number, as carried in the IPv4 header and pseudo-header.
    pub const fn number(self) -> u8 {
        match self {
            Protocol::Tcp => 6,
            Protocol::Udp => 17,
            Protocol::Icmp => 1,
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "icmp" => Ok(Protocol::Icmp),
            _ => Err(format!("unsupported protocol: {s}")),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Icmp => "icmp",
        };
        f.write_str(name)
    }
}

/// Validated packet parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketConfig {
    source_ip: Option<Ipv4Addr>,
    dest_ip: Ipv4Addr,
    source_port: Option<u16>,
    dest_port: u16,
    protocol: Protocol,
    ttl: u8,
    flags: u16,
    payload: Vec<u8>,
}

impl PacketConfig {
    pub fn builder() -> PacketConfigBuilder {
        PacketConfigBuilder::default()
    }

    pub fn source_ip(&self) -> Option<Ipv4Addr> {
        self.source_ip
    }

    pub fn dest_ip(&self) -> Ipv4Addr {
        self.dest_ip
    }

    pub fn source_port(&self) -> Option<u16> {
        self.source_port
    }

    pub fn dest_port(&self) -> u16 {
        self.dest_port
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn ttl(&self) -> u8 {
        self.ttl
    }

    pub fn flags(&self) -> u16 {
        self.flags
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns a copy with a concrete source address, as needed by [`build_tcp`].
    pub fn with_source_ip(mut self, source_ip: Ipv4Addr) -> Self {
        self.source_ip = Some(source_ip);
        self
    }
}

/// Collects raw, unchecked parameters for a [`PacketConfig`].
///
/// Addresses are taken as text and ports as `u32` so that every invalid input
/// is representable and rejected in one place.
#[derive(Debug, Clone, Default)]
pub struct PacketConfigBuilder {
    source_ip: Option<String>,
    dest_ip: Option<String>,
    source_port: Option<u32>,
    dest_port: Option<u32>,
    protocol: Option<Protocol>,
    ttl: Option<u8>,
    flags: u16,
    payload: Vec<u8>,
}

impl PacketConfigBuilder {
    pub fn source_ip(mut self, ip: impl Into<String>) -> Self {
        self.source_ip = Some(ip.into());
        self
    }

    pub fn dest_ip(mut self, ip: impl Into<String>) -> Self {
        self.dest_ip = Some(ip.into());
        self
    }

    pub fn source_port(mut self, port: u32) -> Self {
        self.source_port = Some(port);
        self
    }

    pub fn dest_port(mut self, port: u32) -> Self {
        self.dest_port = Some(port);
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    pub fn ttl(mut self, ttl: u8) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    pub fn build(self) -> Result<PacketConfig> {
        let dest_ip: Ipv4Addr = match self.dest_ip.as_deref().map(str::trim) {
            None | Some("") => return Err(ProtocolError::config("destination IP is required")),
            Some(ip) => parse_ipv4(ip, "destination")?,
        };
        let source_ip: Option<Ipv4Addr> = self
            .source_ip
            .as_deref()
            .map(|ip| parse_ipv4(ip.trim(), "source"))
            .transpose()?;

        let dest_port: u16 = validate_port(self.dest_port.unwrap_or(DEFAULT_DEST_PORT as u32), "destination")?;
        let source_port: Option<u16> = self
            .source_port
            .map(|port| validate_port(port, "source"))
            .transpose()?;

        if self.flags & !tcp::FLAG_MASK != 0 {
            return Err(ProtocolError::config(format!(
                "TCP flags {:#x} do not fit in 9 bits",
                self.flags
            )));
        }

        if self.payload.len() > MAX_PAYLOAD_LEN {
            return Err(ProtocolError::config(format!(
                "payload of {} bytes exceeds the {MAX_PAYLOAD_LEN} byte limit",
                self.payload.len()
            )));
        }

        Ok(PacketConfig {
            source_ip,
            dest_ip,
            source_port,
            dest_port,
            protocol: self.protocol.unwrap_or(Protocol::Tcp),
            ttl: self.ttl.unwrap_or(DEFAULT_TTL),
            flags: self.flags,
            payload: self.payload,
        })
    }
}

fn parse_ipv4(ip: &str, role: &str) -> Result<Ipv4Addr> {
    ip.parse::<Ipv4Addr>()
        .map_err(|_| ProtocolError::config(format!("{role} IP '{ip}' is not an IPv4 address")))
}

fn validate_port(port: u32, role: &str) -> Result<u16> {
    match u16::try_from(port) {
        Ok(valid) if valid >= 1 => Ok(valid),
        _ => Err(ProtocolError::config(format!(
            "{role} port must be between 1 and 65535, got {port}"
        ))),
    }
}

/// Builds the packet matching `config.protocol()` with default options.
pub fn build_packet(config: &PacketConfig) -> Result<Vec<u8>> {
    match config.protocol() {
        Protocol::Tcp => build_tcp(config, None),
        Protocol::Udp => build_udp(config),
        Protocol::Icmp => build_icmp_echo(config, None, None),
    }
}

pub(crate) fn source_port_or_random<R: Rng>(config: &PacketConfig, rng: &mut R) -> u16 {
    config
        .source_port()
        .unwrap_or_else(|| rng.random_range(EPHEMERAL_PORT_MIN..=u16::MAX))
}

/// `src || dst || 0 || protocol || length`, prepended to TCP/UDP checksums.
pub(crate) fn ipv4_pseudo_header(
    source: Ipv4Addr,
    destination: Ipv4Addr,
    protocol: Protocol,
    length: u16,
) -> [u8; IPV4_PSEUDO_HDR_LEN] {
    let mut pseudo: [u8; IPV4_PSEUDO_HDR_LEN] = [0u8; IPV4_PSEUDO_HDR_LEN];
    pseudo[0..4].copy_from_slice(&source.octets());
    pseudo[4..8].copy_from_slice(&destination.octets());
    pseudo[9] = protocol.number();
    pseudo[10..12].copy_from_slice(&length.to_be_bytes());
    pseudo
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
