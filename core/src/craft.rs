//! One-off packet construction and transmission.

use std::net::{IpAddr, Ipv4Addr};

use phantom_protocols::packet::{PacketConfig, Protocol, build_packet};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::network::source::local_ipv4_for;
use crate::network::transport::RawChannel;

/// Builds the packet described by `config`.
///
/// TCP needs a source address for its checksum; when none is given the one
/// the kernel would route from is used.
pub fn craft(config: &PacketConfig) -> anyhow::Result<Vec<u8>> {
    let config: PacketConfig = with_routed_source(config);
    let packet: Vec<u8> = build_packet(&config)?;
    debug!("Crafted {} byte {} packet for {}", packet.len(), config.protocol(), config.dest_ip());
    Ok(packet)
}

/// Sends a crafted packet with `config.ttl()` over a raw channel.
pub fn send(config: &PacketConfig, packet: &[u8]) -> Result<usize, TransportError> {
    let mut channel: RawChannel = RawChannel::open(config.protocol())?;
    channel.set_ttl(config.ttl())?;
    channel.send(packet, IpAddr::V4(config.dest_ip()))
}

/// [`craft`] then [`send`]; returns the bytes that went out.
pub fn craft_and_send(config: &PacketConfig) -> anyhow::Result<Vec<u8>> {
    let packet: Vec<u8> = craft(config)?;
    let sent: usize = send(config, &packet)?;
    info!("Sent {sent} bytes to {}", config.dest_ip());
    Ok(packet)
}

/// The config [`craft`] actually builds from: TCP gains the routed source
/// address when none was given.
pub fn with_routed_source(config: &PacketConfig) -> PacketConfig {
    match (config.protocol(), config.source_ip()) {
        (Protocol::Tcp, None) => {
            let source: Ipv4Addr = local_ipv4_for(config.dest_ip());
            debug!("Using {source} as TCP source address");
            config.clone().with_source_ip(source)
        }
        _ => config.clone(),
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
