use pnet::packet::udp::MutableUdpPacket;
use rand::Rng;

use crate::error::{ProtocolError, Result};
use crate::packet::{PacketConfig, source_port_or_random};

pub const UDP_HDR_LEN: usize = 8;

/// Builds a UDP datagram. The checksum is left at zero, which IPv4 treats as
/// "not computed".
pub fn build_udp(config: &PacketConfig) -> Result<Vec<u8>> {
    build_udp_with_rng(config, &mut rand::rng())
}

pub fn build_udp_with_rng<R: Rng>(config: &PacketConfig, rng: &mut R) -> Result<Vec<u8>> {
    let total_len: usize = UDP_HDR_LEN + config.payload().len();
    let mut buffer: Vec<u8> = vec![0u8; total_len];
    {
        let mut udp: MutableUdpPacket = MutableUdpPacket::new(&mut buffer)
            .ok_or_else(|| ProtocolError::malformed("buffer too small for UDP header"))?;
        udp.set_source(source_port_or_random(config, rng));
        udp.set_destination(config.dest_port());
        udp.set_length(total_len as u16);
        udp.set_payload(config.payload());
        udp.set_checksum(0);
    }
    Ok(buffer)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
