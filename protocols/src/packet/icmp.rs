use pnet::packet::Packet;
use pnet::packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet::packet::icmp::{IcmpCode, IcmpType};
use rand::Rng;

use crate::checksum::checksum;
use crate::error::{ProtocolError, Result};
use crate::packet::PacketConfig;

pub const ICMP_HDR_LEN: usize = 8;
pub const ECHO_REQUEST: u8 = 8;
pub const ECHO_REPLY: u8 = 0;

/// Builds an ICMP echo request carrying `config.payload()`.
///
/// Missing identifier or sequence values are drawn at random.
pub fn build_icmp_echo(config: &PacketConfig, identifier: Option<u16>, sequence: Option<u16>) -> Result<Vec<u8>> {
    build_icmp_echo_with_rng(config, identifier, sequence, &mut rand::rng())
}

pub fn build_icmp_echo_with_rng<R: Rng>(
    config: &PacketConfig,
    identifier: Option<u16>,
    sequence: Option<u16>,
    rng: &mut R,
) -> Result<Vec<u8>> {
    let identifier: u16 = identifier.unwrap_or_else(|| rng.random());
    let sequence: u16 = sequence.unwrap_or_else(|| rng.random());
    build_icmp(ECHO_REQUEST, 0, identifier, sequence, config.payload())
}

/// Builds an ICMP message with the echo layout: type, code, checksum,
/// identifier, sequence, payload. The checksum covers the whole message.
pub fn build_icmp(icmp_type: u8, code: u8, identifier: u16, sequence: u16, payload: &[u8]) -> Result<Vec<u8>> {
    let mut buffer: Vec<u8> = vec![0u8; ICMP_HDR_LEN + payload.len()];
    {
        let mut icmp: MutableEchoRequestPacket = MutableEchoRequestPacket::new(&mut buffer)
            .ok_or_else(|| ProtocolError::malformed("buffer too small for ICMP header"))?;
        icmp.set_icmp_type(IcmpType(icmp_type));
        icmp.set_icmp_code(IcmpCode(code));
        icmp.set_identifier(identifier);
        icmp.set_sequence_number(sequence);
        icmp.set_payload(payload);

        icmp.set_checksum(0);
        let csum: u16 = checksum(icmp.packet());
        icmp.set_checksum(csum);
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
