use rand::Rng;

use crate::checksum::checksum_parts;
use crate::error::{ProtocolError, Result};
use crate::packet::{PacketConfig, Protocol, ipv4_pseudo_header, source_port_or_random};

pub const TCP_HDR_LEN: usize = 20;
pub const DEFAULT_WINDOW: u16 = 65535;

pub const FLAG_FIN: u16 = 0x001;
pub const FLAG_SYN: u16 = 0x002;
pub const FLAG_RST: u16 = 0x004;
pub const FLAG_PSH: u16 = 0x008;
pub const FLAG_ACK: u16 = 0x010;
pub const FLAG_URG: u16 = 0x020;
pub const FLAG_NS: u16 = 0x100;
/// The nine flag bits a TCP header can carry.
pub const FLAG_MASK: u16 = 0x1FF;

const DATA_OFFSET_WORDS: u8 = (TCP_HDR_LEN / 4) as u8;
const CHECKSUM_OFFSET: usize = 16;

/// Builds a TCP segment (20-byte header, no options) followed by the payload.
///
/// `config.source_ip()` must be set: it feeds the checksum pseudo-header.
/// A missing `seq` is drawn at random.
pub fn build_tcp(config: &PacketConfig, seq: Option<u32>) -> Result<Vec<u8>> {
    build_tcp_with_rng(config, seq, &mut rand::rng())
}

pub fn build_tcp_with_rng<R: Rng>(config: &PacketConfig, seq: Option<u32>, rng: &mut R) -> Result<Vec<u8>> {
    let source_ip = config.source_ip().ok_or(ProtocolError::MissingSourceAddress)?;
    let source_port: u16 = source_port_or_random(config, rng);
    let sequence: u32 = seq.unwrap_or_else(|| rng.random());
    let flags: u16 = config.flags();
    let payload: &[u8] = config.payload();
    let segment_len: usize = TCP_HDR_LEN + payload.len();

    let mut segment: Vec<u8> = Vec::with_capacity(segment_len);
    segment.extend_from_slice(&source_port.to_be_bytes());
    segment.extend_from_slice(&config.dest_port().to_be_bytes());
    segment.extend_from_slice(&sequence.to_be_bytes());
    segment.extend_from_slice(&0u32.to_be_bytes()); // ack
    // NS shares the data-offset byte; the other eight flags fill the next one.
    segment.push((DATA_OFFSET_WORDS << 4) | ((flags & FLAG_NS) >> 8) as u8);
    segment.push((flags & 0xFF) as u8);
    segment.extend_from_slice(&DEFAULT_WINDOW.to_be_bytes());
    segment.extend_from_slice(&0u16.to_be_bytes()); // checksum
    segment.extend_from_slice(&0u16.to_be_bytes()); // urgent pointer
    segment.extend_from_slice(payload);

    let pseudo = ipv4_pseudo_header(source_ip, config.dest_ip(), Protocol::Tcp, segment_len as u16);
    let csum: u16 = checksum_parts(&[&pseudo[..], &segment[..]]);
    segment[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 2].copy_from_slice(&csum.to_be_bytes());

    Ok(segment)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
