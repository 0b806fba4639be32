//! Domain name encoding and decompression (RFC 1035 §3.1, §4.1.4).

use crate::error::{ProtocolError, Result};

pub const MAX_LABEL_LEN: usize = 63;
pub const MAX_NAME_LEN: usize = 255;

/// Upper bound on compression pointers followed while decoding one name.
pub const MAX_POINTER_HOPS: usize = 128;

const POINTER_MASK: u8 = 0xC0;

/// Encodes a dotted name into length-prefixed labels terminated by `0x00`.
///
/// A single trailing dot is accepted and ignored. As a deliberate relaxation
/// of the "no empty labels" rule, `""` and `"."` both encode to the root name
/// instead of being rejected; any other empty label is an error.
pub fn encode_name(domain: &str) -> Result<Vec<u8>> {
    let trimmed: &str = domain.strip_suffix('.').unwrap_or(domain);
    let mut encoded: Vec<u8> = Vec::with_capacity(trimmed.len() + 2);

    if !trimmed.is_empty() {
        for label in trimmed.split('.') {
            if label.is_empty() {
                return Err(ProtocolError::InvalidName(format!("empty label in '{domain}'")));
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(ProtocolError::InvalidName(format!(
                    "label '{label}' is {} bytes, maximum is {MAX_LABEL_LEN}",
                    label.len()
                )));
            }
            encoded.push(label.len() as u8);
            encoded.extend_from_slice(label.as_bytes());
        }
    }
    encoded.push(0);

    if encoded.len() > MAX_NAME_LEN {
        return Err(ProtocolError::InvalidName(format!(
            "'{domain}' encodes to {} bytes, maximum is {MAX_NAME_LEN}",
            encoded.len()
        )));
    }
    Ok(encoded)
}

/// Decodes the name starting at `offset`, following compression pointers.
///
/// Returns the dotted name and the offset just past the name as it appears at
/// `offset`: after its terminating zero, or after the first pointer's two
/// bytes. Pointer targets never move the returned offset.
///
/// A name whose wire form would exceed [`MAX_NAME_LEN`] once pointers are
/// expanded is malformed.
pub fn decode_name(buf: &[u8], offset: usize) -> Result<(String, usize)> {
    let mut labels: Vec<&str> = Vec::new();
    let mut cursor: usize = offset;
    let mut end: Option<usize> = None;
    let mut hops: usize = 0;
    // Expanded wire length, counting the terminating zero.
    let mut wire_len: usize = 1;

    loop {
        let len_byte: u8 = *buf.get(cursor).ok_or(ProtocolError::Truncated { offset: cursor })?;

        match len_byte & POINTER_MASK {
            0x00 if len_byte == 0 => {
                end.get_or_insert(cursor + 1);
                break;
            }
            0x00 => {
                let start: usize = cursor + 1;
                let stop: usize = start + len_byte as usize;
                let bytes: &[u8] = buf
                    .get(start..stop)
                    .ok_or(ProtocolError::Truncated { offset: start })?;
                let label: &str = std::str::from_utf8(bytes).map_err(|_| {
                    ProtocolError::malformed(format!("label at offset {start} is not valid UTF-8"))
                })?;
                wire_len += bytes.len() + 1;
                if wire_len > MAX_NAME_LEN {
                    return Err(ProtocolError::malformed(format!(
                        "name at offset {offset} expands past {MAX_NAME_LEN} bytes"
                    )));
                }
                labels.push(label);
                cursor = stop;
            }
            POINTER_MASK => {
                let low: u8 = *buf
                    .get(cursor + 1)
                    .ok_or(ProtocolError::Truncated { offset: cursor + 1 })?;
                end.get_or_insert(cursor + 2);

                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(ProtocolError::malformed(format!(
                        "more than {MAX_POINTER_HOPS} compression pointers in name at offset {offset}"
                    )));
                }
                cursor = (((len_byte & !POINTER_MASK) as usize) << 8) | low as usize;
            }
            _ => {
                return Err(ProtocolError::malformed(format!(
                    "reserved label type 0x{len_byte:02x} at offset {cursor}"
                )));
            }
        }
    }

    let next: usize = end.unwrap_or(cursor + 1);
    Ok((labels.join("."), next))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
