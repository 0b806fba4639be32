//! RFC 1071 Internet checksum.
//!
//! Shared by the TCP and ICMP builders. The sum is taken over big-endian
//! 16-bit words; an odd trailing byte is treated as if followed by a zero byte.

/// Computes the one's complement of the one's complement sum of `data`.
///
/// An empty buffer yields `0xFFFF`. Writing the result into a zeroed checksum
/// field of the same buffer and summing again yields `0x0000`.
pub fn checksum(data: &[u8]) -> u16 {
    fold(sum_words(data))
}

/// Checksum over several non-contiguous slices, as if they were concatenated.
///
/// Every slice except the last must have an even length, which holds for the
/// pseudo-header and header slices the builders pass in.
pub(crate) fn checksum_parts(parts: &[&[u8]]) -> u16 {
    fold(parts.iter().map(|part| sum_words(part)).sum())
}

fn sum_words(data: &[u8]) -> u64 {
    let mut words = data.chunks_exact(2);
    let mut acc: u64 = (&mut words)
        .map(|word| u16::from_be_bytes([word[0], word[1]]) as u64)
        .sum();
    if let [last] = words.remainder() {
        acc += (*last as u64) << 8;
    }
    acc
}

fn fold(mut acc: u64) -> u16 {
    while acc >> 16 != 0 {
        acc = (acc & 0xFFFF) + (acc >> 16);
    }
    !(acc as u16)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
