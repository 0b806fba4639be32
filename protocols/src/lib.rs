//! # Phantom wire formats
//!
//! Pure encoders and decoders with no I/O:
//!
//! * **[`checksum`]**: RFC 1071 Internet checksum.
//! * **[`dns`]**: DNS queries, responses and compressed names.
//! * **[`packet`]**: TCP, UDP and ICMP echo packet construction.
//!
//! Everything returns [`error::Result`]; sockets, timeouts and retries live
//! in `phantom-core`.

pub mod checksum;
pub mod dns;
pub mod error;
pub mod packet;

pub use checksum::checksum;
pub use error::{ProtocolError, Result};
