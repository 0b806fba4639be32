//! # Phantom core
//!
//! Everything in Phantom that touches the network. The wire formats come from
//! `phantom-protocols`; this crate adds sockets, timeouts, retries and
//! concurrency on top of them.
//!
//! * **[`resolver`]**: DNS client with retries, zone transfer and enumeration.
//! * **[`scanner`]**: TCP connect, SYN and UDP port scanning.
//! * **[`ping`]**: ICMP echo round trips.
//! * **[`craft`]**: build a single packet and optionally put it on the wire.
//! * **[`network`]**: the socket layer the above share.

pub mod craft;
pub mod error;
pub mod network;
pub mod ping;
pub mod resolver;
pub mod scanner;

pub use error::TransportError;
