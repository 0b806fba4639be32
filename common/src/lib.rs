//! Types shared by the Phantom crates: run configuration, scan targets, port
//! lists, and the logging targets the terminal front-end renders specially.

pub mod config;
pub mod log;
pub mod network;

pub use tracing;
