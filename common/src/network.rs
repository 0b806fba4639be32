pub mod ports;
pub mod target;
