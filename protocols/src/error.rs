use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The buffer cannot be decoded: short header, reserved label bits,
    /// invalid UTF-8, or a compression pointer loop.
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// A read would have run past the end of the buffer.
    #[error("Packet truncated at offset {offset}")]
    Truncated { offset: usize },

    #[error("Invalid domain name: {0}")]
    InvalidName(String),

    #[error("Invalid packet configuration: {0}")]
    InvalidConfig(String),

    #[error("No source address available for the TCP pseudo-header")]
    MissingSourceAddress,
}

impl ProtocolError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPacket(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
