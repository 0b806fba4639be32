use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failures at the socket layer.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("No response within {0:?}")]
    Timeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Raw sockets require root privileges")]
    PermissionDenied,

    #[error("Response of {0} bytes exceeds the transport limit")]
    ResponseTooLarge(usize),
}

impl TransportError {
    /// Like `From<io::Error>`, but keeps permission failures distinguishable.
    pub fn from_io(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::PermissionDenied => TransportError::PermissionDenied,
            _ => TransportError::Io(e),
        }
    }
}
