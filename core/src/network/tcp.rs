use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

const BANNER_READ_LEN: usize = 1024;

/// What a full TCP handshake attempt ran into.
#[derive(Debug)]
pub enum ConnectOutcome {
    Connected(TcpStream),
    /// The host answered with a reset.
    Refused,
    TimedOut,
    Failed(io::Error),
}

pub async fn connect(addr: SocketAddr, wait: Duration) -> ConnectOutcome {
    match timeout(wait, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => ConnectOutcome::Connected(stream),
        Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => ConnectOutcome::Refused,
        Ok(Err(e)) => ConnectOutcome::Failed(e),
        Err(_elapsed) => ConnectOutcome::TimedOut,
    }
}

/// Reads whatever the service volunteers right after the handshake.
///
/// Returns `None` on silence, a closed connection, or an empty line.
pub async fn read_banner(stream: &mut TcpStream, wait: Duration) -> Option<String> {
    let mut buf: [u8; BANNER_READ_LEN] = [0u8; BANNER_READ_LEN];
    let len: usize = match timeout(wait, stream.read(&mut buf)).await {
        Ok(Ok(len)) if len > 0 => len,
        _ => return None,
    };

    let banner: String = String::from_utf8_lossy(&buf[..len]).trim().to_string();
    (!banner.is_empty()).then_some(banner)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
