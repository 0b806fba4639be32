use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::timeout;

const PROBE_READ_LEN: usize = 1024;

/// Sends an empty datagram to `addr` and waits for any reply.
///
/// `Ok(None)` means silence. A refused error means the host answered with
/// ICMP port unreachable, which a connected socket surfaces on `recv`.
pub async fn probe(addr: SocketAddr, wait: Duration) -> io::Result<Option<Vec<u8>>> {
    let local: SocketAddr = match addr {
        SocketAddr::V4(_) => SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0),
        SocketAddr::V6(_) => SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), 0),
    };
    let socket: UdpSocket = UdpSocket::bind(local).await?;
    socket.connect(addr).await?;
    socket.send(&[]).await?;

    let mut buf: [u8; PROBE_READ_LEN] = [0u8; PROBE_READ_LEN];
    match timeout(wait, socket.recv(&mut buf)).await {
        Ok(Ok(len)) => Ok(Some(buf[..len].to_vec())),
        Ok(Err(e)) => Err(e),
        Err(_elapsed) => Ok(None),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
