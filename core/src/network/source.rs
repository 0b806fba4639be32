use std::net::{Ipv4Addr, SocketAddr, UdpSocket};

use tracing::debug;

const ROUTE_PROBE_PORT: u16 = 80;

/// The local IPv4 address the kernel would use to reach `destination`.
///
/// Connecting a UDP socket only consults the routing table, so nothing is
/// sent. Falls back to `127.0.0.1` when no route is found.
pub fn local_ipv4_for(destination: Ipv4Addr) -> Ipv4Addr {
    match route_source(destination) {
        Ok(source) => source,
        Err(e) => {
            debug!("No route to {destination} ({e}), using loopback as source");
            Ipv4Addr::LOCALHOST
        }
    }
}

fn route_source(destination: Ipv4Addr) -> std::io::Result<Ipv4Addr> {
    let socket: UdpSocket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect((destination, ROUTE_PROBE_PORT))?;
    match socket.local_addr()? {
        SocketAddr::V4(addr) if !addr.ip().is_unspecified() => Ok(*addr.ip()),
        other => Err(std::io::Error::other(format!("unusable local address {other}"))),
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
