//! Request/response transports for DNS.
//!
//! [`Exchange`] is the seam between the DNS client and the network, so the
//! client can be driven by scripted transports in tests.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use tracing::trace;

use crate::error::TransportError;

/// Largest DNS message accepted over UDP.
pub const MAX_UDP_RESPONSE: usize = 512;

#[async_trait]
pub trait Exchange: Send + Sync {
    /// Sends `request` to `server` and returns the single reply message.
    async fn exchange(
        &self,
        request: &[u8],
        server: SocketAddr,
        timeout: Duration,
    ) -> Result<Vec<u8>, TransportError>;
}

/// One datagram out, one datagram back.
#[derive(Debug, Clone, Copy, Default)]
pub struct UdpExchange;

#[async_trait]
impl Exchange for UdpExchange {
    async fn exchange(
        &self,
        request: &[u8],
        server: SocketAddr,
        wait: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let local: SocketAddr = match server {
            SocketAddr::V4(_) => SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0),
            SocketAddr::V6(_) => SocketAddr::new(Ipv6Addr::UNSPECIFIED.into(), 0),
        };
        let socket: UdpSocket = UdpSocket::bind(local).await?;
        // Connecting makes the kernel drop datagrams from anyone but `server`.
        socket.connect(server).await?;
        socket.send(request).await?;
        trace!("Sent {} byte datagram to {server}", request.len());

        let mut buf: [u8; MAX_UDP_RESPONSE + 1] = [0u8; MAX_UDP_RESPONSE + 1];
        let len: usize = timeout(wait, socket.recv(&mut buf))
            .await
            .map_err(|_| TransportError::Timeout(wait))??;

        if len > MAX_UDP_RESPONSE {
            return Err(TransportError::ResponseTooLarge(len));
        }
        Ok(buf[..len].to_vec())
    }
}

/// DNS over TCP: every message is preceded by its length as a big-endian u16.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpExchange;

#[async_trait]
impl Exchange for TcpExchange {
    async fn exchange(
        &self,
        request: &[u8],
        server: SocketAddr,
        wait: Duration,
    ) -> Result<Vec<u8>, TransportError> {
        let frame_len: u16 = u16::try_from(request.len())
            .map_err(|_| TransportError::ResponseTooLarge(request.len()))?;

        timeout(wait, async {
            let mut stream: TcpStream = TcpStream::connect(server).await?;
            let mut framed: Vec<u8> = Vec::with_capacity(request.len() + 2);
            framed.extend_from_slice(&frame_len.to_be_bytes());
            framed.extend_from_slice(request);
            stream.write_all(&framed).await?;

            let reply_len: usize = stream.read_u16().await? as usize;
            let mut reply: Vec<u8> = vec![0u8; reply_len];
            stream.read_exact(&mut reply).await?;
            trace!("Read {reply_len} byte framed reply from {server}");
            Ok::<Vec<u8>, TransportError>(reply)
        })
        .await
        .map_err(|_| TransportError::Timeout(wait))?
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
