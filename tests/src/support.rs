//! Loopback stand-ins for DNS servers.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use phantom_common::config::DnsConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Serves UDP DNS on an ephemeral loopback port. `respond` returning `None`
/// drops the request.
pub async fn udp_server<F>(respond: F) -> SocketAddr
where
    F: Fn(&[u8]) -> Option<Vec<u8>> + Send + 'static,
{
    let socket: UdpSocket = UdpSocket::bind((LOCALHOST, 0)).await.unwrap();
    let addr: SocketAddr = socket.local_addr().unwrap();

    tokio::spawn(async move {
        let mut buf: [u8; 512] = [0u8; 512];
        while let Ok((len, peer)) = socket.recv_from(&mut buf).await {
            if let Some(reply) = respond(&buf[..len]) {
                let _ = socket.send_to(&reply, peer).await;
            }
        }
    });
    addr
}

/// Serves DNS over TCP with two-byte length framing, one message per
/// connection.
pub async fn tcp_server<F>(respond: F) -> SocketAddr
where
    F: Fn(&[u8]) -> Vec<u8> + Send + 'static,
{
    let listener: TcpListener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut len: [u8; 2] = [0u8; 2];
            if stream.read_exact(&mut len).await.is_err() {
                continue;
            }
            let mut request: Vec<u8> = vec![0u8; u16::from_be_bytes(len) as usize];
            if stream.read_exact(&mut request).await.is_err() {
                continue;
            }
            let reply: Vec<u8> = respond(&request);
            let _ = stream.write_all(&(reply.len() as u16).to_be_bytes()).await;
            let _ = stream.write_all(&reply).await;
        }
    });
    addr
}

pub fn client_config(server: SocketAddr) -> DnsConfig {
    DnsConfig {
        server: server.ip(),
        port: server.port(),
        timeout: Duration::from_millis(300),
        retries: 3,
        retry_delay: Duration::from_millis(10),
    }
}

/// The question type of a single-question request.
pub fn query_type(request: &[u8]) -> u16 {
    let end: usize = request.len();
    u16::from_be_bytes([request[end - 4], request[end - 3]])
}

/// Echoes the request as a response carrying `answers`, each named by a
/// pointer to the question.
pub fn answer(request: &[u8], answers: &[(u16, Vec<u8>)]) -> Vec<u8> {
    let mut reply: Vec<u8> = request.to_vec();
    reply[2..4].copy_from_slice(&0x8180u16.to_be_bytes());
    reply[6..8].copy_from_slice(&(answers.len() as u16).to_be_bytes());
    for (rtype, rdata) in answers {
        reply.extend_from_slice(&[0xC0, 0x0C]);
        reply.extend_from_slice(&rtype.to_be_bytes());
        reply.extend_from_slice(&1u16.to_be_bytes());
        reply.extend_from_slice(&3600u32.to_be_bytes());
        reply.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        reply.extend_from_slice(rdata);
    }
    reply
}

pub fn rr(rtype: u16, rdata: &[u8]) -> (u16, Vec<u8>) {
    (rtype, rdata.to_vec())
}
