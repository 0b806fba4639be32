//! Raw layer-4 sockets over pnet transport channels.
//!
//! The kernel builds the IP header; callers hand over a finished TCP, UDP or
//! ICMP message. Opening a channel needs root (or `CAP_NET_RAW`).

use std::net::IpAddr;
use std::time::Duration;

use phantom_protocols::packet::Protocol;
use pnet::{
    packet::{Packet, ip::IpNextHeaderProtocols},
    transport::{self, TransportChannelType, TransportProtocol, TransportReceiver, TransportSender},
};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::TransportError;

const TRANSPORT_BUFFER_SIZE: usize = 4096;
const LISTENER_POLL: Duration = Duration::from_millis(200);

const CHANNEL_TYPE_TCP: TransportChannelType =
    TransportChannelType::Layer4(TransportProtocol::Ipv4(IpNextHeaderProtocols::Tcp));
const CHANNEL_TYPE_UDP: TransportChannelType =
    TransportChannelType::Layer4(TransportProtocol::Ipv4(IpNextHeaderProtocols::Udp));
const CHANNEL_TYPE_ICMP: TransportChannelType =
    TransportChannelType::Layer4(TransportProtocol::Ipv4(IpNextHeaderProtocols::Icmp));

/// Already-serialized bytes handed to pnet as-is.
struct RawBytes<'a>(&'a [u8]);

impl Packet for RawBytes<'_> {
    fn packet(&self) -> &[u8] {
        self.0
    }

    fn payload(&self) -> &[u8] {
        &[]
    }
}

/// Sending half of a raw channel.
pub struct RawChannel {
    tx: TransportSender,
    protocol: Protocol,
}

impl RawChannel {
    /// Opens a send-only channel; the receiving half is dropped.
    pub fn open(protocol: Protocol) -> Result<Self, TransportError> {
        let (tx, _rx) = open_channel(protocol)?;
        Ok(Self { tx, protocol })
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn set_ttl(&mut self, ttl: u8) -> Result<(), TransportError> {
        self.tx.set_ttl(ttl).map_err(TransportError::from_io)
    }

    pub fn send(&mut self, packet: &[u8], destination: IpAddr) -> Result<usize, TransportError> {
        let sent: usize = self
            .tx
            .send_to(RawBytes(packet), destination)
            .map_err(TransportError::from_io)?;
        debug!("Sent {sent} byte {} packet to {destination}", self.protocol);
        Ok(sent)
    }
}

/// A raw channel plus a queue fed with every packet of its protocol that
/// reaches this host, tagged with the sender's address.
pub struct TransportHandle {
    pub tx: RawChannel,
    pub rx: mpsc::UnboundedReceiver<(Vec<u8>, IpAddr)>,
}

macro_rules! spawn_listener {
    ($queue:expr, $rx:expr, $iter_func:path) => {
        std::thread::spawn(move || {
            let mut iterator = $iter_func(&mut $rx);
            while !$queue.is_closed() {
                match iterator.next_with_timeout(LISTENER_POLL) {
                    Ok(Some((packet, source_ip))) => {
                        if $queue.send((packet.packet().to_vec(), source_ip)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => continue,
                    Err(e) => {
                        debug!("Packet capture stopped: {e}");
                        break;
                    }
                }
            }
        })
    };
}

/// Opens a channel for `protocol` and starts a capture thread. The thread
/// exits once the returned receiver is dropped.
pub fn start_packet_capture(protocol: Protocol) -> Result<TransportHandle, TransportError> {
    let (tx, mut rx_socket) = open_channel(protocol)?;
    let (queue_tx, queue_rx) = mpsc::unbounded_channel();

    match protocol {
        Protocol::Tcp => spawn_listener!(queue_tx, rx_socket, pnet::transport::tcp_packet_iter),
        Protocol::Udp => spawn_listener!(queue_tx, rx_socket, pnet::transport::udp_packet_iter),
        Protocol::Icmp => spawn_listener!(queue_tx, rx_socket, pnet::transport::icmp_packet_iter),
    };

    Ok(TransportHandle {
        tx: RawChannel { tx, protocol },
        rx: queue_rx,
    })
}

fn open_channel(protocol: Protocol) -> Result<(TransportSender, TransportReceiver), TransportError> {
    let channel_type: TransportChannelType = match protocol {
        Protocol::Tcp => CHANNEL_TYPE_TCP,
        Protocol::Udp => CHANNEL_TYPE_UDP,
        Protocol::Icmp => CHANNEL_TYPE_ICMP,
    };
    transport::transport_channel(TRANSPORT_BUFFER_SIZE, channel_type).map_err(TransportError::from_io)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
