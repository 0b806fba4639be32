//! Half-open scanning: send a crafted SYN, read the answer off a raw
//! channel, never complete the handshake.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use phantom_protocols::packet::tcp::{FLAG_ACK, FLAG_RST, FLAG_SYN, TCP_HDR_LEN};
use phantom_protocols::packet::{PacketConfig, Protocol, build_tcp};
use rand::Rng;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::trace;

use crate::error::TransportError;
use crate::network::source::local_ipv4_for;
use crate::network::transport::{self, RawChannel, TransportHandle};

use super::PortStatus;

const SOURCE_PORT_MIN: u16 = 1024;
const FLAGS_OFFSET: usize = 13;

type PendingProbes = Arc<Mutex<HashMap<ProbeKey, oneshot::Sender<u8>>>>;

/// Identifies the reply to one probe: it comes from `host:port` and is
/// addressed to our `source_port`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ProbeKey {
    host: Ipv4Addr,
    port: u16,
    source_port: u16,
}

/// Port and flag fields of a captured TCP segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SegmentSummary {
    source_port: u16,
    dest_port: u16,
    flags: u8,
}

impl SegmentSummary {
    fn parse(segment: &[u8]) -> Option<Self> {
        if segment.len() < TCP_HDR_LEN {
            return None;
        }
        Some(Self {
            source_port: u16::from_be_bytes([segment[0], segment[1]]),
            dest_port: u16::from_be_bytes([segment[2], segment[3]]),
            flags: segment[FLAGS_OFFSET],
        })
    }
}

/// Shared by every probe of a scan. A background task routes captured
/// replies to whichever probe is waiting for them.
pub struct SynProber {
    channel: Mutex<RawChannel>,
    pending: PendingProbes,
    dispatcher: JoinHandle<()>,
}

impl SynProber {
    /// Needs root. Must be called from within a tokio runtime.
    pub fn open() -> Result<Self, TransportError> {
        if !is_root::is_root() {
            return Err(TransportError::PermissionDenied);
        }

        let TransportHandle { tx, mut rx } = transport::start_packet_capture(Protocol::Tcp)?;
        let pending: PendingProbes = Arc::new(Mutex::new(HashMap::new()));
        let table: PendingProbes = pending.clone();

        let dispatcher: JoinHandle<()> = tokio::spawn(async move {
            while let Some((segment, source)) = rx.recv().await {
                let IpAddr::V4(host) = source else { continue };
                let Some(summary) = SegmentSummary::parse(&segment) else { continue };

                let key: ProbeKey = ProbeKey {
                    host,
                    port: summary.source_port,
                    source_port: summary.dest_port,
                };
                let waiter: Option<oneshot::Sender<u8>> = table.lock().ok().and_then(|mut waiting| waiting.remove(&key));
                if let Some(waiter) = waiter {
                    let _ = waiter.send(summary.flags);
                }
            }
        });

        Ok(Self {
            channel: Mutex::new(tx),
            pending,
            dispatcher,
        })
    }

    pub async fn probe(&self, host: Ipv4Addr, port: u16, wait: Duration) -> anyhow::Result<PortStatus> {
        let source_ip: Ipv4Addr = local_ipv4_for(host);
        let source_port: u16 = rand::rng().random_range(SOURCE_PORT_MIN..=u16::MAX);
        let key: ProbeKey = ProbeKey {
            host,
            port,
            source_port,
        };

        let config: PacketConfig = PacketConfig::builder()
            .source_ip(source_ip.to_string())
            .dest_ip(host.to_string())
            .source_port(source_port as u32)
            .dest_port(port as u32)
            .flags(FLAG_SYN)
            .build()?;
        let segment: Vec<u8> = build_tcp(&config, None)?;

        let (reply_tx, reply_rx) = oneshot::channel::<u8>();
        self.pending
            .lock()
            .map_err(|_| anyhow!("probe table lock poisoned"))?
            .insert(key, reply_tx);

        let sent: Result<usize, TransportError> = match self.channel.lock() {
            Ok(mut channel) => channel.send(&segment, IpAddr::V4(host)),
            Err(_) => Err(TransportError::Io(std::io::Error::other("raw channel lock poisoned"))),
        };
        if let Err(e) = sent {
            self.forget(&key);
            return Err(e.into());
        }

        let status: PortStatus = match timeout(wait, reply_rx).await {
            Ok(Ok(flags)) => {
                trace!("SYN probe {host}:{port} answered with flags {flags:#04x}");
                classify(flags)
            }
            _ => PortStatus::Filtered,
        };
        self.forget(&key);
        Ok(status)
    }

    fn forget(&self, key: &ProbeKey) {
        if let Ok(mut waiting) = self.pending.lock() {
            waiting.remove(key);
        }
    }
}

impl Drop for SynProber {
    fn drop(&mut self) {
        self.dispatcher.abort();
    }
}

/// SYN-ACK means a listener, RST means none, anything else is inconclusive.
fn classify(flags: u8) -> PortStatus {
    let flags: u16 = flags as u16;
    if flags & FLAG_RST != 0 {
        PortStatus::Closed
    } else if flags & (FLAG_SYN | FLAG_ACK) == FLAG_SYN | FLAG_ACK {
        PortStatus::Open
    } else {
        PortStatus::Filtered
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
