//! ICMP echo round trips over a raw socket.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use anyhow::Context;
use phantom_common::config::PingConfig;
use phantom_protocols::packet::icmp::{ECHO_REPLY, ICMP_HDR_LEN};
use phantom_protocols::packet::{PacketConfig, Protocol, build_icmp_echo};
use rand::Rng;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep, timeout_at};
use tracing::debug;

use crate::network::transport::{self, TransportHandle};

pub const PING_PAYLOAD: &[u8] = b"phantom echo request padding 32b";

#[derive(Debug, Clone, PartialEq)]
pub struct PingReport {
    pub target: Ipv4Addr,
    pub sent: u16,
    pub received: u16,
    /// Round-trip time of every answered request.
    pub times: Vec<Duration>,
}

impl PingReport {
    pub fn new(target: Ipv4Addr) -> Self {
        Self {
            target,
            sent: 0,
            received: 0,
            times: Vec::new(),
        }
    }

    pub fn lost(&self) -> u16 {
        self.sent.saturating_sub(self.received)
    }

    /// Percentage of requests left unanswered; 0 when nothing was sent.
    pub fn loss_percent(&self) -> f64 {
        if self.sent == 0 {
            return 0.0;
        }
        f64::from(self.lost()) / f64::from(self.sent) * 100.0
    }

    pub fn min_time(&self) -> Option<Duration> {
        self.times.iter().min().copied()
    }

    pub fn max_time(&self) -> Option<Duration> {
        self.times.iter().max().copied()
    }

    pub fn avg_time(&self) -> Option<Duration> {
        let count: u32 = u32::try_from(self.times.len()).ok().filter(|count| *count > 0)?;
        Some(self.times.iter().sum::<Duration>() / count)
    }
}

/// Sends `config.count` echo requests to `target`, one per `config.interval`.
///
/// All requests share one random identifier; sequence numbers count up
/// from zero. Requires root.
pub async fn ping(target: Ipv4Addr, config: &PingConfig) -> anyhow::Result<PingReport> {
    let TransportHandle { mut tx, mut rx } =
        transport::start_packet_capture(Protocol::Icmp).context("cannot open an ICMP channel")?;

    let identifier: u16 = rand::rng().random();
    let packet_config: PacketConfig = PacketConfig::builder()
        .dest_ip(target.to_string())
        .protocol(Protocol::Icmp)
        .payload(PING_PAYLOAD)
        .build()?;

    let mut report: PingReport = PingReport::new(target);
    for sequence in 0..config.count {
        if sequence > 0 {
            sleep(config.interval).await;
        }

        let request: Vec<u8> = build_icmp_echo(&packet_config, Some(identifier), Some(sequence))?;
        let sent_at: Instant = Instant::now();
        tx.send(&request, IpAddr::V4(target))?;
        report.sent += 1;

        if wait_for_reply(&mut rx, target, identifier, sequence, sent_at + config.timeout).await {
            let rtt: Duration = sent_at.elapsed();
            debug!("Reply from {target}: icmp_seq={sequence} time={:.2}ms", rtt.as_secs_f64() * 1000.0);
            report.received += 1;
            report.times.push(rtt);
        } else {
            debug!("Request timeout for icmp_seq {sequence}");
        }
    }

    Ok(report)
}

async fn wait_for_reply(
    rx: &mut UnboundedReceiver<(Vec<u8>, IpAddr)>,
    target: Ipv4Addr,
    identifier: u16,
    sequence: u16,
    deadline: Instant,
) -> bool {
    loop {
        match timeout_at(deadline, rx.recv()).await {
            Ok(Some((message, source))) => {
                if is_echo_reply(&message, source, target, identifier, sequence) {
                    return true;
                }
            }
            Ok(None) | Err(_) => return false,
        }
    }
}

/// Whether `message` from `source` answers request `identifier`/`sequence`.
fn is_echo_reply(message: &[u8], source: IpAddr, target: Ipv4Addr, identifier: u16, sequence: u16) -> bool {
    source == IpAddr::V4(target)
        && message.len() >= ICMP_HDR_LEN
        && message[0] == ECHO_REPLY
        && u16::from_be_bytes([message[4], message[5]]) == identifier
        && u16::from_be_bytes([message[6], message[7]]) == sequence
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
