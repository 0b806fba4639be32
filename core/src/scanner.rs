//! Port scanning.
//!
//! [`PortScanner`] probes ports with one of three techniques ([`ScanType`])
//! and reports a [`PortResult`] per port. Probes run concurrently up to
//! `ScanConfig::concurrency`, but their start times pass through a shared
//! [`RateLimiter`] so a scan never bursts.

mod limiter;
mod service;
mod syn;

use std::collections::BTreeMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::ensure;
use phantom_common::config::ScanConfig;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::network::tcp::{self, ConnectOutcome};
use crate::network::udp;

pub use limiter::RateLimiter;
pub use service::identify_service;
pub use syn::SynProber;

/// Above this many ports a scan gets a "may take a while" warning.
const LARGE_SCAN: usize = 1000;
const UDP_BANNER_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanType {
    /// Full handshake through the OS socket API. Needs no privileges.
    TcpConnect,
    /// Half-open scan over a raw socket. Falls back to [`ScanType::TcpConnect`]
    /// without root.
    Syn,
    Udp,
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            ScanType::TcpConnect => "tcp_connect",
            ScanType::Syn => "syn_scan",
            ScanType::Udp => "udp_scan",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortStatus {
    Open,
    Closed,
    /// No answer within the timeout.
    Filtered,
    Error,
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &str = match self {
            PortStatus::Open => "open",
            PortStatus::Closed => "closed",
            PortStatus::Filtered => "filtered",
            PortStatus::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortResult {
    pub port: u16,
    pub status: PortStatus,
    pub response_time: Duration,
    pub service: Option<String>,
    pub banner: Option<String>,
}

impl PortResult {
    fn new(port: u16, status: PortStatus, response_time: Duration) -> Self {
        Self {
            port,
            status,
            response_time,
            service: None,
            banner: None,
        }
    }
}

/// Cheap to clone; clones share the rate limiter and the SYN prober.
#[derive(Clone)]
pub struct PortScanner {
    config: ScanConfig,
    limiter: Arc<RateLimiter>,
    syn: Arc<OnceLock<Option<SynProber>>>,
}

impl PortScanner {
    pub fn new(config: ScanConfig) -> Self {
        let limiter: RateLimiter = RateLimiter::new(config.rate_limit, config.max_per_minute);
        Self {
            config,
            limiter: Arc::new(limiter),
            syn: Arc::new(OnceLock::new()),
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub async fn scan_port(&self, host: IpAddr, port: u16, scan_type: ScanType) -> anyhow::Result<PortResult> {
        ensure!(port != 0, "Port must be between 1 and 65535");

        self.limiter.acquire().await;
        debug!("Scanning {host}:{port} with {scan_type}");

        let result: PortResult = match scan_type {
            ScanType::TcpConnect => self.tcp_connect_scan(host, port).await,
            ScanType::Udp => self.udp_scan(host, port).await,
            ScanType::Syn => match (self.syn_prober(), host) {
                (Some(prober), IpAddr::V4(v4)) => self.syn_scan(prober, v4, port).await,
                (Some(_), IpAddr::V6(_)) => {
                    debug!("SYN scan is IPv4 only, using TCP connect for {host}");
                    self.tcp_connect_scan(host, port).await
                }
                (None, _) => self.tcp_connect_scan(host, port).await,
            },
        };
        Ok(result)
    }

    /// Scans `ports` concurrently and returns one result per port, sorted
    /// by port number.
    pub async fn scan_ports(&self, host: IpAddr, ports: &[u16], scan_type: ScanType) -> anyhow::Result<Vec<PortResult>> {
        ensure!(!ports.is_empty(), "Ports list cannot be empty");
        ensure!(!ports.contains(&0), "Port must be between 1 and 65535");

        if ports.len() > LARGE_SCAN {
            warn!("Scanning {} ports - this may take a while", ports.len());
        }
        info!("Scanning {} ports on {host}", ports.len());

        let semaphore: Arc<Semaphore> = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks: JoinSet<(u16, anyhow::Result<PortResult>)> = JoinSet::new();

        for &port in ports {
            let scanner: PortScanner = self.clone();
            let permits: Arc<Semaphore> = semaphore.clone();
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                (port, scanner.scan_port(host, port, scan_type).await)
            });
        }

        let mut results: Vec<PortResult> = Vec::with_capacity(ports.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(result))) => results.push(result),
                Ok((port, Err(e))) => {
                    error!("Error scanning port {port}: {e}");
                    results.push(PortResult::new(port, PortStatus::Error, Duration::ZERO));
                }
                Err(e) => error!("Scan task failed: {e}"),
            }
        }

        results.sort_by_key(|result| result.port);
        info!("Scan completed: {} results", results.len());
        Ok(results)
    }

    /// Scans `start..=end`.
    pub async fn scan_range(
        &self,
        host: IpAddr,
        start: u16,
        end: u16,
        scan_type: ScanType,
    ) -> anyhow::Result<Vec<PortResult>> {
        ensure!(start <= end, "Start port must be <= end port");
        let ports: Vec<u16> = (start..=end).collect();
        self.scan_ports(host, &ports, scan_type).await
    }

    async fn tcp_connect_scan(&self, host: IpAddr, port: u16) -> PortResult {
        let start: Instant = Instant::now();

        match tcp::connect(SocketAddr::new(host, port), self.config.timeout).await {
            ConnectOutcome::Connected(mut stream) => {
                let response_time: Duration = start.elapsed();
                let banner: Option<String> = match self.config.banner_grab {
                    true => tcp::read_banner(&mut stream, self.config.timeout).await,
                    false => None,
                };
                PortResult {
                    port,
                    status: PortStatus::Open,
                    response_time,
                    service: identify_service(port, banner.as_deref()).map(str::to_string),
                    banner,
                }
            }
            ConnectOutcome::Refused => PortResult::new(port, PortStatus::Closed, start.elapsed()),
            ConnectOutcome::TimedOut => PortResult::new(port, PortStatus::Filtered, self.config.timeout),
            ConnectOutcome::Failed(e) => {
                error!("Error scanning port {port}: {e}");
                PortResult::new(port, PortStatus::Error, start.elapsed())
            }
        }
    }

    async fn udp_scan(&self, host: IpAddr, port: u16) -> PortResult {
        let start: Instant = Instant::now();

        match udp::probe(SocketAddr::new(host, port), self.config.timeout).await {
            Ok(Some(reply)) => {
                let banner: String = String::from_utf8_lossy(&reply).chars().take(UDP_BANNER_CHARS).collect();
                let banner: Option<String> = (!banner.is_empty()).then_some(banner);
                PortResult {
                    port,
                    status: PortStatus::Open,
                    response_time: start.elapsed(),
                    service: identify_service(port, banner.as_deref()).map(str::to_string),
                    banner,
                }
            }
            Ok(None) => PortResult::new(port, PortStatus::Filtered, self.config.timeout),
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
                PortResult::new(port, PortStatus::Closed, start.elapsed())
            }
            Err(e) => {
                error!("Error UDP scanning port {port}: {e}");
                PortResult::new(port, PortStatus::Error, start.elapsed())
            }
        }
    }

    async fn syn_scan(&self, prober: &SynProber, host: Ipv4Addr, port: u16) -> PortResult {
        let start: Instant = Instant::now();

        match prober.probe(host, port, self.config.timeout).await {
            Ok(PortStatus::Open) => PortResult {
                port,
                status: PortStatus::Open,
                response_time: start.elapsed(),
                service: identify_service(port, None).map(str::to_string),
                banner: None,
            },
            Ok(PortStatus::Filtered) => PortResult::new(port, PortStatus::Filtered, self.config.timeout),
            Ok(status) => PortResult::new(port, status, start.elapsed()),
            Err(e) => {
                error!("Error SYN scanning port {port}: {e}");
                PortResult::new(port, PortStatus::Error, start.elapsed())
            }
        }
    }

    /// Opens the raw channel on first use; `None` once opening has failed.
    fn syn_prober(&self) -> Option<&SynProber> {
        self.syn
            .get_or_init(|| match SynProber::open() {
                Ok(prober) => Some(prober),
                Err(e) => {
                    warn!("SYN scan unavailable ({e}), falling back to TCP connect");
                    None
                }
            })
            .as_ref()
    }
}

/// Ports reported open, in input order.
pub fn open_ports(results: &[PortResult]) -> Vec<u16> {
    results
        .iter()
        .filter(|result| result.status == PortStatus::Open)
        .map(|result| result.port)
        .collect()
}

/// Open ports grouped by identified service.
pub fn service_summary(results: &[PortResult]) -> BTreeMap<String, Vec<u16>> {
    let mut services: BTreeMap<String, Vec<u16>> = BTreeMap::new();
    for result in results.iter().filter(|result| result.status == PortStatus::Open) {
        if let Some(service) = &result.service {
            services.entry(service.clone()).or_default().push(result.port);
        }
    }
    services
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::{TcpListener, UdpSocket};

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    fn fast_scanner(banner_grab: bool) -> PortScanner {
        PortScanner::new(ScanConfig {
            timeout: Duration::from_millis(500),
            concurrency: 4,
            rate_limit: Duration::ZERO,
            max_per_minute: 0,
            banner_grab,
        })
    }

    async fn closed_port() -> u16 {
        let listener: TcpListener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    }

    fn result(port: u16, status: PortStatus, service: Option<&str>) -> PortResult {
        PortResult {
            port,
            status,
            response_time: Duration::ZERO,
            service: service.map(str::to_string),
            banner: None,
        }
    }

    #[tokio::test]
    async fn tcp_connect_reports_open_listener() {
        let listener: TcpListener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port: u16 = listener.local_addr().unwrap().port();

        let result: PortResult = fast_scanner(false).scan_port(LOCALHOST, port, ScanType::TcpConnect).await.unwrap();
        assert_eq!(result.status, PortStatus::Open);
        assert!(result.banner.is_none());
    }

    #[tokio::test]
    async fn tcp_connect_reports_closed_port() {
        let port: u16 = closed_port().await;
        let result: PortResult = fast_scanner(false).scan_port(LOCALHOST, port, ScanType::TcpConnect).await.unwrap();
        assert_eq!(result.status, PortStatus::Closed);
    }

    #[tokio::test]
    async fn banner_grab_identifies_service() {
        let listener: TcpListener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port: u16 = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            stream.write_all(b"SSH-2.0-OpenSSH_9.6\r\n").await.unwrap();
        });

        let result: PortResult = fast_scanner(true).scan_port(LOCALHOST, port, ScanType::TcpConnect).await.unwrap();
        assert_eq!(result.status, PortStatus::Open);
        assert_eq!(result.banner.as_deref(), Some("SSH-2.0-OpenSSH_9.6"));
        assert_eq!(result.service.as_deref(), Some("SSH"));
    }

    #[tokio::test]
    async fn udp_reply_means_open() {
        let server: UdpSocket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port: u16 = server.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut buf: [u8; 16] = [0u8; 16];
            let (_, peer) = server.recv_from(&mut buf).await.unwrap();
            server.send_to(b"hello from udp", peer).await.unwrap();
        });

        let result: PortResult = fast_scanner(false).scan_port(LOCALHOST, port, ScanType::Udp).await.unwrap();
        assert_eq!(result.status, PortStatus::Open);
        assert_eq!(result.banner.as_deref(), Some("hello from udp"));
    }

    #[tokio::test]
    async fn udp_silence_is_not_open() {
        let server: UdpSocket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port: u16 = server.local_addr().unwrap().port();

        let result: PortResult = fast_scanner(false).scan_port(LOCALHOST, port, ScanType::Udp).await.unwrap();
        assert_eq!(result.status, PortStatus::Filtered);
        drop(server);
    }

    #[tokio::test]
    async fn scan_ports_is_sorted_and_complete() {
        let listener: TcpListener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open: u16 = listener.local_addr().unwrap().port();
        let closed: u16 = closed_port().await;

        let ports: Vec<u16> = vec![open.max(closed), open.min(closed)];
        let results: Vec<PortResult> = fast_scanner(false)
            .scan_ports(LOCALHOST, &ports, ScanType::TcpConnect)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results[0].port < results[1].port);
        assert_eq!(open_ports(&results), vec![open]);
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let scanner: PortScanner = fast_scanner(false);
        assert!(scanner.scan_ports(LOCALHOST, &[], ScanType::TcpConnect).await.is_err());
        assert!(scanner.scan_ports(LOCALHOST, &[0, 80], ScanType::TcpConnect).await.is_err());
        assert!(scanner.scan_range(LOCALHOST, 100, 99, ScanType::TcpConnect).await.is_err());
        assert!(scanner.scan_port(LOCALHOST, 0, ScanType::Udp).await.is_err());
    }

    #[tokio::test]
    async fn syn_without_privileges_falls_back_to_connect() {
        if is_root::is_root() {
            return;
        }
        let listener: TcpListener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port: u16 = listener.local_addr().unwrap().port();

        let result: PortResult = fast_scanner(false).scan_port(LOCALHOST, port, ScanType::Syn).await.unwrap();
        assert_eq!(result.status, PortStatus::Open);
    }

    #[test]
    fn summaries_only_count_open_ports() {
        let results: Vec<PortResult> = vec![
            result(22, PortStatus::Open, Some("SSH")),
            result(80, PortStatus::Open, Some("HTTP")),
            result(2222, PortStatus::Open, Some("SSH")),
            result(443, PortStatus::Closed, Some("HTTPS")),
            result(9999, PortStatus::Open, None),
        ];

        assert_eq!(open_ports(&results), vec![22, 80, 2222, 9999]);

        let summary: BTreeMap<String, Vec<u16>> = service_summary(&results);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary["SSH"], vec![22, 2222]);
        assert_eq!(summary["HTTP"], vec![80]);
    }

    #[test]
    fn display_names() {
        assert_eq!(ScanType::TcpConnect.to_string(), "tcp_connect");
        assert_eq!(PortStatus::Filtered.to_string(), "filtered");
    }
}
