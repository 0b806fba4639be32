use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

use phantom_common::config::ScanConfig;
use phantom_core::scanner::{self, PortResult, PortScanner, PortStatus, ScanType};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

use crate::support::LOCALHOST;

fn fast_scanner(banner_grab: bool) -> PortScanner {
    PortScanner::new(ScanConfig {
        timeout: Duration::from_millis(500),
        concurrency: 4,
        rate_limit: Duration::ZERO,
        max_per_minute: 0,
        banner_grab,
    })
}

/// A loopback port nobody listens on.
fn closed_port() -> u16 {
    let listener: std::net::TcpListener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port: u16 = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn greeting_server(greeting: &'static [u8]) -> u16 {
    let listener: TcpListener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port: u16 = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let _ = stream.write_all(greeting).await;
        }
    });
    port
}

#[tokio::test]
async fn connect_scan_separates_open_and_closed() {
    let open: u16 = greeting_server(b"").await;
    let closed: u16 = closed_port();

    let results: Vec<PortResult> = fast_scanner(false)
        .scan_ports(LOCALHOST, &[closed, open], ScanType::TcpConnect)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    let status_of = |port: u16| results.iter().find(|r| r.port == port).map(|r| r.status);
    assert_eq!(status_of(open), Some(PortStatus::Open));
    assert_eq!(status_of(closed), Some(PortStatus::Closed));
    assert_eq!(scanner::open_ports(&results), vec![open]);
    assert!(results.windows(2).all(|pair| pair[0].port < pair[1].port));
}

#[tokio::test]
async fn banners_name_the_service() {
    let port: u16 = greeting_server(b"SSH-2.0-OpenSSH_9.6\r\n").await;

    let result: PortResult = fast_scanner(true)
        .scan_port(LOCALHOST, port, ScanType::TcpConnect)
        .await
        .unwrap();

    assert_eq!(result.status, PortStatus::Open);
    assert_eq!(result.banner.as_deref(), Some("SSH-2.0-OpenSSH_9.6"));
    assert_eq!(result.service.as_deref(), Some("SSH"));

    let services: BTreeMap<String, Vec<u16>> = scanner::service_summary(std::slice::from_ref(&result));
    assert_eq!(services.get("SSH"), Some(&vec![port]));
}

#[tokio::test]
async fn range_covers_both_ends() {
    let results: Vec<PortResult> = fast_scanner(false)
        .scan_range(LOCALHOST, 1, 3, ScanType::TcpConnect)
        .await
        .unwrap();
    let ports: Vec<u16> = results.iter().map(|r| r.port).collect();
    assert_eq!(ports, vec![1, 2, 3]);
}

#[tokio::test]
async fn bad_arguments_are_rejected() {
    let scanner: PortScanner = fast_scanner(false);
    assert!(scanner.scan_ports(LOCALHOST, &[], ScanType::TcpConnect).await.is_err());
    assert!(scanner.scan_range(LOCALHOST, 20, 10, ScanType::TcpConnect).await.is_err());
    assert!(scanner.scan_port(LOCALHOST, 0, ScanType::TcpConnect).await.is_err());
}

#[tokio::test]
#[ignore]
async fn public_host_answers_on_http() {
    let host: IpAddr = phantom_core::network::resolve_target(&"scanme.nmap.org".parse().unwrap())
        .await
        .unwrap();
    let results: Vec<PortResult> = fast_scanner(false).scan_ports(host, &[80], ScanType::TcpConnect).await.unwrap();
    assert_eq!(results[0].status, PortStatus::Open);
}
