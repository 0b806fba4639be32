use std::collections::BTreeMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use phantom_common::config::DnsConfig;
use phantom_core::TransportError;
use phantom_core::network::exchange::{Exchange, TcpExchange, UdpExchange};
use phantom_core::resolver::DnsClient;
use phantom_protocols::dns::{DnsRecord, DnsRecordType, encode_name};

use crate::support::{answer, client_config, query_type, rr, tcp_server, udp_server};

fn mx_rdata(preference: u16, exchange: &str) -> Vec<u8> {
    let mut rdata: Vec<u8> = preference.to_be_bytes().to_vec();
    rdata.extend_from_slice(&encode_name(exchange).unwrap());
    rdata
}

#[tokio::test]
async fn resolves_a_records_over_udp() {
    let server: SocketAddr = udp_server(|request| {
        Some(answer(request, &[rr(1, &[93, 184, 216, 34]), rr(1, &[93, 184, 216, 35])]))
    })
    .await;
    let client: DnsClient = DnsClient::new(client_config(server));

    let ips: Vec<Ipv4Addr> = client.resolve("example.com").await;
    assert_eq!(ips, vec![Ipv4Addr::new(93, 184, 216, 34), Ipv4Addr::new(93, 184, 216, 35)]);
}

#[tokio::test]
async fn mx_records_carry_preference() {
    let server: SocketAddr = udp_server(|request| Some(answer(request, &[(15, mx_rdata(10, "mail.example.com"))]))).await;
    let client: DnsClient = DnsClient::new(client_config(server));

    let records: Vec<DnsRecord> = client.mx_records("example.com").await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].record_type(), DnsRecordType::MX);
    assert_eq!(records[0].priority(), Some(10));
    assert_eq!(records[0].data(), "mail.example.com");
    assert_eq!(records[0].ttl(), 3600);
}

#[tokio::test]
async fn dropped_requests_are_retried() {
    let seen: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
    let counter: Arc<AtomicUsize> = seen.clone();
    let server: SocketAddr = udp_server(move |request| match counter.fetch_add(1, Ordering::SeqCst) {
        0 => None,
        _ => Some(answer(request, &[rr(1, &[10, 0, 0, 1])])),
    })
    .await;
    let client: DnsClient = DnsClient::new(client_config(server));

    let ips: Vec<Ipv4Addr> = client.resolve("retry.example").await;
    assert_eq!(ips, vec![Ipv4Addr::new(10, 0, 0, 1)]);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn silent_server_yields_nothing_after_every_attempt() {
    let seen: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
    let counter: Arc<AtomicUsize> = seen.clone();
    let server: SocketAddr = udp_server(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        None
    })
    .await;
    let config: DnsConfig = DnsConfig {
        timeout: Duration::from_millis(100),
        retries: 2,
        ..client_config(server)
    };
    let client: DnsClient = DnsClient::new(config);

    let records: Vec<DnsRecord> = client.query("silent.example", DnsRecordType::A).await;
    assert!(records.is_empty());
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn replies_to_other_transactions_are_ignored() {
    let server: SocketAddr = udp_server(|request| {
        let mut reply: Vec<u8> = answer(request, &[rr(1, &[10, 0, 0, 9])]);
        let wrong: u16 = u16::from_be_bytes([reply[0], reply[1]]).wrapping_add(1);
        reply[0..2].copy_from_slice(&wrong.to_be_bytes());
        Some(reply)
    })
    .await;
    let client: DnsClient = DnsClient::new(client_config(server));

    assert!(client.query("spoofed.example", DnsRecordType::A).await.is_empty());
}

#[tokio::test]
async fn enumerate_keeps_only_answered_types() {
    let server: SocketAddr = udp_server(|request| {
        let answers: Vec<(u16, Vec<u8>)> = match query_type(request) {
            1 => vec![rr(1, &[192, 0, 2, 1])],
            15 => vec![(15, mx_rdata(5, "mx.example.org"))],
            16 => vec![rr(16, b"\x0bhello world")],
            _ => Vec::new(),
        };
        Some(answer(request, &answers))
    })
    .await;
    let client: DnsClient = DnsClient::new(client_config(server));

    let found: BTreeMap<DnsRecordType, Vec<DnsRecord>> = client.enumerate("example.org").await;
    let types: Vec<DnsRecordType> = found.keys().copied().collect();
    assert_eq!(types, vec![DnsRecordType::A, DnsRecordType::MX, DnsRecordType::TXT]);
    assert_eq!(found[&DnsRecordType::A][0].data(), "192.0.2.1");
    assert!(found[&DnsRecordType::TXT][0].data().ends_with("hello world"));
}

#[tokio::test]
async fn zone_transfer_reads_a_framed_reply() {
    let server: SocketAddr = tcp_server(|request| {
        assert_eq!(query_type(request), 252);
        answer(
            request,
            &[
                rr(1, &[192, 0, 2, 10]),
                (2, encode_name("ns1.example.net").unwrap()),
                (15, mx_rdata(20, "mx.example.net")),
            ],
        )
    })
    .await;
    let client: DnsClient = DnsClient::new(client_config(server));

    let records: Vec<DnsRecord> = client.zone_transfer("example.net", None).await;
    let types: Vec<DnsRecordType> = records.iter().map(DnsRecord::record_type).collect();
    assert_eq!(types, vec![DnsRecordType::A, DnsRecordType::NS, DnsRecordType::MX]);
    assert_eq!(records[1].data(), "ns1.example.net");
}

#[tokio::test]
async fn zone_transfer_refused_connection_is_empty() {
    let listener: std::net::TcpListener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let closed: SocketAddr = listener.local_addr().unwrap();
    drop(listener);

    let client: DnsClient = DnsClient::new(client_config(closed));
    assert!(client.zone_transfer("example.net", None).await.is_empty());
}

/// Fails the first exchange, then hands over to real UDP.
struct FlakyUdp {
    calls: AtomicUsize,
}

#[async_trait]
impl Exchange for FlakyUdp {
    async fn exchange(&self, request: &[u8], server: SocketAddr, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        match self.calls.fetch_add(1, Ordering::SeqCst) {
            0 => Err(TransportError::Timeout(timeout)),
            _ => UdpExchange.exchange(request, server, timeout).await,
        }
    }
}

#[tokio::test]
async fn custom_transports_plug_into_the_client() {
    let server: SocketAddr = udp_server(|request| Some(answer(request, &[rr(1, &[198, 51, 100, 1])]))).await;
    let flaky: FlakyUdp = FlakyUdp {
        calls: AtomicUsize::new(0),
    };
    let client: DnsClient<FlakyUdp, TcpExchange> =
        DnsClient::with_transports(client_config(server), flaky, TcpExchange);

    let ips: Vec<Ipv4Addr> = client.resolve("flaky.example").await;
    assert_eq!(ips, vec![Ipv4Addr::new(198, 51, 100, 1)]);
}
