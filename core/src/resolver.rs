//! DNS client built on the `phantom-protocols` codec.
//!
//! Lookups never fail loudly: every problem is logged and surfaces as an
//! empty record list, so callers can treat "no answer" and "no server" alike.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use phantom_common::config::DnsConfig;
use phantom_protocols::dns::{self, DnsQuery, DnsRecord, DnsRecordType, ParseOutcome};
use tracing::{debug, error, info, warn};

use crate::error::TransportError;
use crate::network::exchange::{Exchange, TcpExchange, UdpExchange};

/// Record types queried by [`DnsClient::enumerate`], in that order.
pub const ENUMERATION_TYPES: [DnsRecordType; 7] = [
    DnsRecordType::A,
    DnsRecordType::AAAA,
    DnsRecordType::CNAME,
    DnsRecordType::MX,
    DnsRecordType::NS,
    DnsRecordType::TXT,
    DnsRecordType::SOA,
];

/// Queries go over `datagram`; zone transfers over `stream`.
pub struct DnsClient<D = UdpExchange, S = TcpExchange> {
    config: DnsConfig,
    datagram: D,
    stream: S,
}

impl DnsClient {
    pub fn new(config: DnsConfig) -> Self {
        Self::with_transports(config, UdpExchange, TcpExchange)
    }
}

impl Default for DnsClient {
    fn default() -> Self {
        Self::new(DnsConfig::default())
    }
}

impl<D: Exchange, S: Exchange> DnsClient<D, S> {
    pub fn with_transports(config: DnsConfig, datagram: D, stream: S) -> Self {
        Self {
            config,
            datagram,
            stream,
        }
    }

    pub fn config(&self) -> &DnsConfig {
        &self.config
    }

    /// Sends one query, retrying on timeouts, transport errors, unparsable
    /// replies and replies to some other query.
    pub async fn query(&self, domain: &str, record_type: DnsRecordType) -> Vec<DnsRecord> {
        info!("Querying {record_type} records for {domain}");

        let query: DnsQuery = DnsQuery::with_random_id(domain, record_type, &mut rand::rng());
        let request: Vec<u8> = match query.to_bytes() {
            Ok(request) => request,
            Err(e) => {
                error!("Cannot query {domain}: {e}");
                return Vec::new();
            }
        };

        let server: SocketAddr = SocketAddr::new(self.config.server, self.config.port);
        let attempts: u32 = self.config.retries.max(1);

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.config.retry_delay).await;
            }

            match self.datagram.exchange(&request, server, self.config.timeout).await {
                Ok(reply) => match accept_reply(&reply, query.transaction_id) {
                    Some(records) => {
                        info!("Received {} records", records.len());
                        return records;
                    }
                    None => continue,
                },
                Err(TransportError::Timeout(_)) => {
                    warn!("DNS query timeout (attempt {attempt}/{attempts})");
                }
                Err(e) => {
                    error!("DNS query error (attempt {attempt}/{attempts}): {e}");
                }
            }
        }

        error!("DNS query for {domain} failed after {attempts} attempts");
        Vec::new()
    }

    /// IPv4 addresses from the A records of `domain`.
    pub async fn resolve(&self, domain: &str) -> Vec<Ipv4Addr> {
        self.query(domain, DnsRecordType::A)
            .await
            .iter()
            .filter_map(|record| record.data().parse::<Ipv4Addr>().ok())
            .collect()
    }

    pub async fn mx_records(&self, domain: &str) -> Vec<DnsRecord> {
        self.query(domain, DnsRecordType::MX).await
    }

    pub async fn txt_records(&self, domain: &str) -> Vec<DnsRecord> {
        self.query(domain, DnsRecordType::TXT).await
    }

    pub async fn ns_records(&self, domain: &str) -> Vec<DnsRecord> {
        self.query(domain, DnsRecordType::NS).await
    }

    /// Requests an AXFR from `nameserver` (the configured server if `None`).
    ///
    /// Only the first message of the transfer is read. Most servers refuse
    /// transfers to strangers; that shows up as an empty list.
    pub async fn zone_transfer(&self, domain: &str, nameserver: Option<IpAddr>) -> Vec<DnsRecord> {
        let server: SocketAddr = SocketAddr::new(nameserver.unwrap_or(self.config.server), self.config.port);
        warn!("Attempting zone transfer for {domain} from {server}");

        let query: DnsQuery = DnsQuery::with_random_id(domain, DnsRecordType::AXFR, &mut rand::rng());
        let request: Vec<u8> = match query.to_bytes() {
            Ok(request) => request,
            Err(e) => {
                error!("Cannot request a zone transfer for {domain}: {e}");
                return Vec::new();
            }
        };

        match self.stream.exchange(&request, server, self.config.timeout).await {
            Ok(reply) => match accept_reply(&reply, query.transaction_id) {
                Some(records) => {
                    info!("Zone transfer returned {} records", records.len());
                    records
                }
                None => Vec::new(),
            },
            Err(e) => {
                warn!("Zone transfer failed: {e}");
                Vec::new()
            }
        }
    }

    /// Queries every type in [`ENUMERATION_TYPES`], keeping the non-empty ones.
    pub async fn enumerate(&self, domain: &str) -> BTreeMap<DnsRecordType, Vec<DnsRecord>> {
        info!("Starting DNS enumeration for {domain}");
        let mut results: BTreeMap<DnsRecordType, Vec<DnsRecord>> = BTreeMap::new();

        for record_type in ENUMERATION_TYPES {
            let records: Vec<DnsRecord> = self.query(domain, record_type).await;
            if !records.is_empty() {
                results.insert(record_type, records);
            }
        }

        info!("DNS enumeration found {} record types", results.len());
        results
    }
}

/// Parses `reply`, returning `None` if it is unusable or answers a
/// different transaction.
fn accept_reply(reply: &[u8], transaction_id: u16) -> Option<Vec<DnsRecord>> {
    let outcome: ParseOutcome = match dns::parse_message(reply) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Discarding unparsable DNS reply: {e}");
            return None;
        }
    };

    if outcome.header.id != transaction_id {
        warn!(
            "Discarding DNS reply with id {:#06x}, expected {:#06x}",
            outcome.header.id, transaction_id
        );
        return None;
    }
    if outcome.header.rcode() != 0 {
        debug!("DNS server answered with rcode {}", outcome.header.rcode());
    }
    if outcome.truncated {
        warn!(
            "DNS reply truncated: kept {} of {} answers",
            outcome.records.len(),
            outcome.header.answer_count
        );
    }
    Some(outcome.records)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
