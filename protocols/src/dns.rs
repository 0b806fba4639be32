//! DNS query construction and response parsing.
//!
//! Queries carry a single question with recursion desired. Responses are
//! parsed best-effort: a record cut off by the end of the buffer ends parsing
//! and the records read so far are returned, flagged through
//! [`ParseOutcome::truncated`].

pub mod name;

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use rand::Rng;
use tracing::{debug, trace};

use crate::error::{ProtocolError, Result};

pub use name::{decode_name, encode_name};

pub const DNS_HDR_LEN: usize = 12;
pub const STANDARD_QUERY_FLAGS: u16 = 0x0100;

const QUESTION_FIXED_LEN: usize = 4;
const RR_FIXED_LEN: usize = 10;
const MX_PREFERENCE_LEN: usize = 2;

/// Resource record types understood by the codec, with their wire codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u16)]
pub enum DnsRecordType {
    A = 1,
    NS = 2,
    CNAME = 5,
    SOA = 6,
    PTR = 12,
    MX = 15,
    TXT = 16,
    AAAA = 28,
    SRV = 33,
    /// Zone transfer; only meaningful as a query type.
    AXFR = 252,
}

impl DnsRecordType {
    pub const ALL: [DnsRecordType; 10] = [
        Self::A,
        Self::NS,
        Self::CNAME,
        Self::SOA,
        Self::PTR,
        Self::MX,
        Self::TXT,
        Self::AAAA,
        Self::SRV,
        Self::AXFR,
    ];

    pub const fn code(self) -> u16 {
        self as u16
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::NS => "NS",
            Self::CNAME => "CNAME",
            Self::SOA => "SOA",
            Self::PTR => "PTR",
            Self::MX => "MX",
            Self::TXT => "TXT",
            Self::AAAA => "AAAA",
            Self::SRV => "SRV",
            Self::AXFR => "AXFR",
        }
    }
}

impl TryFrom<u16> for DnsRecordType {
    type Error = u16;

    fn try_from(code: u16) -> std::result::Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|record_type| record_type.code() == code)
            .ok_or(code)
    }
}

impl FromStr for DnsRecordType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let upper: String = s.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|record_type| record_type.mnemonic() == upper)
            .ok_or_else(|| format!("unknown record type: {s}"))
    }
}

impl fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum DnsQueryClass {
    IN = 1,
}

impl DnsQueryClass {
    pub const fn code(self) -> u16 {
        self as u16
    }
}

/// A decoded answer record.
///
/// Only produced by [`parse_message`] / [`parse_response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    name: String,
    record_type: DnsRecordType,
    ttl: u32,
    data: String,
    priority: Option<u16>,
}

impl DnsRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn record_type(&self) -> DnsRecordType {
        self.record_type
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    /// Textual RDATA: an address, a host name, or TXT content.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// MX preference; `None` for every other type.
    pub fn priority(&self) -> Option<u16> {
        self.priority
    }
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} ", self.name, self.ttl, self.record_type)?;
        if let Some(priority) = self.priority {
            write!(f, "{priority} ")?;
        }
        f.write_str(&self.data)
    }
}

/// The fixed 12-byte message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DnsHeader {
    pub id: u16,
    pub flags: u16,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
}

impl DnsHeader {
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < DNS_HDR_LEN {
            return Err(ProtocolError::malformed(format!(
                "DNS message is {} bytes, header needs {DNS_HDR_LEN}",
                buf.len()
            )));
        }
        let word = |at: usize| u16::from_be_bytes([buf[at], buf[at + 1]]);
        Ok(Self {
            id: word(0),
            flags: word(2),
            question_count: word(4),
            answer_count: word(6),
            authority_count: word(8),
            additional_count: word(10),
        })
    }

    pub fn is_response(&self) -> bool {
        self.flags & 0x8000 != 0
    }

    pub fn rcode(&self) -> u8 {
        (self.flags & 0x000F) as u8
    }

    fn write(&self, buffer: &mut Vec<u8>) {
        for field in [
            self.id,
            self.flags,
            self.question_count,
            self.answer_count,
            self.authority_count,
            self.additional_count,
        ] {
            buffer.extend_from_slice(&field.to_be_bytes());
        }
    }
}

/// A single-question query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsQuery {
    pub transaction_id: u16,
    pub domain: String,
    pub record_type: DnsRecordType,
}

impl DnsQuery {
    pub fn new(transaction_id: u16, domain: impl Into<String>, record_type: DnsRecordType) -> Self {
        Self {
            transaction_id,
            domain: domain.into(),
            record_type,
        }
    }

    pub fn with_random_id<R: Rng>(
        domain: impl Into<String>,
        record_type: DnsRecordType,
        rng: &mut R,
    ) -> Self {
        Self::new(random_transaction_id(rng), domain, record_type)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let qname: Vec<u8> = encode_name(&self.domain)?;
        let header: DnsHeader = DnsHeader {
            id: self.transaction_id,
            flags: STANDARD_QUERY_FLAGS,
            question_count: 1,
            answer_count: 0,
            authority_count: 0,
            additional_count: 0,
        };

        let mut buffer: Vec<u8> = Vec::with_capacity(DNS_HDR_LEN + qname.len() + QUESTION_FIXED_LEN);
        header.write(&mut buffer);
        buffer.extend_from_slice(&qname);
        buffer.extend_from_slice(&self.record_type.code().to_be_bytes());
        buffer.extend_from_slice(&DnsQueryClass::IN.code().to_be_bytes());
        Ok(buffer)
    }
}

/// Draws a transaction id uniformly from `1..65535`.
pub fn random_transaction_id<R: Rng>(rng: &mut R) -> u16 {
    rng.random_range(1..u16::MAX)
}

pub fn build_query(
    domain: &str,
    record_type: DnsRecordType,
    transaction_id: Option<u16>,
) -> Result<Vec<u8>> {
    build_query_with_rng(domain, record_type, transaction_id, &mut rand::rng())
}

pub fn build_query_with_rng<R: Rng>(
    domain: &str,
    record_type: DnsRecordType,
    transaction_id: Option<u16>,
    rng: &mut R,
) -> Result<Vec<u8>> {
    let id: u16 = transaction_id.unwrap_or_else(|| random_transaction_id(rng));
    DnsQuery::new(id, domain, record_type).to_bytes()
}

/// Result of parsing a response message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub header: DnsHeader,
    pub records: Vec<DnsRecord>,
    /// Set when the message ended before every announced answer was read.
    pub truncated: bool,
}

/// Parses the header and answer section of a response.
///
/// Fails only on a short header or a malformed name. Unsupported record
/// types are skipped; a record running past the end of `buf` stops parsing.
pub fn parse_message(buf: &[u8]) -> Result<ParseOutcome> {
    let header: DnsHeader = DnsHeader::parse(buf)?;
    let mut records: Vec<DnsRecord> = Vec::new();

    let truncated: bool = match parse_sections(buf, &header, &mut records) {
        Ok(()) => false,
        Err(ProtocolError::Truncated { offset }) => {
            debug!(
                offset,
                parsed = records.len(),
                announced = header.answer_count,
                "DNS response truncated"
            );
            true
        }
        Err(e) => return Err(e),
    };

    Ok(ParseOutcome {
        header,
        records,
        truncated,
    })
}

/// Parses a response into its supported answer records.
pub fn parse_response(buf: &[u8]) -> Result<Vec<DnsRecord>> {
    parse_message(buf).map(|outcome| outcome.records)
}

fn parse_sections(buf: &[u8], header: &DnsHeader, records: &mut Vec<DnsRecord>) -> Result<()> {
    let mut cursor: usize = DNS_HDR_LEN;

    for _ in 0..header.question_count {
        let (_, next) = decode_name(buf, cursor)?;
        cursor = next + QUESTION_FIXED_LEN;
        if cursor > buf.len() {
            return Err(ProtocolError::Truncated { offset: next });
        }
    }

    for _ in 0..header.answer_count {
        let (owner, next) = decode_name(buf, cursor)?;
        let fixed: &[u8] = buf
            .get(next..next + RR_FIXED_LEN)
            .ok_or(ProtocolError::Truncated { offset: next })?;

        let rtype: u16 = u16::from_be_bytes([fixed[0], fixed[1]]);
        let ttl: u32 = u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let rdlength: usize = u16::from_be_bytes([fixed[8], fixed[9]]) as usize;

        let rdata_start: usize = next + RR_FIXED_LEN;
        let rdata: &[u8] = buf
            .get(rdata_start..rdata_start + rdlength)
            .ok_or(ProtocolError::Truncated { offset: rdata_start })?;
        cursor = rdata_start + rdlength;

        if let Some(record) = decode_record(buf, owner, rtype, ttl, rdata_start, rdata)? {
            records.push(record);
        }
    }

    Ok(())
}

fn decode_record(
    buf: &[u8],
    name: String,
    rtype: u16,
    ttl: u32,
    rdata_start: usize,
    rdata: &[u8],
) -> Result<Option<DnsRecord>> {
    let Ok(record_type) = DnsRecordType::try_from(rtype) else {
        trace!(rtype, "skipping record of unknown type");
        return Ok(None);
    };

    let (data, priority): (String, Option<u16>) = match record_type {
        DnsRecordType::A => match <[u8; 4]>::try_from(rdata) {
            Ok(octets) => (Ipv4Addr::from(octets).to_string(), None),
            Err(_) => return Ok(None),
        },
        DnsRecordType::AAAA => match <[u8; 16]>::try_from(rdata) {
            Ok(octets) => (Ipv6Addr::from(octets).to_string(), None),
            Err(_) => return Ok(None),
        },
        DnsRecordType::CNAME | DnsRecordType::NS => (decode_name(buf, rdata_start)?.0, None),
        DnsRecordType::MX => {
            if rdata.len() < MX_PREFERENCE_LEN {
                return Ok(None);
            }
            let preference: u16 = u16::from_be_bytes([rdata[0], rdata[1]]);
            let (exchange, _) = decode_name(buf, rdata_start + MX_PREFERENCE_LEN)?;
            (exchange, Some(preference))
        }
        DnsRecordType::TXT => (String::from_utf8_lossy(rdata).into_owned(), None),
        other => {
            trace!(%other, "skipping record without a decoder");
            return Ok(None);
        }
    };

    Ok(Some(DnsRecord {
        name,
        record_type,
        ttl,
        data,
        priority,
    }))
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
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Response header + one question for `example.com`, answers appended by callers.
    fn response_prefix(answer_count: u16) -> Vec<u8> {
        let mut buf: Vec<u8> = Vec::new();
        DnsHeader {
            id: 0xBEEF,
            flags: 0x8180,
            question_count: 1,
            answer_count,
            authority_count: 0,
            additional_count: 0,
        }
        .write(&mut buf);
        buf.extend_from_slice(&encode_name("example.com").unwrap());
        buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        buf
    }

    /// Appends an answer whose owner is a pointer to the question name at offset 12.
    fn push_answer(buf: &mut Vec<u8>, rtype: u16, ttl: u32, rdata: &[u8]) {
        buf.extend_from_slice(&[0xC0, 0x0C]);
        buf.extend_from_slice(&rtype.to_be_bytes());
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&ttl.to_be_bytes());
        buf.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
        buf.extend_from_slice(rdata);
    }

    #[test]
    fn query_shape() {
        let query: Vec<u8> = build_query("example.com", DnsRecordType::A, Some(0x1234)).unwrap();
        assert_eq!(&query[0..2], &[0x12, 0x34]);
        assert_eq!(&query[2..4], &[0x01, 0x00]);
        assert_eq!(&query[4..6], &[0x00, 0x01]);
        assert_eq!(&query[6..12], &[0u8; 6]);

        let mut question: Vec<u8> = encode_name("example.com").unwrap();
        question.extend_from_slice(&[0x00, 0x01, 0x00, 0x01]);
        assert_eq!(&query[12..], question.as_slice());
    }

    #[test]
    fn query_uses_record_type_code() {
        let query: Vec<u8> = build_query("example.com", DnsRecordType::AXFR, Some(7)).unwrap();
        let qtype: &[u8] = &query[query.len() - 4..query.len() - 2];
        assert_eq!(qtype, &252u16.to_be_bytes());
    }

    #[test]
    fn random_transaction_id_is_deterministic_with_seeded_rng() {
        let mut first: StdRng = StdRng::seed_from_u64(42);
        let mut second: StdRng = StdRng::seed_from_u64(42);
        let a: Vec<u8> = build_query_with_rng("example.com", DnsRecordType::MX, None, &mut first).unwrap();
        let b: Vec<u8> = build_query_with_rng("example.com", DnsRecordType::MX, None, &mut second).unwrap();
        assert_eq!(a, b);
        let id: u16 = u16::from_be_bytes([a[0], a[1]]);
        assert!(id >= 1 && id < u16::MAX);
    }

    #[test]
    fn query_rejects_invalid_name() {
        let domain: String = format!("{}.com", "x".repeat(64));
        assert!(build_query(&domain, DnsRecordType::A, Some(1)).is_err());
    }

    #[test]
    fn short_buffer_is_malformed() {
        let result = parse_response(&[0u8; 11]);
        assert!(matches!(result, Err(ProtocolError::MalformedPacket(_))));
    }

    #[test]
    fn a_record_parse() {
        let mut buf: Vec<u8> = response_prefix(1);
        push_answer(&mut buf, 1, 60, &[8, 8, 8, 8]);

        let records: Vec<DnsRecord> = parse_response(&buf).unwrap();
        assert_eq!(records.len(), 1);
        let record: &DnsRecord = &records[0];
        assert_eq!(record.name(), "example.com");
        assert_eq!(record.record_type(), DnsRecordType::A);
        assert_eq!(record.ttl(), 60);
        assert_eq!(record.data(), "8.8.8.8");
        assert_eq!(record.priority(), None);
    }

    #[test]
    fn aaaa_record_parse() {
        let mut buf: Vec<u8> = response_prefix(1);
        let addr: Ipv6Addr = "2001:db8::1".parse().unwrap();
        push_answer(&mut buf, 28, 300, &addr.octets());

        let records: Vec<DnsRecord> = parse_response(&buf).unwrap();
        assert_eq!(records[0].data(), "2001:db8::1");
    }

    #[test]
    fn mx_priority() {
        let mut buf: Vec<u8> = response_prefix(1);
        let mut rdata: Vec<u8> = vec![0x00, 0x0A];
        rdata.extend_from_slice(&encode_name("mail.example.com").unwrap());
        push_answer(&mut buf, 15, 3600, &rdata);

        let records: Vec<DnsRecord> = parse_response(&buf).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].record_type(), DnsRecordType::MX);
        assert_eq!(records[0].priority(), Some(10));
        assert_eq!(records[0].data(), "mail.example.com");
    }

    #[test]
    fn cname_with_compressed_rdata() {
        let mut buf: Vec<u8> = response_prefix(1);
        // "www" followed by a pointer back to the question name.
        push_answer(&mut buf, 5, 120, b"\x03www\xC0\x0C");

        let records: Vec<DnsRecord> = parse_response(&buf).unwrap();
        assert_eq!(records[0].record_type(), DnsRecordType::CNAME);
        assert_eq!(records[0].data(), "www.example.com");
    }

    #[test]
    fn ns_record_parse() {
        let mut buf: Vec<u8> = response_prefix(1);
        push_answer(&mut buf, 2, 86400, &encode_name("ns1.example.net").unwrap());
        let records: Vec<DnsRecord> = parse_response(&buf).unwrap();
        assert_eq!(records[0].record_type(), DnsRecordType::NS);
        assert_eq!(records[0].data(), "ns1.example.net");
    }

    #[test]
    fn txt_is_kept_verbatim_and_lossy() {
        let mut buf: Vec<u8> = response_prefix(1);
        push_answer(&mut buf, 16, 30, b"\x05hi\xFFyo");

        let records: Vec<DnsRecord> = parse_response(&buf).unwrap();
        assert_eq!(records[0].data(), "\u{5}hi\u{FFFD}yo");
    }

    #[test]
    fn unsupported_types_are_skipped_without_losing_position() {
        let mut buf: Vec<u8> = response_prefix(3);
        push_answer(&mut buf, 6, 10, &[0xAB; 22]);
        push_answer(&mut buf, 99, 10, &[0xCD; 5]);
        push_answer(&mut buf, 1, 10, &[10, 0, 0, 1]);

        let outcome: ParseOutcome = parse_message(&buf).unwrap();
        assert!(!outcome.truncated);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].data(), "10.0.0.1");
    }

    #[test]
    fn wrong_length_address_is_skipped() {
        let mut buf: Vec<u8> = response_prefix(2);
        push_answer(&mut buf, 1, 10, &[1, 2, 3]);
        push_answer(&mut buf, 1, 10, &[1, 2, 3, 4]);

        let records: Vec<DnsRecord> = parse_response(&buf).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data(), "1.2.3.4");
    }

    #[test]
    fn truncation_tolerance() {
        let mut buf: Vec<u8> = response_prefix(2);
        push_answer(&mut buf, 1, 60, &[8, 8, 8, 8]);

        let outcome: ParseOutcome = parse_message(&buf).unwrap();
        assert!(outcome.truncated);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(parse_response(&buf).unwrap().len(), 1);
    }

    #[test]
    fn rdata_past_end_stops_parsing() {
        let mut buf: Vec<u8> = response_prefix(2);
        push_answer(&mut buf, 1, 60, &[8, 8, 4, 4]);
        push_answer(&mut buf, 1, 60, &[1, 1, 1, 1]);
        buf.truncate(buf.len() - 2);

        let outcome: ParseOutcome = parse_message(&buf).unwrap();
        assert!(outcome.truncated);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].data(), "8.8.4.4");
    }

    #[test]
    fn pointer_loop_in_answer_fails_closed() {
        let mut buf: Vec<u8> = response_prefix(1);
        let loop_at: u16 = buf.len() as u16;
        buf.extend_from_slice(&(0xC000 | loop_at).to_be_bytes());
        buf.extend_from_slice(&[0u8; 10]);

        assert!(matches!(parse_message(&buf), Err(ProtocolError::MalformedPacket(_))));
    }

    #[test]
    fn header_fields_are_exposed() {
        let buf: Vec<u8> = response_prefix(0);
        let outcome: ParseOutcome = parse_message(&buf).unwrap();
        assert_eq!(outcome.header.id, 0xBEEF);
        assert!(outcome.header.is_response());
        assert_eq!(outcome.header.rcode(), 0);
        assert!(outcome.records.is_empty());
    }

    #[test]
    fn record_type_conversions() {
        assert_eq!(DnsRecordType::try_from(28), Ok(DnsRecordType::AAAA));
        assert_eq!(DnsRecordType::try_from(999), Err(999));
        assert_eq!("mx".parse::<DnsRecordType>(), Ok(DnsRecordType::MX));
        assert!("bogus".parse::<DnsRecordType>().is_err());
        assert_eq!(DnsRecordType::SRV.to_string(), "SRV");
    }

    #[test]
    fn query_header_flags_read_back_with_dns_parser() {
        let bytes: Vec<u8> = build_query("example.com", DnsRecordType::TXT, Some(0x1234)).unwrap();
        let packet: dns_parser::Packet = dns_parser::Packet::parse(&bytes).unwrap();
        assert_eq!(packet.header.id, 0x1234);
        assert!(packet.header.recursion_desired);
        assert_eq!(packet.questions[0].qtype, dns_parser::QueryType::TXT);
    }
}
