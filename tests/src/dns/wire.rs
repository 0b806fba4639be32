use dns_parser::{Packet, QueryClass, QueryType};
use phantom_protocols::dns::{DnsQuery, DnsRecordType, build_query, build_query_with_rng, parse_response};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn expected_qtype(record_type: DnsRecordType) -> QueryType {
    match record_type {
        DnsRecordType::A => QueryType::A,
        DnsRecordType::NS => QueryType::NS,
        DnsRecordType::CNAME => QueryType::CNAME,
        DnsRecordType::SOA => QueryType::SOA,
        DnsRecordType::PTR => QueryType::PTR,
        DnsRecordType::MX => QueryType::MX,
        DnsRecordType::TXT => QueryType::TXT,
        DnsRecordType::AAAA => QueryType::AAAA,
        DnsRecordType::SRV => QueryType::SRV,
        DnsRecordType::AXFR => QueryType::AXFR,
    }
}

#[test]
fn queries_decode_with_an_independent_parser() {
    for record_type in DnsRecordType::ALL {
        let bytes: Vec<u8> = build_query("mail.example.co.uk", record_type, Some(0xBEEF)).unwrap();
        let packet: Packet = Packet::parse(&bytes).unwrap();

        assert_eq!(packet.header.id, 0xBEEF);
        assert!(packet.header.query);
        assert!(packet.header.recursion_desired);
        assert_eq!(packet.questions.len(), 1);
        assert!(packet.answers.is_empty());

        let question = &packet.questions[0];
        assert_eq!(question.qname.to_string(), "mail.example.co.uk");
        assert_eq!(question.qtype, expected_qtype(record_type));
        assert_eq!(question.qclass, QueryClass::IN);
    }
}

#[test]
fn trailing_dot_is_not_an_extra_label() -> anyhow::Result<()> {
    let bytes: Vec<u8> = build_query("example.com.", DnsRecordType::A, Some(1))?;
    let packet: Packet = Packet::parse(&bytes)?;
    assert_eq!(packet.questions[0].qname.to_string(), "example.com");
    Ok(())
}

#[test]
fn random_ids_follow_the_seed() {
    let a: Vec<u8> = build_query_with_rng("example.com", DnsRecordType::A, None, &mut StdRng::seed_from_u64(99)).unwrap();
    let b: Vec<u8> = build_query_with_rng("example.com", DnsRecordType::A, None, &mut StdRng::seed_from_u64(99)).unwrap();
    assert_eq!(a, b);

    let query: DnsQuery = DnsQuery::with_random_id("example.com", DnsRecordType::A, &mut StdRng::seed_from_u64(99));
    assert_eq!(Packet::parse(&a).unwrap().header.id, query.transaction_id);
}

#[test]
fn a_query_parses_as_a_response_without_answers() {
    let bytes: Vec<u8> = build_query("example.com", DnsRecordType::MX, Some(7)).unwrap();
    assert!(parse_response(&bytes).unwrap().is_empty());
}
