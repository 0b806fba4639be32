use std::net::Ipv4Addr;

use phantom_core::craft;
use phantom_protocols::checksum;
use phantom_protocols::packet::{PacketConfig, Protocol, build_packet, tcp::FLAG_SYN};
use pnet::packet::Packet;
use pnet::packet::icmp::IcmpPacket;
use pnet::packet::tcp::{self, TcpPacket};
use pnet::packet::udp::UdpPacket;
use pnet::util;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_payload(rng: &mut StdRng) -> Vec<u8> {
    let len: usize = rng.random_range(0..600);
    (0..len).map(|_| rng.random()).collect()
}

#[test]
fn tcp_checksums_agree_with_pnet_for_random_segments() {
    let mut rng: StdRng = StdRng::seed_from_u64(0x5EED);
    let source: Ipv4Addr = Ipv4Addr::new(172, 16, 4, 2);
    let dest: Ipv4Addr = Ipv4Addr::new(203, 0, 113, 77);

    for _ in 0..64 {
        let payload: Vec<u8> = random_payload(&mut rng);
        let config: PacketConfig = PacketConfig::builder()
            .source_ip(source.to_string())
            .dest_ip(dest.to_string())
            .dest_port(rng.random_range(1..=65535u32))
            .flags(rng.random_range(0..0x200u16))
            .payload(payload.clone())
            .build()
            .unwrap();

        let segment: Vec<u8> = build_packet(&config).unwrap();
        let view: TcpPacket = TcpPacket::new(&segment).unwrap();
        assert_eq!(view.get_checksum(), tcp::ipv4_checksum(&view, &source, &dest));
        assert_eq!(view.payload(), &payload[..]);
    }
}

#[test]
fn internet_checksum_agrees_with_pnet_util() {
    let mut rng: StdRng = StdRng::seed_from_u64(42);
    for _ in 0..64 {
        let mut data: Vec<u8> = random_payload(&mut rng);
        if data.len() % 2 == 1 {
            data.push(0);
        }
        // pnet leaves out one word; make it a trailing zero word
        let skip: usize = data.len() / 2;
        data.extend_from_slice(&[0, 0]);
        assert_eq!(checksum(&data), util::checksum(&data, skip));
    }
}

#[test]
fn udp_datagram_reads_back_through_pnet() {
    let config: PacketConfig = PacketConfig::builder()
        .dest_ip("198.51.100.53")
        .dest_port(53)
        .source_port(33333)
        .protocol(Protocol::Udp)
        .payload(b"\x12\x34 not really dns".to_vec())
        .build()
        .unwrap();

    let datagram: Vec<u8> = build_packet(&config).unwrap();
    let view: UdpPacket = UdpPacket::new(&datagram).unwrap();
    assert_eq!(view.get_source(), 33333);
    assert_eq!(view.get_destination(), 53);
    assert_eq!(view.get_length() as usize, datagram.len());
    assert_eq!(view.payload(), b"\x12\x34 not really dns");
}

#[test]
fn icmp_echo_checksum_agrees_with_pnet() {
    let mut rng: StdRng = StdRng::seed_from_u64(7);
    for _ in 0..32 {
        let config: PacketConfig = PacketConfig::builder()
            .dest_ip("192.0.2.1")
            .protocol(Protocol::Icmp)
            .payload(random_payload(&mut rng))
            .build()
            .unwrap();

        let message: Vec<u8> = build_packet(&config).unwrap();
        let view: IcmpPacket = IcmpPacket::new(&message).unwrap();
        assert_eq!(view.get_checksum(), pnet::packet::icmp::checksum(&view));
        assert_eq!(checksum(&message), 0);
    }
}

#[test]
fn crafted_tcp_to_loopback_uses_a_loopback_source() {
    let config: PacketConfig = PacketConfig::builder()
        .dest_ip("127.0.0.1")
        .dest_port(8080)
        .flags(FLAG_SYN)
        .build()
        .unwrap();

    let segment: Vec<u8> = craft::craft(&config).unwrap();
    let view: TcpPacket = TcpPacket::new(&segment).unwrap();
    let loopback: Ipv4Addr = Ipv4Addr::LOCALHOST;
    assert_eq!(view.get_checksum(), tcp::ipv4_checksum(&view, &loopback, &loopback));
    assert_eq!(view.get_destination(), 8080);
}
