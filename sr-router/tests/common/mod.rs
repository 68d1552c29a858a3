//! Fixtures shared by the integration tests: a two-port router, hand-built frames to
//! feed it, and helpers to read back what it sent.
//!
//! eth0 (10.0.0.1) faces 10.0.0.0/24 and reaches 10.0.1.0/24 through the gateway
//! 10.0.0.2. eth1 (192.168.1.1) faces 192.168.1.0/24.

#![allow(dead_code)]

use crossbeam::crossbeam_channel::Receiver;
use sr_packets::{
    ArpFrame, ArpOp, EthernetFrame, IcmpPacket, IcmpType, IpProtocol, Ipv4Packet, MacAddr,
};
use sr_router::{
    ChannelTransmitter, Interface, InterfaceTable, Router, RouterConfig, RoutingTable,
    Transmission,
};
use std::convert::TryFrom;
use std::net::Ipv4Addr;

pub const ETH0_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 1);
pub const ETH0_MAC: MacAddr = MacAddr {
    bytes: [0x02, 0, 0, 0, 0, 0x01],
};
pub const ETH1_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 1);
pub const ETH1_MAC: MacAddr = MacAddr {
    bytes: [0x02, 0, 0, 0, 0, 0x02],
};

pub const GATEWAY: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 2);
pub const GATEWAY_MAC: MacAddr = MacAddr {
    bytes: [0x0a, 0, 0, 0, 0, 0x02],
};
/// A host on the eth0 network.
pub const HOST_A: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 100);
pub const HOST_A_MAC: MacAddr = MacAddr {
    bytes: [0x0a, 0, 0, 0, 0, 0x64],
};
/// A host on the eth1 network.
pub const HOST_B: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 100);
pub const HOST_B_MAC: MacAddr = MacAddr {
    bytes: [0x0b, 0, 0, 0, 0, 0x64],
};

pub const TEST_ROUTES: &str = "\
# destination  gateway   mask           interface
10.0.0.0       0.0.0.0   255.255.255.0  eth0
10.0.1.0       10.0.0.2  255.255.255.0  eth0
192.168.1.0    0.0.0.0   255.255.255.0  eth1
";

pub fn test_interfaces() -> InterfaceTable {
    InterfaceTable::new(vec![
        Interface::new("eth0", ETH0_IP, ETH0_MAC),
        Interface::new("eth1", ETH1_IP, ETH1_MAC),
    ])
    .unwrap()
}

pub fn test_routes() -> RoutingTable {
    TEST_ROUTES.parse().unwrap()
}

pub fn test_router() -> (Router<ChannelTransmitter>, Receiver<Transmission>) {
    test_router_with(RouterConfig::default())
}

pub fn test_router_with(
    config: RouterConfig,
) -> (Router<ChannelTransmitter>, Receiver<Transmission>) {
    let (transmitter, receiver) = ChannelTransmitter::new();
    let router = Router::new(config, test_interfaces(), test_routes(), transmitter).unwrap();
    (router, receiver)
}

/// An IPv4 frame as it would arrive on eth0, with a valid header checksum.
pub fn ipv4_frame(
    src: Ipv4Addr,
    dest: Ipv4Addr,
    ttl: u8,
    protocol: IpProtocol,
    payload: &[u8],
) -> Vec<u8> {
    let mut packet = Ipv4Packet::empty();
    packet.set_src_addr(src);
    packet.set_dest_addr(dest);
    packet.set_ttl(ttl);
    packet.set_protocol(protocol);
    packet.set_payload(payload);
    packet.set_checksum();

    let mut frame = EthernetFrame::encap_ipv4(packet);
    frame.set_dest_mac(ETH0_MAC);
    frame.set_src_mac(HOST_A_MAC);
    frame.data
}

/// UDP datagram from port 5000 to port 53. The UDP checksum is left at zero.
pub fn udp_frame(src: Ipv4Addr, dest: Ipv4Addr, ttl: u8, payload: &[u8]) -> Vec<u8> {
    let udp_len = (8 + payload.len()) as u16;
    let mut udp = Vec::with_capacity(udp_len as usize);
    udp.extend_from_slice(&5000u16.to_be_bytes());
    udp.extend_from_slice(&53u16.to_be_bytes());
    udp.extend_from_slice(&udp_len.to_be_bytes());
    udp.extend_from_slice(&[0, 0]);
    udp.extend_from_slice(payload);
    ipv4_frame(src, dest, ttl, IpProtocol::UDP, &udp)
}

/// Echo request with identifier 0x4242 and the given sequence number.
pub fn echo_request_frame(
    src: Ipv4Addr,
    dest: Ipv4Addr,
    ttl: u8,
    sequence: u16,
    payload: &[u8],
) -> Vec<u8> {
    let mut icmp = IcmpPacket::empty();
    icmp.set_icmp_type(IcmpType::EchoRequest);
    let sequence = sequence.to_be_bytes();
    icmp.set_rest_of_header([0x42, 0x42, sequence[0], sequence[1]]);
    icmp.set_payload(payload);
    icmp.set_checksum();
    ipv4_frame(
        src,
        dest,
        ttl,
        IpProtocol::ICMP,
        &icmp.data[icmp.layer4_offset..],
    )
}

/// Broadcast who-has `target_ip`.
pub fn arp_request_frame(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Vec<u8> {
    let mut arp = ArpFrame::ethernet_ipv4(ArpOp::Request);
    arp.set_sender_hardware_addr(sender_mac);
    arp.set_sender_protocol_addr(sender_ip);
    arp.set_target_hardware_addr(MacAddr::default());
    arp.set_target_protocol_addr(target_ip);
    let ethernet = arp.ethernet_mut();
    ethernet.set_dest_mac(MacAddr::BROADCAST);
    ethernet.set_src_mac(sender_mac);
    arp.frame().data
}

/// `sender_ip` is-at `sender_mac`, unicast to `target_mac`.
pub fn arp_reply_frame(
    sender_mac: MacAddr,
    sender_ip: Ipv4Addr,
    target_mac: MacAddr,
    target_ip: Ipv4Addr,
) -> Vec<u8> {
    let mut arp = ArpFrame::ethernet_ipv4(ArpOp::Reply);
    arp.set_sender_hardware_addr(sender_mac);
    arp.set_sender_protocol_addr(sender_ip);
    arp.set_target_hardware_addr(target_mac);
    arp.set_target_protocol_addr(target_ip);
    let ethernet = arp.ethernet_mut();
    ethernet.set_dest_mac(target_mac);
    ethernet.set_src_mac(sender_mac);
    arp.frame().data
}

/// Everything transmitted since the last call, in transmission order. Never blocks.
pub fn collect_transmissions(receiver: &Receiver<Transmission>) -> Vec<Transmission> {
    receiver.try_iter().collect()
}

/// The ICMP message inside a transmitted frame, if it carries one.
pub fn icmp_of(transmission: &Transmission) -> Option<IcmpPacket> {
    let packet = Ipv4Packet::try_from(transmission.frame.clone()).ok()?;
    IcmpPacket::try_from(packet).ok()
}
