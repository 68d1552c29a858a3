mod common;

use common::*;
use sr_packets::{ArpFrame, ArpOp, IcmpPacket, Ipv4Packet, ARP_ETHER_TYPE, IPV4_ETHER_TYPE};
use sr_router::Transmission;
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn ipv4_of(transmission: &Transmission) -> Ipv4Packet {
    Ipv4Packet::try_from(transmission.frame.clone()).unwrap()
}

fn arp_of(transmission: &Transmission) -> ArpFrame {
    ArpFrame::try_from(transmission.frame.clone()).unwrap()
}

#[test]
fn forward_through_gateway_after_arp() {
    init_logging();
    let (router, receiver) = test_router();
    let now = Instant::now();
    let destination = Ipv4Addr::new(10, 0, 1, 5);

    router.deliver_frame_at(udp_frame(HOST_A, destination, 5, b"hello"), "eth0", now);

    // One broadcast request for the gateway, the packet waits
    let sent = collect_transmissions(&receiver);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].interface, "eth0");
    let request = arp_of(&sent[0]);
    assert_eq!(request.opcode(), ArpOp::Request as u16);
    assert_eq!(request.target_ipv4_addr().unwrap(), GATEWAY);
    assert_eq!(request.sender_ipv4_addr().unwrap(), ETH0_IP);
    assert_eq!(request.sender_mac_addr().unwrap(), ETH0_MAC);
    assert!(request.ethernet().dest_mac().is_broadcast());
    assert_eq!(router.cache().queued_frames(GATEWAY), 1);

    router.deliver_frame_at(
        arp_reply_frame(GATEWAY_MAC, GATEWAY, ETH0_MAC, ETH0_IP),
        "eth0",
        now,
    );

    let sent = collect_transmissions(&receiver);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].interface, "eth0");
    assert_eq!(sent[0].frame.dest_mac(), GATEWAY_MAC);
    assert_eq!(sent[0].frame.src_mac(), ETH0_MAC);
    assert_eq!(sent[0].frame.ether_type(), IPV4_ETHER_TYPE);
    let packet = ipv4_of(&sent[0]);
    assert_eq!(packet.ttl(), 4);
    assert!(packet.validate_checksum());
    assert_eq!(packet.src_addr(), HOST_A);
    assert_eq!(packet.dest_addr(), destination);
    assert_eq!(&packet.payload()[8..], b"hello");
    assert_eq!(router.cache().pending_len(), 0);
}

#[test]
fn echo_request_to_router() {
    init_logging();
    let (router, receiver) = test_router();
    let now = Instant::now();
    router.cache().insert(HOST_A_MAC, HOST_A, now);

    router.deliver_frame_at(
        echo_request_frame(HOST_A, ETH0_IP, 64, 1, b"abcdefgh"),
        "eth0",
        now,
    );

    let sent = collect_transmissions(&receiver);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].interface, "eth0");
    assert_eq!(sent[0].frame.dest_mac(), HOST_A_MAC);
    let reply = ipv4_of(&sent[0]);
    assert!(reply.validate_checksum());
    assert_eq!(reply.src_addr(), ETH0_IP);
    assert_eq!(reply.dest_addr(), HOST_A);
    let icmp = IcmpPacket::try_from(reply).unwrap();
    assert!(icmp.validate_checksum());
    assert_eq!((icmp.icmp_type(), icmp.code()), (0, 0));
    assert_eq!(icmp.identifier(), 0x4242);
    assert_eq!(icmp.sequence_number(), 1);
    assert_eq!(&icmp.payload()[..], b"abcdefgh");
}

#[test]
fn echo_to_far_interface_answered_from_it() {
    let (router, receiver) = test_router();
    let now = Instant::now();
    router.cache().insert(HOST_A_MAC, HOST_A, now);

    router.deliver_frame_at(
        echo_request_frame(HOST_A, ETH1_IP, 64, 9, b"far"),
        "eth0",
        now,
    );

    let sent = collect_transmissions(&receiver);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].interface, "eth0");
    let reply = ipv4_of(&sent[0]);
    assert_eq!(reply.src_addr(), ETH1_IP);
    assert_eq!(reply.dest_addr(), HOST_A);
}

#[test]
fn repeated_echo_yields_identical_replies() {
    let (router, receiver) = test_router();
    let now = Instant::now();
    router.cache().insert(HOST_A_MAC, HOST_A, now);
    let request = echo_request_frame(HOST_A, ETH0_IP, 64, 7, b"same payload");

    router.deliver_frame_at(request.clone(), "eth0", now);
    router.deliver_frame_at(request, "eth0", now);

    let sent = collect_transmissions(&receiver);
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);
    let icmp = icmp_of(&sent[0]).unwrap();
    assert_eq!(&icmp.payload()[..], b"same payload");
}

#[test]
fn ttl_one_yields_time_exceeded_and_is_not_forwarded() {
    let (router, receiver) = test_router();
    let now = Instant::now();
    router.cache().insert(HOST_A_MAC, HOST_A, now);
    router.cache().insert(GATEWAY_MAC, GATEWAY, now);

    router.deliver_frame_at(
        udp_frame(HOST_A, Ipv4Addr::new(10, 0, 1, 5), 1, b"late"),
        "eth0",
        now,
    );

    let sent = collect_transmissions(&receiver);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].frame.dest_mac(), HOST_A_MAC);
    let error = ipv4_of(&sent[0]);
    assert_eq!(error.dest_addr(), HOST_A);
    assert_eq!(error.src_addr(), ETH0_IP);
    assert_eq!(error.ttl(), 64);
    let icmp = icmp_of(&sent[0]).unwrap();
    assert_eq!((icmp.icmp_type(), icmp.code()), (11, 0));
    assert!(icmp.validate_checksum());
}

#[test]
fn ttl_two_forwarded_with_ttl_one() {
    let (router, receiver) = test_router();
    let now = Instant::now();
    router.cache().insert(GATEWAY_MAC, GATEWAY, now);

    router.deliver_frame_at(
        udp_frame(HOST_A, Ipv4Addr::new(10, 0, 1, 5), 2, b"just"),
        "eth0",
        now,
    );

    let sent = collect_transmissions(&receiver);
    assert_eq!(sent.len(), 1);
    assert_eq!(ipv4_of(&sent[0]).ttl(), 1);
}

#[test]
fn queued_frames_flushed_in_order() {
    let (router, receiver) = test_router();
    let now = Instant::now();
    for i in 0..5u8 {
        router.deliver_frame_at(udp_frame(HOST_A, HOST_B, 64, &[i]), "eth0", now);
    }
    let requests = collect_transmissions(&receiver);
    assert_eq!(requests.len(), 1);
    assert_eq!(router.cache().queued_frames(HOST_B), 5);

    router.deliver_frame_at(
        arp_reply_frame(HOST_B_MAC, HOST_B, ETH1_MAC, ETH1_IP),
        "eth1",
        now,
    );

    let order: Vec<u8> = collect_transmissions(&receiver)
        .iter()
        .map(|t| ipv4_of(t).payload()[8])
        .collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

#[test]
fn unanswered_arp_gives_host_unreachable_per_frame() {
    init_logging();
    let (router, receiver) = test_router();
    let config = router.config().clone();
    let start = Instant::now();
    router.cache().insert(HOST_A_MAC, HOST_A, start);

    router.deliver_frame_at(udp_frame(HOST_A, HOST_B, 64, b"one"), "eth0", start);
    router.deliver_frame_at(udp_frame(HOST_A, HOST_B, 64, b"two"), "eth0", start);

    let mut requests = collect_transmissions(&receiver).len();
    let mut now = start;
    for _ in 0..config.arp_retry_limit {
        now += config.arp_retry_interval;
        // Sweeps in between attempts do nothing
        router.sweep_at(now - config.arp_retry_interval / 2);
        router.sweep_at(now);
        let sent = collect_transmissions(&receiver);
        requests += sent
            .iter()
            .filter(|t| t.frame.ether_type() == ARP_ETHER_TYPE)
            .count();
        if router.cache().pending_len() == 0 {
            let errors: Vec<IcmpPacket> = sent.iter().filter_map(icmp_of).collect();
            assert_eq!(errors.len(), 2);
            for (error, transmission) in errors.iter().zip(sent.iter()) {
                assert_eq!((error.icmp_type(), error.code()), (3, 1));
                assert_eq!(transmission.interface, "eth0");
                assert_eq!(ipv4_of(transmission).dest_addr(), HOST_A);
            }
        }
    }

    assert_eq!(requests as u32, config.arp_retry_limit);
    assert_eq!(router.cache().pending_len(), 0);

    // A later packet starts over
    router.deliver_frame_at(udp_frame(HOST_A, HOST_B, 64, b"three"), "eth0", now);
    let sent = collect_transmissions(&receiver);
    assert_eq!(sent.len(), 1);
    assert_eq!(arp_of(&sent[0]).target_ipv4_addr().unwrap(), HOST_B);
    assert_eq!(router.cache().pending_attempts(HOST_B), Some(1));
}

#[test]
fn error_about_queued_error_is_not_reported() {
    init_logging();
    let (router, receiver) = test_router();
    let config = router.config().clone();
    let start = Instant::now();

    // The time exceeded for HOST_A waits on HOST_A's own address
    router.deliver_frame_at(
        udp_frame(HOST_A, Ipv4Addr::new(10, 0, 1, 5), 1, b"late"),
        "eth0",
        start,
    );
    assert_eq!(router.cache().queued_frames(HOST_A), 1);

    let mut sent = collect_transmissions(&receiver);
    let mut now = start;
    for _ in 0..config.arp_retry_limit {
        now += config.arp_retry_interval;
        router.sweep_at(now);
        sent.extend(collect_transmissions(&receiver));
    }

    assert_eq!(sent.len() as u32, config.arp_retry_limit);
    for transmission in &sent {
        assert_eq!(transmission.frame.ether_type(), ARP_ETHER_TYPE);
        assert_eq!(arp_of(transmission).target_ipv4_addr().unwrap(), HOST_A);
    }
    assert!(sent.iter().filter_map(icmp_of).next().is_none());
    assert_eq!(router.cache().pending_len(), 0);
    assert!(collect_transmissions(&receiver).is_empty());
}

#[test]
fn network_unreachable() {
    let (router, receiver) = test_router();
    let now = Instant::now();
    router.cache().insert(HOST_A_MAC, HOST_A, now);

    let inbound = udp_frame(HOST_A, Ipv4Addr::new(203, 0, 113, 9), 64, b"where");
    router.deliver_frame_at(inbound.clone(), "eth0", now);

    let sent = collect_transmissions(&receiver);
    assert_eq!(sent.len(), 1);
    let icmp = icmp_of(&sent[0]).unwrap();
    assert_eq!((icmp.icmp_type(), icmp.code()), (3, 0));
    // Quoted with the TTL and checksum it arrived with
    assert_eq!(&icmp.payload()[..], &inbound[14..14 + 28]);
}

#[test]
fn port_unreachable() {
    let (router, receiver) = test_router();
    let now = Instant::now();
    router.cache().insert(HOST_A_MAC, HOST_A, now);

    let inbound = udp_frame(HOST_A, ETH0_IP, 64, b"query");
    router.deliver_frame_at(inbound.clone(), "eth0", now);

    let sent = collect_transmissions(&receiver);
    assert_eq!(sent.len(), 1);
    let icmp = icmp_of(&sent[0]).unwrap();
    assert_eq!((icmp.icmp_type(), icmp.code()), (3, 3));
    // Quotes the IP header and the UDP header
    assert_eq!(icmp.payload().len(), 28);
    assert_eq!(&icmp.payload()[20..22], &5000u16.to_be_bytes());
    assert_eq!(&icmp.payload()[..], &inbound[14..14 + 28]);
}

#[test]
fn corrupted_header_dropped_silently() {
    let (router, receiver) = test_router();
    let now = Instant::now();
    router.cache().insert(HOST_A_MAC, HOST_A, now);

    let mut frame = udp_frame(HOST_A, ETH0_IP, 64, b"query");
    // Damage the stored checksum
    frame[14 + 10] ^= 0x55;
    router.deliver_frame_at(frame, "eth0", now);

    assert!(collect_transmissions(&receiver).is_empty());
}

#[test]
fn expired_entry_triggers_new_resolution() {
    let (router, receiver) = test_router();
    let start = Instant::now();
    router.cache().insert(HOST_B_MAC, HOST_B, start);

    let later = start + router.config().arp_cache_timeout + Duration::from_secs(1);
    router.deliver_frame_at(udp_frame(HOST_A, HOST_B, 64, b"again"), "eth0", later);

    let sent = collect_transmissions(&receiver);
    assert_eq!(sent.len(), 1);
    assert_eq!(arp_of(&sent[0]).target_ipv4_addr().unwrap(), HOST_B);
}
