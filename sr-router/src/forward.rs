//! The IPv4 path: validate, age, then deliver locally or forward.

use crate::classifier::{
    Classifier, ClassifyDestination, ClassifyLocalService, Destination, LocalService,
};
use crate::processor::{DecIpv4HopLimit, Processor, TtlOutcome};
use crate::{Interface, Router, Transmit};
use sr_packets::{EthernetFrame, IcmpType, Ipv4Packet, UnreachableCode};
use std::convert::TryFrom;
use std::time::Instant;
use tracing::{debug, trace};

impl<T: Transmit> Router<T> {
    pub(crate) fn handle_ipv4(&self, frame: EthernetFrame, now: Instant) {
        let packet = match Ipv4Packet::try_from(frame) {
            Ok(packet) => packet,
            Err(reason) => {
                trace!(reason, "malformed IPv4 packet, dropping");
                return;
            }
        };
        // A corrupted source address cannot be trusted with an ICMP error
        if !packet.validate_checksum() {
            debug!(src = %packet.src_addr(), "bad IPv4 header checksum, dropping");
            return;
        }
        // ICMP errors quote the header as it arrived, not the aged one
        let received_header = packet.header().to_vec();

        let packet = match DecIpv4HopLimit::new().process(packet) {
            Some(TtlOutcome::Forward(packet)) => packet,
            Some(TtlOutcome::Expired(packet)) => {
                debug!(src = %packet.src_addr(), dest = %packet.dest_addr(), "TTL expired");
                self.send_icmp_error(&packet, IcmpType::TimeExceeded, 0, now);
                return;
            }
            None => return,
        };

        match ClassifyDestination::new(&self.interfaces).classify(&packet) {
            Destination::Local(interface) => {
                self.deliver_local(packet, &received_header, interface, now)
            }
            Destination::Remote => self.forward(packet, &received_header, now),
        }
    }

    fn deliver_local(
        &self,
        packet: Ipv4Packet,
        received_header: &[u8],
        interface: &Interface,
        now: Instant,
    ) {
        match ClassifyLocalService::new().classify(&packet) {
            LocalService::EchoRequest => match self.generator.echo_reply(packet) {
                Some(reply) => {
                    trace!(dest = %reply.dest_addr(), "echo reply");
                    self.route_and_send(reply, now);
                }
                None => debug!("bad ICMP checksum on echo request, dropping"),
            },
            LocalService::PortUnreachable => self.send_icmp_error(
                &as_received(&packet, received_header),
                IcmpType::DestinationUnreachable,
                UnreachableCode::Port as u8,
                now,
            ),
            LocalService::Unsupported => trace!(
                interface = %interface.name,
                protocol = ?packet.protocol(),
                "no local service, dropping"
            ),
        }
    }

    fn forward(&self, packet: Ipv4Packet, received_header: &[u8], now: Instant) {
        match self.routes.longest_prefix_match(packet.dest_addr()) {
            Some(route) => self.send_via(packet, route, now),
            None => {
                debug!(dest = %packet.dest_addr(), "no route, network unreachable");
                self.send_icmp_error(
                    &as_received(&packet, received_header),
                    IcmpType::DestinationUnreachable,
                    UnreachableCode::Network as u8,
                    now,
                );
            }
        }
    }
}

fn as_received(packet: &Ipv4Packet, header: &[u8]) -> Ipv4Packet {
    let mut received = packet.clone();
    received.data[received.layer3_offset..received.payload_offset].copy_from_slice(header);
    received
}
