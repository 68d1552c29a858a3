use crate::RouterConfig;
use sr_packets::{IcmpPacket, IcmpType, IpProtocol, Ipv4Packet, ICMP_HEADER_LEN};
use std::convert::TryFrom;
use std::net::Ipv4Addr;

/// Builds the ICMP messages the router originates: errors about datagrams it could not
/// deliver, and replies to echo requests addressed to it.
pub struct IcmpGenerator {
    ttl: u8,
    data_len: usize,
    bad_source_addrs: Vec<Ipv4Addr>,
}

impl IcmpGenerator {
    /// Create an ICMP generator
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the TTL of generated packets and how much of an offending
    /// datagram is quoted in an error
    /// * `bad_source_addrs` - Packets from these IP addresses will generate a None instead of
    /// an ICMP error. Intended to contain the router's own addresses
    pub fn new(config: &RouterConfig, bad_source_addrs: Vec<Ipv4Addr>) -> IcmpGenerator {
        IcmpGenerator {
            ttl: config.icmp_ttl,
            data_len: config.icmp_data_len,
            bad_source_addrs,
        }
    }

    /// Create an ICMP error message about `offending`, sent from `src_ip` back to the
    /// offending packet's source. Return `None` if an ICMP error message should not be
    /// generated, and the packet should be silently discarded instead
    ///
    /// # Arguments
    ///
    /// * `offending` - The first `data_len` bytes of it, starting at the IP header, are
    /// copied into the error. Shorter packets are padded with zeros
    pub fn error(
        &self,
        src_ip: Ipv4Addr,
        offending: &Ipv4Packet,
        icmp_type: IcmpType,
        code: u8,
    ) -> Option<Ipv4Packet> {
        if !self.should_generate_error(offending) {
            return None;
        }

        let original = offending.as_bytes();
        let copied = original.len().min(self.data_len);
        let mut data = vec![0; self.data_len];
        data[..copied].copy_from_slice(&original[..copied]);

        let mut icmp = IcmpPacket::empty();
        icmp.set_icmp_type(icmp_type);
        icmp.set_code(code);
        // Unused and next-hop MTU, both zero
        icmp.set_rest_of_header([0; 4]);
        icmp.set_payload(&data);
        icmp.set_checksum();

        let mut packet = Ipv4Packet::encap_icmp(icmp);
        packet.set_src_addr(src_ip);
        packet.set_dest_addr(offending.src_addr());
        packet.set_ttl(self.ttl);
        packet.set_checksum();
        Some(packet)
    }

    /// Turns an echo request into its reply, reusing the request's buffer. Identifier,
    /// sequence number and data are carried over unchanged. Returns `None` if the ICMP
    /// checksum of the request is bad.
    pub fn echo_reply(&self, request: Ipv4Packet) -> Option<Ipv4Packet> {
        let mut icmp = IcmpPacket::try_from(request).ok()?;
        if !icmp.validate_checksum() {
            return None;
        }
        icmp.set_icmp_type(IcmpType::EchoReply);
        icmp.set_code(0);
        icmp.set_checksum();

        let mut reply = Ipv4Packet::try_from(icmp).ok()?;
        let requester = reply.src_addr();
        let local = reply.dest_addr();
        reply.set_src_addr(local);
        reply.set_dest_addr(requester);
        reply.set_ttl(self.ttl);
        reply.set_checksum();
        Some(reply)
    }

    // Performs checks based on RFC 1812 4.3.2.7 (When Not to Send ICMP Errors)
    fn should_generate_error(&self, packet: &Ipv4Packet) -> bool {
        // Only the first fragment
        if packet.fragment_offset() != 0 {
            return false;
        }
        // Avoid infinite loops, no errors from errors
        if packet.protocol() == IpProtocol::ICMP {
            let header: Vec<u8> = packet
                .payload()
                .iter()
                .take(ICMP_HEADER_LEN)
                .copied()
                .collect();
            match IcmpPacket::from_buffer(header, None, None, 0) {
                Ok(icmp) if !icmp.is_error() => {}
                _ => return false,
            }
        }
        // No broadcast, multicast or loopback addresses
        let src = packet.src_addr();
        if src.is_unspecified() || src.is_broadcast() || src.is_multicast() || src.is_loopback() {
            return false;
        }
        !self.bad_source_addrs.contains(&src)
    }
}
