use crate::processor::Processor;
use sr_packets::Ipv4Packet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TtlOutcome {
    /// TTL decremented and header checksum refreshed.
    Forward(Ipv4Packet),
    /// TTL would reach zero. The packet is returned exactly as it came in.
    Expired(Ipv4Packet),
}

/// Decrements the TTL of an IPv4 packet
#[derive(Default)]
pub struct DecIpv4HopLimit {}

impl DecIpv4HopLimit {
    pub fn new() -> DecIpv4HopLimit {
        DecIpv4HopLimit {}
    }
}

impl Processor for DecIpv4HopLimit {
    type Input = Ipv4Packet;
    type Output = TtlOutcome;

    fn process(&mut self, mut packet: Self::Input) -> Option<Self::Output> {
        match packet.ttl() {
            0 | 1 => Some(TtlOutcome::Expired(packet)),
            ttl => {
                packet.set_ttl(ttl - 1);
                packet.set_checksum();
                Some(TtlOutcome::Forward(packet))
            }
        }
    }
}
