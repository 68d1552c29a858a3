use crate::classifier::Classifier;
use sr_packets::{EthernetFrame, ARP_ETHER_TYPE, IPV4_ETHER_TYPE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EtherType {
    Arp,
    Ipv4,
    Unsupported(u16),
}

/// Sorts frames by the ether type field of their Ethernet header.
#[derive(Default)]
pub struct ClassifyEtherType {}

impl ClassifyEtherType {
    pub fn new() -> Self {
        ClassifyEtherType {}
    }
}

impl Classifier for ClassifyEtherType {
    type Packet = EthernetFrame;
    type Class = EtherType;

    fn classify(&self, packet: &Self::Packet) -> Self::Class {
        match packet.ether_type() {
            IPV4_ETHER_TYPE => EtherType::Ipv4,
            ARP_ETHER_TYPE => EtherType::Arp,
            other => EtherType::Unsupported(other),
        }
    }
}
