use crate::classifier::Classifier;
use crate::{Interface, InterfaceTable};
use sr_packets::Ipv4Packet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination<'a> {
    /// Addressed to one of the router's own interfaces.
    Local(&'a Interface),
    Remote,
}

/// Decides whether an IPv4 packet terminates at the router or has to be forwarded.
pub struct ClassifyDestination<'a> {
    interfaces: &'a InterfaceTable,
}

impl<'a> ClassifyDestination<'a> {
    pub fn new(interfaces: &'a InterfaceTable) -> Self {
        ClassifyDestination { interfaces }
    }
}

impl<'a> Classifier for ClassifyDestination<'a> {
    type Packet = Ipv4Packet;
    type Class = Destination<'a>;

    fn classify(&self, packet: &Self::Packet) -> Self::Class {
        match self.interfaces.lookup_by_ip(packet.dest_addr()) {
            Some(interface) => Destination::Local(interface),
            None => Destination::Remote,
        }
    }
}
