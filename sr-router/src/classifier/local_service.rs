use crate::classifier::Classifier;
use sr_packets::{IcmpType, IpProtocol, Ipv4Packet, ICMP_HEADER_LEN};

/// What the router does with a datagram addressed to itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocalService {
    EchoRequest,
    /// Transport protocol with no listener on the router.
    PortUnreachable,
    Unsupported,
}

#[derive(Default)]
pub struct ClassifyLocalService {}

impl ClassifyLocalService {
    pub fn new() -> Self {
        ClassifyLocalService {}
    }
}

impl Classifier for ClassifyLocalService {
    type Packet = Ipv4Packet;
    type Class = LocalService;

    fn classify(&self, packet: &Self::Packet) -> Self::Class {
        match packet.protocol() {
            IpProtocol::TCP | IpProtocol::UDP => LocalService::PortUnreachable,
            IpProtocol::ICMP => {
                let payload = packet.payload();
                if payload.len() >= ICMP_HEADER_LEN
                    && payload[0] == IcmpType::EchoRequest as u8
                    && payload[1] == 0
                {
                    LocalService::EchoRequest
                } else {
                    LocalService::Unsupported
                }
            }
            IpProtocol::Other(_) => LocalService::Unsupported,
        }
    }
}
