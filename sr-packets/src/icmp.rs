use crate::*;
use std::borrow::Cow;
use std::convert::{TryFrom, TryInto};

/// ICMP message types handled by the router
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IcmpType {
    EchoReply = 0,
    DestinationUnreachable = 3,
    SourceQuench = 4,
    Redirect = 5,
    EchoRequest = 8,
    TimeExceeded = 11,
    ParameterProblem = 12,
}

/// Codes for `IcmpType::DestinationUnreachable`
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnreachableCode {
    Network = 0,
    Host = 1,
    Port = 3,
}

/// Type, code, checksum and the 4 bytes whose meaning depends on the type.
pub const ICMP_HEADER_LEN: usize = 8;

/// ICMP message as described in RFC 792, layered over the same buffer as the IP packet
/// that carries it.
#[derive(Clone, Debug)]
pub struct IcmpPacket {
    pub data: PacketData,
    pub layer2_offset: Option<usize>,
    pub layer3_offset: Option<usize>,
    pub layer4_offset: usize,
    pub payload_offset: usize,
}

impl Packet for IcmpPacket {}

impl IcmpPacket {
    pub fn from_buffer(
        data: PacketData,
        layer2_offset: Option<usize>,
        layer3_offset: Option<usize>,
        layer4_offset: usize,
    ) -> Result<IcmpPacket, &'static str> {
        if data.len() < layer4_offset + ICMP_HEADER_LEN {
            return Err("Packet too short to contain an ICMP header");
        }

        if let Some(layer3_offset) = layer3_offset {
            if IpProtocol::from(data[layer3_offset + 9]) != IpProtocol::ICMP {
                return Err("Protocol is incorrect, since it isn't ICMP");
            }
        }

        Ok(IcmpPacket {
            data,
            layer2_offset,
            layer3_offset,
            layer4_offset,
            payload_offset: layer4_offset + ICMP_HEADER_LEN,
        })
    }

    /// Make an empty ICMP message, with no layer 3 header nor payload.
    pub fn empty() -> IcmpPacket {
        IcmpPacket {
            data: vec![0; ICMP_HEADER_LEN],
            layer2_offset: None,
            layer3_offset: None,
            layer4_offset: 0,
            payload_offset: ICMP_HEADER_LEN,
        }
    }

    pub fn icmp_type(&self) -> u8 {
        self.data[self.layer4_offset]
    }

    pub fn set_icmp_type(&mut self, icmp_type: IcmpType) {
        self.data[self.layer4_offset] = icmp_type as u8;
    }

    pub fn code(&self) -> u8 {
        self.data[self.layer4_offset + 1]
    }

    pub fn set_code(&mut self, code: u8) {
        self.data[self.layer4_offset + 1] = code;
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 2..=self.layer4_offset + 3]
                .try_into()
                .unwrap(),
        )
    }

    /// Echo identifier, only meaningful for echo request/reply.
    pub fn identifier(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 4..=self.layer4_offset + 5]
                .try_into()
                .unwrap(),
        )
    }

    /// Echo sequence number, only meaningful for echo request/reply.
    pub fn sequence_number(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 6..=self.layer4_offset + 7]
                .try_into()
                .unwrap(),
        )
    }

    /// Next-hop MTU of a destination unreachable message. The two bytes before it are
    /// unused and always zero.
    pub fn next_mtu(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 6..=self.layer4_offset + 7]
                .try_into()
                .unwrap(),
        )
    }

    /// Overwrites bytes 4 to 8 of the header.
    pub fn set_rest_of_header(&mut self, rest: [u8; 4]) {
        self.data[self.layer4_offset + 4..self.layer4_offset + 8].copy_from_slice(&rest);
    }

    pub fn is_error(&self) -> bool {
        [
            IcmpType::DestinationUnreachable,
            IcmpType::SourceQuench,
            IcmpType::Redirect,
            IcmpType::TimeExceeded,
            IcmpType::ParameterProblem,
        ]
        .iter()
        .any(|t| *t as u8 == self.icmp_type())
    }

    pub fn payload(&self) -> Cow<[u8]> {
        Cow::from(&self.data[self.payload_offset..])
    }

    /// Set payload of the message, does not change the checksum.
    /// Don't forget to update the length field of the IP packet that contains this.
    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(self.payload_offset);
        self.data.reserve_exact(payload.len());
        self.data.extend(payload);
    }

    /// The checksum covers the whole message, header and payload.
    pub fn validate_checksum(&self) -> bool {
        checksum(&self.data[self.layer4_offset..]) == 0
    }

    pub fn set_checksum(&mut self) {
        self.data[self.layer4_offset + 2..=self.layer4_offset + 3].copy_from_slice(&[0, 0]);
        let new_checksum = checksum(&self.data[self.layer4_offset..]);
        self.data[self.layer4_offset + 2..=self.layer4_offset + 3]
            .copy_from_slice(&new_checksum.to_be_bytes());
    }
}

impl PartialEq for IcmpPacket {
    fn eq(&self, other: &Self) -> bool {
        self.data[self.layer4_offset..] == other.data[other.layer4_offset..]
    }
}

impl Eq for IcmpPacket {}

impl TryFrom<Ipv4Packet> for IcmpPacket {
    type Error = &'static str;

    fn try_from(packet: Ipv4Packet) -> Result<Self, Self::Error> {
        IcmpPacket::from_buffer(
            packet.data,
            packet.layer2_offset,
            Some(packet.layer3_offset),
            packet.payload_offset,
        )
    }
}
