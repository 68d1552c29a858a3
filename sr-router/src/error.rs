use std::net::Ipv4Addr;
use thiserror::Error;

/// Errors raised while assembling a router. The per-packet path never surfaces
/// errors to the transport; failures there are dropped or reported over ICMP.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    #[error("invalid route on line {line}: {reason}")]
    InvalidRoute { line: usize, reason: String },

    #[error("mask {0} is not a contiguous prefix")]
    NonContiguousMask(Ipv4Addr),

    #[error("route to {destination} uses unknown interface {interface}")]
    UnknownInterface {
        destination: Ipv4Addr,
        interface: String,
    },

    #[error("duplicate interface {0}")]
    DuplicateInterface(String),
}
