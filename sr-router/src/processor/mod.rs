//! Processors take a packet by value, may rewrite it, and hand back what should continue
//! down the path. Unlike classifiers they are allowed to keep state between packets.
mod dec_ip_hop;
pub use self::dec_ip_hop::*;

pub trait Processor {
    type Input: Send + Clone;
    type Output: Send + Clone;

    fn process(&mut self, packet: Self::Input) -> Option<Self::Output>;
}
