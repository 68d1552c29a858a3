//! # What are they for?
//!
//! Classifiers are very similar to processors, but are used to differentiate a stream of packets. As such, they take each packet by reference,
//! and are not able to modify it. The router runs every inbound packet through a chain of them, and the class that comes out decides which
//! handler the packet is moved to next.
mod ether_type;
pub use self::ether_type::*;

mod destination;
pub use self::destination::*;

mod local_service;
pub use self::local_service::*;

/// Used by the router to determine the kind of packet we have. Classifier::Class is then
/// matched on to send the packet down the appropriate path.
pub trait Classifier {
    type Packet: Send + Clone;
    type Class: Sized;

    fn classify(&self, packet: &Self::Packet) -> Self::Class;
}
