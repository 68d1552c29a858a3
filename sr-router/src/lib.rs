//! Forwarding core of a software IPv4 router.
//!
//! The transport hands every received Ethernet frame to [`Router::deliver_frame`]. The
//! router answers ARP for its own addresses, forwards IPv4 by longest prefix match,
//! resolves next hops through its ARP cache, and reports failures to senders over ICMP.
//! Frames leave through the [`Transmit`] implementation it was built with. A background
//! task started with [`spawn_sweeper`] keeps the ARP cache moving.

extern crate crossbeam;
extern crate tokio;

/// Classifiers sort packets without touching them; the router matches on their class to
/// pick the next handler.
pub mod classifier;

/// Processors take packets by value and rewrite them on the way through.
pub mod processor;

mod arp_cache;
pub use self::arp_cache::*;

mod arp_engine;

mod config;
pub use self::config::*;

mod error;
pub use self::error::*;

mod forward;

mod icmp;
pub use self::icmp::*;

mod interface;
pub use self::interface::*;

mod router;
pub use self::router::*;

mod routing;
pub use self::routing::*;

mod sweep;
pub use self::sweep::*;

mod transmit;
pub use self::transmit::*;
