use crate::arp_cache::{ArpCache, ArpRetry, NextHop, PendingHandle, PendingRequest, Resolution};
use crate::classifier::{Classifier, ClassifyEtherType, EtherType};
use crate::{IcmpGenerator, InterfaceTable, RouteEntry, RouterConfig, RouterError, RoutingTable, Transmit};
use sr_packets::{
    ArpFrame, ArpOp, EthernetFrame, IcmpType, Ipv4Packet, MacAddr, UnreachableCode,
    IPV4_ETHER_TYPE,
};
use std::convert::TryFrom;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Everything the forwarding core needs, bundled so independent routers can coexist.
///
/// Tables are fixed at construction. The ARP cache is the only mutable state and is
/// shared between the packet path (`deliver_frame`) and the sweep task (`sweep`), so
/// both take `&self` and a router is typically held in an `Arc`.
pub struct Router<T: Transmit> {
    pub(crate) config: RouterConfig,
    pub(crate) interfaces: InterfaceTable,
    pub(crate) routes: RoutingTable,
    pub(crate) cache: ArpCache,
    pub(crate) transmitter: T,
    pub(crate) generator: IcmpGenerator,
}

impl<T: Transmit> Router<T> {
    /// Fails if a route leaves through an interface the table does not know.
    pub fn new(
        config: RouterConfig,
        interfaces: InterfaceTable,
        routes: RoutingTable,
        transmitter: T,
    ) -> Result<Self, RouterError> {
        for route in routes.entries() {
            if interfaces.lookup(&route.interface).is_none() {
                return Err(RouterError::UnknownInterface {
                    destination: route.destination,
                    interface: route.interface.clone(),
                });
            }
        }

        let own_addrs = interfaces.iter().map(|i| i.ip).collect();
        let generator = IcmpGenerator::new(&config, own_addrs);
        let cache = ArpCache::new(&config);
        Ok(Router {
            config,
            interfaces,
            routes,
            cache,
            transmitter,
            generator,
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn interfaces(&self) -> &InterfaceTable {
        &self.interfaces
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn cache(&self) -> &ArpCache {
        &self.cache
    }

    pub fn transmitter(&self) -> &T {
        &self.transmitter
    }

    /// Entry point for the transport: one call per frame received on `interface`.
    pub fn deliver_frame(&self, data: Vec<u8>, interface: &str) {
        self.deliver_frame_at(data, interface, Instant::now())
    }

    pub fn deliver_frame_at(&self, data: Vec<u8>, interface: &str, now: Instant) {
        let receiving = match self.interfaces.lookup(interface) {
            Some(receiving) => receiving,
            None => {
                warn!(interface, "frame received on unknown interface, dropping");
                return;
            }
        };
        let frame = match EthernetFrame::from_buffer(data, 0) {
            Ok(frame) => frame,
            Err(reason) => {
                trace!(interface, reason, "dropping frame");
                return;
            }
        };

        match ClassifyEtherType::new().classify(&frame) {
            EtherType::Arp => self.handle_arp(frame, receiving, now),
            EtherType::Ipv4 => self.handle_ipv4(frame, now),
            EtherType::Unsupported(ether_type) => {
                trace!(interface, ether_type, "unsupported ether type, dropping");
            }
        }
    }

    /// One pass of the cache maintenance task.
    pub fn sweep(&self) {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) {
        let report = self.cache.sweep(now);
        for retry in report.retries {
            self.send_arp_request(&retry);
        }
        for request in report.abandoned {
            self.abandon(request, now);
        }
    }

    /// Routes a packet the router originated. Without a route it is dropped.
    pub(crate) fn route_and_send(&self, packet: Ipv4Packet, now: Instant) {
        match self.routes.longest_prefix_match(packet.dest_addr()) {
            Some(route) => self.send_via(packet, route, now),
            None => debug!(dest = %packet.dest_addr(), "no route for generated packet, dropping"),
        }
    }

    /// Addresses `packet` to the next hop of `route` and transmits it, or parks it until
    /// the next hop resolves.
    pub(crate) fn send_via(&self, packet: Ipv4Packet, route: &RouteEntry, now: Instant) {
        let outbound = match self.interfaces.lookup(&route.interface) {
            Some(outbound) => outbound,
            None => {
                warn!(interface = %route.interface, "route through unknown interface");
                return;
            }
        };
        let next_hop = route.next_hop(packet.dest_addr());
        let mut frame = match into_frame(packet) {
            Some(frame) => frame,
            None => return,
        };
        frame.set_src_mac(outbound.mac);
        frame.set_ether_type(IPV4_ETHER_TYPE);

        match self
            .cache
            .resolve_or_queue(next_hop, frame, &outbound.name, now)
        {
            NextHop::Resolved(mac, mut frame) => {
                frame.set_dest_mac(mac);
                trace!(%next_hop, interface = %outbound.name, "transmitting");
                self.transmitter.transmit_frame(frame, &outbound.name);
            }
            NextHop::Queued(handle) => {
                trace!(%next_hop, "next hop unresolved, frame queued");
                self.resolve(handle, now);
            }
        }
    }

    /// Sends an ICMP error about `offending` back to its source, from the interface
    /// the router would use to reach that source.
    pub(crate) fn send_icmp_error(
        &self,
        offending: &Ipv4Packet,
        icmp_type: IcmpType,
        code: u8,
        now: Instant,
    ) {
        let sender = offending.src_addr();
        let route = match self.routes.longest_prefix_match(sender) {
            Some(route) => route,
            None => {
                debug!(%sender, "no route back to sender, ICMP error not sent");
                return;
            }
        };
        let src_ip = match self.interfaces.lookup(&route.interface) {
            Some(interface) => interface.ip,
            None => return,
        };
        match self.generator.error(src_ip, offending, icmp_type, code) {
            Some(error) => {
                debug!(%sender, ?icmp_type, code, "sending ICMP error");
                self.send_via(error, route, now);
            }
            None => trace!(%sender, ?icmp_type, "ICMP error suppressed"),
        }
    }

    /// Transmits every frame of a resolved request, in the order they were queued.
    pub(crate) fn flush(&self, request: PendingRequest, mac: MacAddr) {
        debug!(
            ip = %request.target,
            %mac,
            frames = request.frames.len(),
            "flushing queued frames"
        );
        for mut queued in request.frames {
            queued.frame.set_dest_mac(mac);
            self.transmitter
                .transmit_frame(queued.frame, &queued.interface);
        }
    }

    fn resolve(&self, handle: PendingHandle, now: Instant) {
        match self.cache.evaluate(handle, now) {
            Resolution::Send(retry) => self.send_arp_request(&retry),
            Resolution::Abandoned(request) => self.abandon(request, now),
            Resolution::Wait | Resolution::Gone => {}
        }
    }

    fn send_arp_request(&self, retry: &ArpRetry) {
        let outbound = match self.interfaces.lookup(&retry.interface) {
            Some(outbound) => outbound,
            None => return,
        };

        let mut request = ArpFrame::ethernet_ipv4(ArpOp::Request);
        request.set_sender_hardware_addr(outbound.mac);
        request.set_sender_protocol_addr(outbound.ip);
        request.set_target_hardware_addr(MacAddr::default());
        request.set_target_protocol_addr(retry.target);
        let ethernet = request.ethernet_mut();
        ethernet.set_dest_mac(MacAddr::BROADCAST);
        ethernet.set_src_mac(outbound.mac);

        debug!(ip = %retry.target, interface = %outbound.name, "sending ARP request");
        self.transmitter.transmit_frame(request.frame(), &outbound.name);
    }

    fn abandon(&self, request: PendingRequest, now: Instant) {
        warn!(
            ip = %request.target,
            attempts = request.attempts,
            frames = request.frames.len(),
            "ARP resolution failed, host unreachable"
        );
        for queued in request.frames {
            match Ipv4Packet::try_from(queued.frame) {
                Ok(packet) => self.send_icmp_error(
                    &packet,
                    IcmpType::DestinationUnreachable,
                    UnreachableCode::Host as u8,
                    now,
                ),
                Err(reason) => trace!(reason, "queued frame is not IPv4"),
            }
        }
    }
}

// Reuses the received buffer when the packet still sits in one.
fn into_frame(packet: Ipv4Packet) -> Option<EthernetFrame> {
    if packet.layer2_offset.is_none() {
        return Some(EthernetFrame::encap_ipv4(packet));
    }
    match EthernetFrame::try_from(packet) {
        Ok(frame) => Some(frame),
        Err(reason) => {
            warn!(reason, "cannot frame packet");
            None
        }
    }
}
