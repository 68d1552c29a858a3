//! Inbound ARP: answer requests for our addresses, learn from replies.

use crate::{Interface, Router, Transmit};
use sr_packets::{ArpFrame, ArpOp, EthernetFrame, MacAddr};
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use std::time::Instant;
use tracing::{debug, trace};

impl<T: Transmit> Router<T> {
    pub(crate) fn handle_arp(&self, frame: EthernetFrame, receiving: &Interface, now: Instant) {
        let arp = match ArpFrame::try_from(frame) {
            Ok(arp) => arp,
            Err(reason) => {
                trace!(reason, "malformed ARP frame, dropping");
                return;
            }
        };
        if !arp.is_ethernet_ipv4() {
            trace!("ARP frame is not Ethernet/IPv4, dropping");
            return;
        }
        let (sender_mac, sender_ip, target_ip) = match (
            arp.sender_mac_addr(),
            arp.sender_ipv4_addr(),
            arp.target_ipv4_addr(),
        ) {
            (Ok(sender_mac), Ok(sender_ip), Ok(target_ip)) => (sender_mac, sender_ip, target_ip),
            _ => return,
        };

        match arp.opcode() {
            op if op == ArpOp::Request as u16 => {
                self.handle_arp_request(arp, receiving, sender_mac, sender_ip, target_ip, now)
            }
            op if op == ArpOp::Reply as u16 => {
                let addressed_to = arp.ethernet().dest_mac();
                if self.interfaces.lookup_by_mac(addressed_to).is_none() {
                    trace!(dest = %addressed_to, "ARP reply not addressed to us, dropping");
                    return;
                }
                self.learn(sender_mac, sender_ip, now);
            }
            op => trace!(op, "unknown ARP opcode, dropping"),
        }
    }

    fn handle_arp_request(
        &self,
        mut arp: ArpFrame,
        receiving: &Interface,
        sender_mac: MacAddr,
        sender_ip: Ipv4Addr,
        target_ip: Ipv4Addr,
        now: Instant,
    ) {
        if !arp.ethernet().dest_mac().is_broadcast() {
            trace!(%target_ip, "ARP request not broadcast, dropping");
            return;
        }
        // Not a proxy: only our own addresses are answered
        let owner = match self.interfaces.lookup_by_ip(target_ip) {
            Some(owner) => owner,
            None => {
                trace!(%target_ip, "ARP request for foreign address, dropping");
                return;
            }
        };

        self.learn(sender_mac, sender_ip, now);

        arp.set_opcode(ArpOp::Reply as u16);
        arp.set_target_hardware_addr(sender_mac);
        arp.set_target_protocol_addr(sender_ip);
        arp.set_sender_hardware_addr(owner.mac);
        arp.set_sender_protocol_addr(owner.ip);
        let ethernet = arp.ethernet_mut();
        ethernet.set_dest_mac(sender_mac);
        ethernet.set_src_mac(owner.mac);

        debug!(%sender_ip, interface = %receiving.name, "answering ARP request");
        self.transmitter.transmit_frame(arp.frame(), &receiving.name);
    }

    fn learn(&self, mac: MacAddr, ip: Ipv4Addr, now: Instant) {
        // 0.0.0.0 is a host checking its address before claiming it
        if ip.is_unspecified() {
            return;
        }
        if let Some(request) = self.cache.insert(mac, ip, now) {
            self.flush(request, mac);
        }
    }
}
