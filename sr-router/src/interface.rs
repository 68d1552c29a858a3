use crate::RouterError;
use sr_packets::MacAddr;
use std::net::Ipv4Addr;

/// A router port: its name, and the addresses it owns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interface {
    pub name: String,
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
}

impl Interface {
    pub fn new<S: Into<String>>(name: S, ip: Ipv4Addr, mac: MacAddr) -> Self {
        Interface {
            name: name.into(),
            ip,
            mac,
        }
    }
}

/// Read-only table of the router's interfaces, loaded once at startup.
#[derive(Clone, Debug, Default)]
pub struct InterfaceTable {
    interfaces: Vec<Interface>,
}

impl InterfaceTable {
    pub fn new(interfaces: Vec<Interface>) -> Result<Self, RouterError> {
        for (i, interface) in interfaces.iter().enumerate() {
            if interfaces[..i].iter().any(|other| other.name == interface.name) {
                return Err(RouterError::DuplicateInterface(interface.name.clone()));
            }
        }
        Ok(InterfaceTable { interfaces })
    }

    pub fn lookup(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn lookup_by_ip(&self, ip: Ipv4Addr) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.ip == ip)
    }

    pub fn lookup_by_mac(&self, mac: MacAddr) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.mac == mac)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter()
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }
}
