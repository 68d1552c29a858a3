use crate::RouterError;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// One static route. `destination` is stored already masked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteEntry {
    pub destination: Ipv4Addr,
    pub mask: Ipv4Addr,
    /// `0.0.0.0` when the destination network is directly connected.
    pub gateway: Ipv4Addr,
    pub interface: String,
}

impl RouteEntry {
    pub fn new<S: Into<String>>(
        destination: Ipv4Addr,
        gateway: Ipv4Addr,
        mask: Ipv4Addr,
        interface: S,
    ) -> Result<Self, RouterError> {
        let mask_bits = u32::from(mask);
        // A contiguous mask is a run of ones followed by a run of zeros
        if mask_bits.leading_ones() + mask_bits.trailing_zeros() != 32 {
            return Err(RouterError::NonContiguousMask(mask));
        }
        Ok(RouteEntry {
            destination: Ipv4Addr::from(u32::from(destination) & mask_bits),
            mask,
            gateway,
            interface: interface.into(),
        })
    }

    pub fn prefix_len(&self) -> u32 {
        u32::from(self.mask).leading_ones()
    }

    pub fn matches(&self, ip: Ipv4Addr) -> bool {
        let mask = u32::from(self.mask);
        u32::from(ip) & mask == u32::from(self.destination) & mask
    }

    /// Where a frame for `destination` has to be addressed at the link layer.
    pub fn next_hop(&self, destination: Ipv4Addr) -> Ipv4Addr {
        if self.gateway.is_unspecified() {
            destination
        } else {
            self.gateway
        }
    }
}

/// Ordered, append-only static routing table.
#[derive(Clone, Debug, Default)]
pub struct RoutingTable {
    entries: Vec<RouteEntry>,
}

impl RoutingTable {
    pub fn new() -> Self {
        RoutingTable { entries: vec![] }
    }

    pub fn push(&mut self, entry: RouteEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The matching entry with the longest mask. Ties go to the entry loaded first.
    pub fn longest_prefix_match(&self, ip: Ipv4Addr) -> Option<&RouteEntry> {
        let mut best: Option<&RouteEntry> = None;
        for entry in self.entries.iter().filter(|e| e.matches(ip)) {
            match best {
                Some(current) if current.prefix_len() >= entry.prefix_len() => {}
                _ => best = Some(entry),
            }
        }
        best
    }
}

/// Parses the plain text table format, one route per line:
///
/// ```text
/// # destination  gateway    mask           interface
/// 0.0.0.0        10.0.0.2   0.0.0.0        eth0
/// 192.168.1.0    0.0.0.0    255.255.255.0  eth1
/// ```
impl FromStr for RoutingTable {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut table = RoutingTable::new();
        for (i, raw) in s.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let invalid = |reason: String| RouterError::InvalidRoute {
                line: line_no,
                reason,
            };

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 4 {
                return Err(invalid(format!(
                    "expected 4 fields, found {}",
                    fields.len()
                )));
            }
            let parse_addr = |field: &str| {
                field
                    .parse::<Ipv4Addr>()
                    .map_err(|e| invalid(format!("{}: {}", field, e)))
            };
            let destination = parse_addr(fields[0])?;
            let gateway = parse_addr(fields[1])?;
            let mask = parse_addr(fields[2])?;

            let entry = RouteEntry::new(destination, gateway, mask, fields[3])
                .map_err(|e| invalid(e.to_string()))?;
            table.push(entry);
        }
        Ok(table)
    }
}
