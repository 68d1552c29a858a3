use std::time::Duration;

/// Timers and limits of the forwarding core.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// How long a resolved ARP entry stays usable after the reply that created it.
    pub arp_cache_timeout: Duration,
    /// Minimum spacing between two ARP requests for the same address.
    pub arp_retry_interval: Duration,
    /// ARP requests sent for an address before it is declared unreachable.
    pub arp_retry_limit: u32,
    /// Wake interval of the cache sweep task.
    pub sweep_period: Duration,
    /// TTL of every packet the router originates (ICMP errors and echo replies).
    pub icmp_ttl: u8,
    /// Bytes of the offending datagram quoted in an ICMP error.
    pub icmp_data_len: usize,
}

impl RouterConfig {
    pub const ARP_CACHE_TIMEOUT: Duration = Duration::from_secs(15);
    pub const ARP_RETRY_INTERVAL: Duration = Duration::from_secs(1);
    pub const ARP_RETRY_LIMIT: u32 = 5;
    pub const SWEEP_PERIOD: Duration = Duration::from_secs(1);
    pub const ICMP_TTL: u8 = 64;
    // IP header plus the first 8 bytes of its payload (RFC 792)
    pub const ICMP_DATA_LEN: usize = 28;
}

impl Default for RouterConfig {
    fn default() -> Self {
        RouterConfig {
            arp_cache_timeout: Self::ARP_CACHE_TIMEOUT,
            arp_retry_interval: Self::ARP_RETRY_INTERVAL,
            arp_retry_limit: Self::ARP_RETRY_LIMIT,
            sweep_period: Self::SWEEP_PERIOD,
            icmp_ttl: Self::ICMP_TTL,
            icmp_data_len: Self::ICMP_DATA_LEN,
        }
    }
}
