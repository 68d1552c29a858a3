//! IP to hardware address translations, and the requests still waiting for one.
//!
//! Both the packet path and the sweep task go through `ArpCache`, which serializes
//! every operation behind one lock. Nothing inside is handed out by reference: callers
//! get copies of addresses, ownership of queued frames, or a `PendingHandle` naming a
//! request.

use sr_packets::{EthernetFrame, MacAddr};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

use crate::RouterConfig;

/// A frame parked until its next hop resolves, with the interface it will leave from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuedFrame {
    pub frame: EthernetFrame,
    pub interface: String,
}

/// An ARP resolution in progress.
#[derive(Clone, Debug)]
pub struct PendingRequest {
    pub target: Ipv4Addr,
    /// Interface the ARP requests are broadcast on.
    pub interface: String,
    /// Requests sent so far.
    pub attempts: u32,
    pub last_sent: Option<Instant>,
    /// Frames in arrival order.
    pub frames: VecDeque<QueuedFrame>,
}

/// Names a pending request without borrowing it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PendingHandle(Ipv4Addr);

impl PendingHandle {
    pub fn target(&self) -> Ipv4Addr {
        self.0
    }
}

/// An ARP request the caller has to broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArpRetry {
    pub target: Ipv4Addr,
    pub interface: String,
}

/// What the retry policy decided for one pending request.
#[derive(Debug)]
pub enum Resolution {
    /// Broadcast another request; the attempt has already been counted.
    Send(ArpRetry),
    /// The last request is still within its retry interval.
    Wait,
    /// Out of attempts. The request has been removed and its frames are returned.
    Abandoned(PendingRequest),
    /// No such request, it was resolved or abandoned in the meantime.
    Gone,
}

/// Outcome of looking up a next hop for a frame.
#[derive(Debug)]
pub enum NextHop {
    Resolved(MacAddr, EthernetFrame),
    Queued(PendingHandle),
}

/// Everything a sweep found to do. The caller acts on it after the lock is released.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub expired: usize,
    pub retries: Vec<ArpRetry>,
    pub abandoned: Vec<PendingRequest>,
}

struct ArpEntry {
    mac: MacAddr,
    added: Instant,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<Ipv4Addr, ArpEntry>,
    requests: HashMap<Ipv4Addr, PendingRequest>,
}

impl CacheState {
    fn lookup(&mut self, ip: Ipv4Addr, now: Instant, timeout: Duration) -> Option<MacAddr> {
        let expired = match self.entries.get(&ip) {
            Some(entry) if now.saturating_duration_since(entry.added) < timeout => {
                return Some(entry.mac)
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove(&ip);
        }
        None
    }

    fn queue(&mut self, ip: Ipv4Addr, frame: EthernetFrame, interface: &str) -> PendingHandle {
        let request = self.requests.entry(ip).or_insert_with(|| PendingRequest {
            target: ip,
            interface: interface.to_string(),
            attempts: 0,
            last_sent: None,
            frames: VecDeque::new(),
        });
        request.frames.push_back(QueuedFrame {
            frame,
            interface: interface.to_string(),
        });
        PendingHandle(ip)
    }
}

pub struct ArpCache {
    state: Mutex<CacheState>,
    entry_timeout: Duration,
    retry_interval: Duration,
    retry_limit: u32,
}

impl ArpCache {
    pub fn new(config: &RouterConfig) -> Self {
        ArpCache {
            state: Mutex::new(CacheState::default()),
            entry_timeout: config.arp_cache_timeout,
            retry_interval: config.arp_retry_interval,
            retry_limit: config.arp_retry_limit,
        }
    }

    // A panic on the other context must not take the cache down with it
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The hardware address for `ip`, if an unexpired entry exists.
    pub fn lookup(&self, ip: Ipv4Addr, now: Instant) -> Option<MacAddr> {
        self.state().lookup(ip, now, self.entry_timeout)
    }

    /// Records or refreshes `ip -> mac`. A request pending on `ip` is removed and
    /// returned so the caller can flush its frames.
    pub fn insert(&self, mac: MacAddr, ip: Ipv4Addr, now: Instant) -> Option<PendingRequest> {
        let mut state = self.state();
        state.entries.insert(ip, ArpEntry { mac, added: now });
        debug!(%ip, %mac, "ARP entry cached");
        state.requests.remove(&ip)
    }

    /// Parks `frame` behind the request for `ip`, creating the request if needed.
    /// A new request has not been sent yet; run `evaluate` on the handle to send it.
    pub fn queue(&self, ip: Ipv4Addr, frame: EthernetFrame, interface: &str) -> PendingHandle {
        let mut state = self.state();
        state.entries.remove(&ip);
        state.queue(ip, frame, interface)
    }

    /// Lookup and queue as one step, so a reply landing in between cannot strand the
    /// frame.
    pub fn resolve_or_queue(
        &self,
        ip: Ipv4Addr,
        frame: EthernetFrame,
        interface: &str,
        now: Instant,
    ) -> NextHop {
        let mut state = self.state();
        match state.lookup(ip, now, self.entry_timeout) {
            Some(mac) => NextHop::Resolved(mac, frame),
            None => NextHop::Queued(state.queue(ip, frame, interface)),
        }
    }

    /// Applies the retry policy to one request.
    pub fn evaluate(&self, handle: PendingHandle, now: Instant) -> Resolution {
        let mut state = self.state();
        let step = match state.requests.get_mut(&handle.0) {
            Some(request) => self.step(request, now),
            None => return Resolution::Gone,
        };
        self.finish(&mut state, handle.0, step)
    }

    /// Drops expired entries and re-evaluates every pending request.
    pub fn sweep(&self, now: Instant) -> SweepReport {
        let mut state = self.state();
        let mut report = SweepReport::default();

        let timeout = self.entry_timeout;
        let before = state.entries.len();
        state
            .entries
            .retain(|_, entry| now.saturating_duration_since(entry.added) < timeout);
        report.expired = before - state.entries.len();
        if report.expired > 0 {
            debug!(expired = report.expired, "ARP entries expired");
        }

        let targets: Vec<Ipv4Addr> = state.requests.keys().copied().collect();
        for target in targets {
            let step = match state.requests.get_mut(&target) {
                Some(request) => self.step(request, now),
                None => continue,
            };
            match self.finish(&mut state, target, step) {
                Resolution::Send(retry) => report.retries.push(retry),
                Resolution::Abandoned(request) => report.abandoned.push(request),
                Resolution::Wait | Resolution::Gone => {}
            }
        }
        report
    }

    pub fn resolved_len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn pending_len(&self) -> usize {
        self.state().requests.len()
    }

    /// Requests sent so far for `ip`, if a resolution is pending.
    pub fn pending_attempts(&self, ip: Ipv4Addr) -> Option<u32> {
        self.state().requests.get(&ip).map(|r| r.attempts)
    }

    /// Frames waiting on `ip`.
    pub fn queued_frames(&self, ip: Ipv4Addr) -> usize {
        self.state()
            .requests
            .get(&ip)
            .map_or(0, |r| r.frames.len())
    }

    fn step(&self, request: &mut PendingRequest, now: Instant) -> Step {
        let due = match request.last_sent {
            None => true,
            Some(sent) => now.saturating_duration_since(sent) >= self.retry_interval,
        };
        if !due {
            Step::Wait
        } else if request.attempts >= self.retry_limit {
            Step::Abandon
        } else {
            request.attempts += 1;
            request.last_sent = Some(now);
            trace!(ip = %request.target, attempt = request.attempts, "ARP request due");
            Step::Send(ArpRetry {
                target: request.target,
                interface: request.interface.clone(),
            })
        }
    }

    fn finish(&self, state: &mut CacheState, target: Ipv4Addr, step: Step) -> Resolution {
        match step {
            Step::Send(retry) => Resolution::Send(retry),
            Step::Wait => Resolution::Wait,
            Step::Abandon => match state.requests.remove(&target) {
                Some(request) => Resolution::Abandoned(request),
                None => Resolution::Gone,
            },
        }
    }
}

enum Step {
    Send(ArpRetry),
    Wait,
    Abandon,
}
