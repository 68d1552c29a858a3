use crate::{Router, Transmit};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::debug;

/// Spawns the cache maintenance task onto the current tokio runtime. Every
/// `sweep_period` it expires stale ARP entries, re-sends due requests and gives up on
/// the ones out of attempts. The task runs for as long as the runtime does.
pub fn spawn_sweeper<T: Transmit + 'static>(router: Arc<Router<T>>) -> JoinHandle<()> {
    let period = router.config().sweep_period;
    tokio::spawn(async move {
        debug!(?period, "ARP cache sweeper started");
        let mut interval = time::interval(period);
        loop {
            interval.tick().await;
            router.sweep();
        }
    })
}
