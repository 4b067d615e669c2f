//! Background eviction of expired security state.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// A store that can drop its expired entries.
pub trait Sweep: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &'static str;

    /// Remove expired entries, returning how many were removed.
    fn sweep(&self) -> usize;
}

/// Sweep every target on a fixed interval until the handle is aborted.
///
/// The first pass runs one full interval after spawning. A zero interval is
/// raised to [`MIN_SWEEP_INTERVAL`].
pub fn spawn_periodic_sweep(targets: Vec<Arc<dyn Sweep>>, every: Duration) -> JoinHandle<()> {
    let every = if every < MIN_SWEEP_INTERVAL {
        tracing::warn!(?every, "Sweep interval too short, using minimum");
        MIN_SWEEP_INTERVAL
    } else {
        every
    };

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            for target in &targets {
                let removed = target.sweep();
                if removed > 0 {
                    tracing::debug!(store = target.name(), removed, "Swept expired entries");
                }
            }
        }
    })
}
