//! Background Expiry Sweeper
//!
//! Every shard can run its own sweeper: a Tokio task that wakes up on a
//! fixed interval and removes the shard's expired records. This is "active
//! expiry", as opposed to the "lazy expiry" that happens on reads.
//!
//! ## Why Do We Need This?
//!
//! Lazy expiry only reclaims records that are read again. A record written
//! once and never touched would otherwise stay in memory forever.
//!
//! ## Lifecycle
//!
//! ```text
//!            start (only if Idle)
//!   ┌──────┐ ──────────────────────> ┌─────────┐
//!   │ Idle │                         │ Running │ ── tick ──> delete_expired()
//!   └──────┘ <────────────────────── └─────────┘
//!            stop (only if Running)
//! ```
//!
//! Stopping sends on a `watch` channel. The loop selects on that channel
//! ahead of the timer, so it exits as soon as it is next polled and never
//! runs another pass. Dropping the [`ExpirySweeper`] handle has the same
//! effect, which is how a dropped cache releases its tasks.

use crate::storage::record::FAR_FUTURE;
use crate::storage::shard::Shard;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Sweeper state owned by each shard.
#[derive(Debug, Default)]
pub(crate) enum SweeperState {
    #[default]
    Idle,
    Running(ExpirySweeper),
}

/// A handle to a running shard sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub(crate) struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Spawns the sweep loop for `shard` on `runtime`.
    ///
    /// The first pass runs one full `interval` after spawning.
    pub fn spawn<V>(shard: Arc<Shard<V>>, interval: Duration, runtime: &Handle) -> Self
    where
        V: Send + Sync + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        runtime.spawn(sweeper_loop(shard, interval, shutdown_rx));

        Self { shutdown_tx }
    }

    /// Signals the loop to exit.
    pub fn stop(&self) {
        // The receiver is gone if the loop already exited
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The per-shard sweep loop.
async fn sweeper_loop<V>(
    shard: Arc<Shard<V>>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // Periods beyond FAR_FUTURE would overflow the tick arithmetic
    let period = interval.min(FAR_FUTURE);
    let now = Instant::now();
    let start = now.checked_add(period).unwrap_or_else(|| now + FAR_FUTURE);

    let mut ticker = time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!(shard = shard.index(), "Expiry sweeper received shutdown signal");
                    return;
                }
            }
            _ = ticker.tick() => {
                let removed = shard.delete_expired();
                if removed > 0 {
                    debug!(
                        shard = shard.index(),
                        removed = removed,
                        remaining = shard.len(),
                        "Expired records swept"
                    );
                }
            }
        }
    }
}
