//! Background Expiry Sweeper
//!
//! Every running [`Table`] owns exactly one sweeper task. Instead of polling
//! on a fixed fine-grained tick, the sweeper sleeps until the table's single
//! timer deadline, which is kept at (roughly) the soonest pending expiry.
//!
//! ## Design
//!
//! The sweeper waits on three things at once:
//! 1. The timer deadline: scan the table, drop expired items, re-arm
//! 2. A re-arm notification: an insert shortened the timer, re-read it
//! 3. The shutdown signal: release the timer and exit
//!
//! ## Adaptive Frequency
//!
//! After every scan the timer is re-armed at the shortest remaining lifetime
//! among surviving items, capped by [`TableConfig::ceiling`]. A table full of
//! long-lived entries sleeps for the whole ceiling; a table with an imminent
//! expiry wakes almost immediately.

use super::Table;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tracing::{debug, trace};

/// Default maximum time the sweeper sleeps between scans.
pub const DEFAULT_CEILING: Duration = Duration::from_secs(10);

/// Default timer duration used when a deadline is already in the past.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_micros(1);

/// Configuration for a table's expiry sweeper.
///
/// # Example
///
/// ```
/// use tablecache::TableConfig;
/// use std::time::Duration;
///
/// let config = TableConfig::new().with_ceiling(Duration::from_secs(2));
/// assert_eq!(config.ceiling, Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Maximum interval between sweeps when no sooner expiry is pending (default: 10s)
    pub ceiling: Duration,

    /// Smallest timer duration, used for deadlines that already passed (default: 1µs)
    pub min_delay: Duration,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
            min_delay: DEFAULT_MIN_DELAY,
        }
    }
}

impl TableConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sweep ceiling.
    ///
    /// A zero ceiling is bumped to `min_delay` so the sweeper never spins.
    pub fn with_ceiling(mut self, ceiling: Duration) -> Self {
        self.ceiling = ceiling.max(self.min_delay);
        self
    }

    /// Sets the minimum timer duration.
    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay.max(Duration::from_nanos(1));
        self.ceiling = self.ceiling.max(self.min_delay);
        self
    }
}

/// The main sweeper loop.
///
/// Holds only a weak reference to the table so an abandoned table can be
/// dropped; the loop exits once the table is gone.
pub(crate) async fn sweeper_loop<K, V>(
    table: Weak<Table<K, V>>,
    rearm: Arc<Notify>,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let Some((deadline, tick)) = table.upgrade().map(|t| t.next_deadline()) else {
            break;
        };
        trace!(tick_ms = tick.as_millis() as u64, "Sweeper waiting");

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {
                let Some(table) = table.upgrade() else {
                    break;
                };
                table.sweep_expired(false);
            }
            _ = rearm.notified() => {
                trace!("Sweep timer re-armed");
            }
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    break;
                }
            }
        }
    }

    if let Some(table) = table.upgrade() {
        table.release_timer();
    }
}
