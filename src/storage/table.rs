//! Named Cache Table with Adaptive Expiry
//!
//! This module implements [`Table`], the core of tablecache: a concurrent
//! key/value map whose entries disappear once their expiry instant passes.
//!
//! ## Design Decisions
//!
//! 1. **Sharded map**: Items live in a `DashMap`, so operations on unrelated
//!    keys never contend on a global lock.
//! 2. **Per-item lock**: Each item guards its own expiry bookkeeping. Reads
//!    and the sweeper serialize per item, never per table.
//! 3. **One timer per table**: A single deadline, guarded by the table lock,
//!    tells the sweeper when to wake up next.
//! 4. **Soonest wins**: Inserts may only pull the deadline closer. Only a
//!    sweep may push it further out.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                          Table                             │
//! │  ┌──────────────────────────────┐   ┌───────────────────┐  │
//! │  │ DashMap<K, Arc<Item>>        │   │ Mutex<TableState> │  │
//! │  │  ┌──────┐ ┌──────┐ ┌──────┐  │   │  lifecycle        │  │
//! │  │  │Item  │ │Item  │ │Item  │  │   │  timer deadline   │  │
//! │  │  │Mutex │ │Mutex │ │Mutex │  │   │  timer tick       │  │
//! │  │  └──────┘ └──────┘ └──────┘  │   └───────────────────┘  │
//! │  └──────────────────────────────┘             ▲            │
//! └───────────────────▲───────────────────────────┼────────────┘
//!                     │ scan / delete             │ re-arm
//!              ┌──────┴───────────────────────────┴──────┐
//!              │     Sweeper (one Tokio task / table)    │
//!              └─────────────────────────────────────────┘
//! ```
//!
//! Lock order is always map shard, then item. The table lock is never held
//! while touching the map.

use super::expiry::{sweeper_loop, TableConfig};
use super::item::{deadline_after, Item};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace};

/// Errors returned by table operations.
///
/// A missing key is never an error; lookups return `Option` / `bool`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The table was stopped and cannot be used any more
    #[error("table '{name}' has been stopped")]
    Stopped { name: String },

    /// `init` was called outside a Tokio runtime
    #[error("no Tokio runtime available to run the expiry sweeper")]
    NoRuntime,
}

/// Lifecycle of a table. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Uninitialized,
    Running,
    Stopped,
}

/// The sweeper's single outstanding wake-up.
#[derive(Debug, Clone, Copy)]
struct Timer {
    deadline: Instant,
    /// The duration the deadline represented when it was armed
    tick: Duration,
}

impl Timer {
    fn after(now: Instant, tick: Duration) -> Self {
        Self {
            deadline: deadline_after(now, tick),
            tick,
        }
    }
}

/// Everything guarded by the table lock.
#[derive(Debug)]
struct TableState {
    lifecycle: Lifecycle,
    timer: Option<Timer>,
    sweeper: Option<JoinHandle<()>>,
}

/// A named, concurrent cache table with per-item expiry.
///
/// # Thread Safety
///
/// Wrap it in an `Arc` (the [`Registry`](super::Registry) does this for you)
/// and share it freely. None of the caller-facing operations await; they only
/// take an item's lock for a field read or update.
///
/// # Example
///
/// ```
/// use tablecache::{Table, TableConfig};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), tablecache::TableError> {
/// let table = Table::start("sessions", TableConfig::default())?;
///
/// table.add_with_ttl("bobby", "tables", Duration::from_secs(5))?;
/// table.add_keep_alive("marco", "polo", Duration::from_millis(100))?;
///
/// assert_eq!(table.get(&"bobby"), Some("tables"));
/// assert!(table.exists(&"marco"));
///
/// table.stop();
/// # Ok(())
/// # }
/// ```
pub struct Table<K, V> {
    name: String,
    config: TableConfig,
    items: DashMap<K, Arc<Item<K, V>>>,
    state: Mutex<TableState>,
    /// Wakes the sweeper when the timer was pulled closer
    rearm: Arc<Notify>,
    shutdown_tx: watch::Sender<bool>,
}

impl<K, V> std::fmt::Debug for Table<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("lifecycle", &state.lifecycle)
            .field("timer", &state.timer)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// Lifecycle plumbing that does not care about key/value types, so `Drop`
// can use it.
impl<K, V> Table<K, V> {
    /// Returns the table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sweeper configuration.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Returns true between `init` and `stop`.
    pub fn is_running(&self) -> bool {
        self.state.lock().lifecycle == Lifecycle::Running
    }

    /// Returns true once `stop` was called.
    pub fn is_stopped(&self) -> bool {
        self.state.lock().lifecycle == Lifecycle::Stopped
    }

    /// Stops the background sweeper.
    ///
    /// Safe to call any number of times; only the first call has an effect.
    /// Items still in the table are abandoned, not flushed. Once stopped the
    /// table rejects further inserts with [`TableError::Stopped`].
    pub fn stop(&self) {
        let mut state = self.state.lock();
        let lifecycle = state.lifecycle;
        let was_running = match lifecycle {
            Lifecycle::Stopped => return,
            // No sweeper to release the timer, do it here.
            Lifecycle::Uninitialized => {
                state.timer = None;
                false
            }
            Lifecycle::Running => true,
        };
        state.lifecycle = Lifecycle::Stopped;
        drop(state);

        self.shutdown_tx.send_replace(true);
        if was_running {
            info!(table = %self.name, "Background sweeper stopped");
        }
    }

    /// Called by the sweeper on its way out.
    pub(crate) fn release_timer(&self) {
        self.state.lock().timer = None;
        debug!(table = %self.name, "Sweep timer released");
    }

    /// Returns the armed deadline and its tick, arming one at the ceiling
    /// if none exists.
    pub(crate) fn next_deadline(&self) -> (Instant, Duration) {
        let ceiling = self.config.ceiling;
        let mut state = self.state.lock();
        let timer = state
            .timer
            .get_or_insert_with(|| Timer::after(Instant::now(), ceiling));
        (timer.deadline, timer.tick)
    }

    #[cfg(test)]
    pub(crate) fn timer_snapshot(&self) -> Option<(Instant, Duration)> {
        self.state.lock().timer.map(|t| (t.deadline, t.tick))
    }

    #[cfg(test)]
    pub(crate) fn sweeper_finished(&self) -> bool {
        self.state
            .lock()
            .sweeper
            .as_ref()
            .is_some_and(JoinHandle::is_finished)
    }
}

impl<K, V> Drop for Table<K, V> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an uninitialized table with the default configuration.
    ///
    /// Nothing is swept until [`init`](Self::init) runs.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, TableConfig::default())
    }

    /// Creates an uninitialized table with a custom configuration.
    pub fn with_config(name: impl Into<String>, config: TableConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            name: name.into(),
            config,
            items: DashMap::new(),
            state: Mutex::new(TableState {
                lifecycle: Lifecycle::Uninitialized,
                timer: None,
                sweeper: None,
            }),
            rearm: Arc::new(Notify::new()),
            shutdown_tx,
        }
    }

    /// Creates a table and starts its sweeper.
    pub fn start(name: impl Into<String>, config: TableConfig) -> Result<Arc<Self>, TableError> {
        let table = Arc::new(Self::with_config(name, config));
        table.init()?;
        Ok(table)
    }

    /// Starts the background sweeper.
    ///
    /// Arms the timer at the ceiling if nothing armed it yet, then spawns the
    /// sweep loop on the current Tokio runtime. Calling `init` on a running
    /// table does nothing.
    ///
    /// # Errors
    ///
    /// - [`TableError::Stopped`] if the table was already stopped
    /// - [`TableError::NoRuntime`] if there is no Tokio runtime to spawn on
    pub fn init(self: &Arc<Self>) -> Result<(), TableError> {
        let mut state = self.state.lock();
        match state.lifecycle {
            Lifecycle::Running => return Ok(()),
            Lifecycle::Stopped => return Err(self.stopped()),
            Lifecycle::Uninitialized => {}
        }

        let handle = Handle::try_current().map_err(|_| TableError::NoRuntime)?;

        let ceiling = self.config.ceiling;
        state
            .timer
            .get_or_insert_with(|| Timer::after(Instant::now(), ceiling));
        state.lifecycle = Lifecycle::Running;
        state.sweeper = Some(handle.spawn(sweeper_loop(
            Arc::downgrade(self),
            Arc::clone(&self.rearm),
            self.shutdown_tx.subscribe(),
        )));
        drop(state);

        info!(
            table = %self.name,
            ceiling_ms = ceiling.as_millis() as u64,
            "Background sweeper started"
        );
        Ok(())
    }

    fn stopped(&self) -> TableError {
        TableError::Stopped {
            name: self.name.clone(),
        }
    }

    fn ensure_not_stopped(&self) -> Result<(), TableError> {
        if self.is_stopped() {
            return Err(self.stopped());
        }
        Ok(())
    }

    /// Stores an item that expires at `expires_at`.
    ///
    /// An existing item under the same key is replaced, not merged.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Stopped`] if the table was stopped.
    pub fn add(&self, key: K, value: V, expires_at: Instant) -> Result<Arc<Item<K, V>>, TableError> {
        self.ensure_not_stopped()?;
        let item = Arc::new(Item::with_deadline(key.clone(), value, expires_at));
        Ok(self.store(key, item))
    }

    /// Stores an item that expires `ttl` from now.
    pub fn add_with_ttl(&self, key: K, value: V, ttl: Duration) -> Result<Arc<Item<K, V>>, TableError> {
        self.add(key, value, deadline_after(Instant::now(), ttl))
    }

    /// Stores a keep-alive item.
    ///
    /// The item expires `interval` after its last [`get`](Self::get), or
    /// after creation if it is never read.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Stopped`] if the table was stopped.
    pub fn add_keep_alive(
        &self,
        key: K,
        value: V,
        interval: Duration,
    ) -> Result<Arc<Item<K, V>>, TableError> {
        self.ensure_not_stopped()?;
        let item = Arc::new(Item::keep_alive(key.clone(), value, interval));
        Ok(self.store(key, item))
    }

    fn store(&self, key: K, item: Arc<Item<K, V>>) -> Arc<Item<K, V>> {
        self.items.insert(key, Arc::clone(&item));
        self.adjust_timer(&item);
        item
    }

    /// Pulls the sweep timer closer if `item` is due before it.
    ///
    /// Never pushes the deadline out: a long-lived insert after a short-lived
    /// one must not hide the short deadline.
    fn adjust_timer(&self, item: &Item<K, V>) {
        let dur = match item.interval() {
            Some(interval) => interval,
            None => item.remaining().max(self.config.min_delay),
        };

        let mut state = self.state.lock();
        if state.lifecycle == Lifecycle::Stopped {
            return;
        }

        let candidate = Timer::after(Instant::now(), dur);
        let sooner = match state.timer {
            None => true,
            Some(timer) => candidate.deadline < timer.deadline,
        };
        if !sooner {
            return;
        }
        state.timer = Some(candidate);
        drop(state);

        trace!(table = %self.name, tick_ms = dur.as_millis() as u64, "Sweep timer shortened");
        self.rearm.notify_one();
    }

    /// Checks whether `key` is present.
    ///
    /// Does not count as an access and does not refresh keep-alive items.
    pub fn exists(&self, key: &K) -> bool {
        self.items.contains_key(key)
    }

    /// Returns a clone of the value stored under `key`.
    ///
    /// Counts as an access: bumps the item's counter and, for keep-alive
    /// items, moves the expiry forward by the item's interval.
    pub fn get(&self, key: &K) -> Option<V> {
        // Release the shard guard before taking the item lock.
        let item = self.items.get(key).map(|entry| Arc::clone(entry.value()))?;
        item.record_access();
        Some(item.value().clone())
    }

    /// Returns the whole item without counting an access.
    pub fn item(&self, key: &K) -> Option<Arc<Item<K, V>>> {
        self.items.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Removes `key` immediately, returning the item if it was present.
    pub fn remove(&self, key: &K) -> Option<Arc<Item<K, V>>> {
        self.items.remove(key).map(|(_, item)| item)
    }

    /// Returns the number of items, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Runs a sweep right now and returns how many items were removed.
    ///
    /// The background sweeper calls the same routine on every timer fire.
    pub fn sweep(&self) -> usize {
        self.sweep_expired(true)
    }

    /// Scans every item, removes the expired ones and re-arms the timer at
    /// the shortest remaining lifetime (capped by the ceiling).
    pub(crate) fn sweep_expired(&self, notify: bool) -> usize {
        let now = Instant::now();
        let mut next = self.config.ceiling;
        let mut expired = Vec::new();

        for entry in self.items.iter() {
            let item = entry.value();
            let expires_at = item.expires_at();
            if expires_at < now {
                expired.push((entry.key().clone(), Arc::clone(item)));
            } else {
                next = next.min(expires_at - now);
            }
        }

        // Only delete what we inspected, and only if a concurrent `get`
        // did not push it back into the future meanwhile.
        let mut removed = 0;
        for (key, item) in expired {
            let gone = self
                .items
                .remove_if(&key, |_, current| {
                    Arc::ptr_eq(current, &item) && current.expires_at() < now
                })
                .is_some();
            if gone {
                removed += 1;
            }
        }

        let next = next.max(self.config.min_delay);
        self.rearm_after_sweep(now, next, notify);

        if removed > 0 {
            debug!(
                table = %self.name,
                expired = removed,
                remaining = self.items.len(),
                next_sweep_ms = next.as_millis() as u64,
                "Expired items cleaned up"
            );
        } else {
            trace!(
                table = %self.name,
                next_sweep_ms = next.as_millis() as u64,
                "Sweep found nothing to expire"
            );
        }

        removed
    }

    /// The only place the timer may move further out.
    ///
    /// A deadline still in the future at this point was pulled in by a
    /// concurrent insert during the scan; it is kept if it is sooner.
    fn rearm_after_sweep(&self, scanned_at: Instant, next: Duration, notify: bool) {
        let candidate = Timer::after(Instant::now(), next);

        let mut state = self.state.lock();
        if state.lifecycle == Lifecycle::Stopped {
            return;
        }
        if let Some(timer) = state.timer {
            if timer.deadline > scanned_at && timer.deadline <= candidate.deadline {
                return;
            }
        }
        state.timer = Some(candidate);
        drop(state);

        if notify {
            self.rearm.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table<&'static str, &'static str> {
        Table::new("test")
    }

    #[test]
    fn test_add_and_get() {
        let table = table();

        let item = table
            .add("bobby", "tables", Instant::now() + Duration::from_secs(5))
            .unwrap();
        assert_eq!(*item.key(), "bobby");
        assert_eq!(*item.value(), "tables");
        assert_eq!(table.get(&"bobby"), Some("tables"));
    }

    #[test]
    fn test_get_nonexistent() {
        let table = table();
        assert_eq!(table.get(&"nonexistent"), None);
        assert!(!table.exists(&"nonexistent"));
    }

    #[test]
    fn test_add_overwrites() {
        let table = table();
        let deadline = Instant::now() + Duration::from_secs(5);

        let first = table.add("key", "one", deadline).unwrap();
        let second = table.add("key", "two", deadline).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(&"key"), Some("two"));
    }

    #[test]
    fn test_get_counts_access_but_exists_does_not() {
        let table = table();
        table.add_keep_alive("key", "value", Duration::from_secs(1)).unwrap();

        assert!(table.exists(&"key"));
        assert!(table.exists(&"key"));
        let item = table.item(&"key").unwrap();
        assert_eq!(item.access_count(), 0);
        assert!(item.last_access().is_none());

        table.get(&"key");
        table.get(&"key");
        assert_eq!(item.access_count(), 2);
        assert!(item.last_access().is_some());
    }

    #[test]
    fn test_remove() {
        let table = table();
        table.add_with_ttl("key", "value", Duration::from_secs(5)).unwrap();

        assert!(table.remove(&"key").is_some());
        assert!(!table.exists(&"key"));
        assert!(table.remove(&"key").is_none());
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let table = table();
        table
            .add("old", "value", Instant::now() - Duration::from_millis(10))
            .unwrap();
        table.add_with_ttl("new", "value", Duration::from_secs(60)).unwrap();

        assert_eq!(table.sweep(), 1);
        assert!(!table.exists(&"old"));
        assert!(table.exists(&"new"));
    }

    #[test]
    fn test_sweep_never_removes_live_items() {
        let table: Table<String, usize> = Table::new("live");
        for i in 0..100 {
            table
                .add_with_ttl(format!("key{}", i), i, Duration::from_secs(60))
                .unwrap();
        }

        assert_eq!(table.sweep(), 0);
        assert_eq!(table.len(), 100);
    }

    #[test]
    fn test_timer_armed_on_first_add() {
        let table = table();
        assert!(table.timer_snapshot().is_none());

        table.add_with_ttl("key", "value", Duration::from_secs(3)).unwrap();

        let (_, tick) = table.timer_snapshot().unwrap();
        assert!(tick <= Duration::from_secs(3));
        assert!(tick > Duration::from_secs(2));
    }

    #[test]
    fn test_timer_only_shortens_on_add() {
        let table = table();
        table.add_with_ttl("short", "value", Duration::from_secs(1)).unwrap();
        let (short_deadline, _) = table.timer_snapshot().unwrap();

        table.add_with_ttl("long", "value", Duration::from_secs(60)).unwrap();
        table.add_keep_alive("alive", "value", Duration::from_secs(30)).unwrap();

        let (deadline, _) = table.timer_snapshot().unwrap();
        assert_eq!(deadline, short_deadline);
    }

    #[test]
    fn test_past_deadline_clamped_to_min_delay() {
        let table = table();
        table
            .add("past", "value", Instant::now() - Duration::from_secs(1))
            .unwrap();

        let (_, tick) = table.timer_snapshot().unwrap();
        assert_eq!(tick, table.config().min_delay);
    }

    #[test]
    fn test_sweep_rearms_at_soonest_survivor() {
        let table = table();
        table.add_with_ttl("a", "value", Duration::from_secs(2)).unwrap();
        table.add_with_ttl("b", "value", Duration::from_secs(5)).unwrap();

        table.sweep();

        let (_, tick) = table.timer_snapshot().unwrap();
        assert!(tick <= Duration::from_secs(2));
        assert!(tick > Duration::from_secs(1));
    }

    #[test]
    fn test_sweep_caps_at_ceiling() {
        let table: Table<&str, &str> =
            Table::with_config("capped", TableConfig::new().with_ceiling(Duration::from_secs(1)));
        table.add_with_ttl("key", "value", Duration::from_secs(3600)).unwrap();

        table.sweep();

        let (_, tick) = table.timer_snapshot().unwrap();
        assert_eq!(tick, Duration::from_secs(1));
    }

    #[test]
    fn test_next_deadline_arms_ceiling_when_idle() {
        let table = table();
        assert!(table.timer_snapshot().is_none());

        let (deadline, tick) = table.next_deadline();
        assert_eq!(tick, table.config().ceiling);
        assert_eq!(table.timer_snapshot(), Some((deadline, tick)));
    }

    #[test]
    fn test_next_deadline_reports_shortened_tick() {
        let table = table();
        table.add("past", "value", Instant::now() - Duration::from_secs(1)).unwrap();

        let (_, tick) = table.next_deadline();
        assert_eq!(tick, table.config().min_delay);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let table = table();
        table.stop();
        table.stop();
        table.stop();

        assert!(table.is_stopped());
        assert!(!table.is_running());
    }

    #[test]
    fn test_add_after_stop_is_rejected() {
        let table = table();
        table.stop();

        let err = table
            .add_with_ttl("key", "value", Duration::from_secs(1))
            .unwrap_err();
        assert_eq!(err, TableError::Stopped { name: "test".to_string() });
        assert!(table
            .add_keep_alive("key", "value", Duration::from_secs(1))
            .is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_init_without_runtime() {
        let table = Arc::new(table());
        assert_eq!(table.init(), Err(TableError::NoRuntime));
        assert!(!table.is_running());
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let table = Arc::new(table());
        table.init().unwrap();
        table.init().unwrap();

        assert!(table.is_running());
        let (_, tick) = table.timer_snapshot().unwrap();
        assert_eq!(tick, table.config().ceiling);
    }

    #[tokio::test]
    async fn test_init_after_stop_fails() {
        let table = Arc::new(table());
        table.stop();

        assert!(matches!(table.init(), Err(TableError::Stopped { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_scenario() {
        let table = Table::start("test", TableConfig::default()).unwrap();
        table
            .add("bobby", "tables", Instant::now() + Duration::from_secs(5))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(4990)).await;
        assert!(table.exists(&"bobby"));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!table.exists(&"bobby"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_scenario() {
        let table = Table::start("test_keepalive", TableConfig::default()).unwrap();
        table
            .add_keep_alive("marco", "polo", Duration::from_millis(100))
            .unwrap();

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(table.get(&"marco"), Some("polo"));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(table.exists(&"marco"));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!table.exists(&"marco"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_soonest_deadline_wins() {
        let table = Table::start("soonest", TableConfig::default()).unwrap();
        table.add_with_ttl("far", "value", Duration::from_secs(8)).unwrap();
        table.add_with_ttl("near", "value", Duration::from_millis(200)).unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(!table.exists(&"near"));
        assert!(table.exists(&"far"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_survives_while_read() {
        let table = Table::start("busy", TableConfig::default()).unwrap();
        table
            .add_keep_alive("hot", "value", Duration::from_millis(100))
            .unwrap();

        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(80)).await;
            assert_eq!(table.get(&"hot"), Some("value"));
        }

        tokio::time::sleep(Duration::from_millis(210)).await;
        assert!(!table.exists(&"hot"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exists_does_not_refresh_keep_alive() {
        let table = Table::start("probe", TableConfig::default()).unwrap();
        table
            .add_keep_alive("key", "value", Duration::from_millis(100))
            .unwrap();

        for _ in 0..5 {
            tokio::time::sleep(Duration::from_millis(30)).await;
            table.exists(&"key");
        }

        assert!(!table.exists(&"key"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_abandons_items() {
        let table = Table::start("abandon", TableConfig::default()).unwrap();
        table.add_with_ttl("key", "value", Duration::from_millis(10)).unwrap();

        table.stop();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // No sweeper any more: the expired item stays until someone removes it
        assert!(table.exists(&"key"));
        assert!(table.sweeper_finished());
        assert!(table.timer_snapshot().is_none());
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let table: Arc<Table<String, u64>> = Arc::new(Table::new("concurrent"));
        let mut handles = vec![];

        for i in 0..10 {
            let table = Arc::clone(&table);
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key-{}-{}", i, j);
                    table
                        .add_keep_alive(key.clone(), j, Duration::from_secs(60))
                        .unwrap();
                    assert_eq!(table.get(&key), Some(j));
                    table.sweep();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(table.len(), 1000);
    }
}
