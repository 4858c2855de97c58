//! Cache Items
//!
//! An [`Item`] is one key/value pair plus the bookkeeping the sweeper needs
//! to decide when it goes away.
//!
//! ## Locking
//!
//! The key, the value, the keep-alive interval and the creation time never
//! change after construction, so they are read without any locking. Everything
//! else (expiry, last access, access count) lives behind the item's own mutex:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Item                                     │
//! │   key, value, interval, created_on       │  immutable
//! │  ┌────────────────────────────────────┐  │
//! │  │ Mutex<ItemState>                   │  │
//! │  │   expires_at, last_access, count   │  │  Table::get / sweeper
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! A `get` racing the sweeper on the same item is serialized by that mutex,
//! so the sweeper never sees a half-updated expiry.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Longest offset a deadline may have, roughly a century.
///
/// Keeps `Instant` arithmetic from overflowing on absurd intervals.
const MAX_OFFSET: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Returns `now + dur`, capping `dur` at [`MAX_OFFSET`].
#[inline]
pub(crate) fn deadline_after(now: Instant, dur: Duration) -> Instant {
    now + dur.min(MAX_OFFSET)
}

/// The mutable part of an item.
#[derive(Debug)]
struct ItemState {
    /// When this item becomes eligible for removal
    expires_at: Instant,
    /// Last successful `get` (None = never read)
    last_access: Option<Instant>,
    /// Number of successful `get` calls
    access_count: u64,
}

/// A single cached key/value pair with expiry bookkeeping.
///
/// Items are created by [`Table::add`](super::Table::add) and
/// [`Table::add_keep_alive`](super::Table::add_keep_alive) and handed back to
/// the caller as `Arc<Item>`.
#[derive(Debug)]
pub struct Item<K, V> {
    key: K,
    value: V,
    /// Sliding expiry interval (None = plain TTL)
    interval: Option<Duration>,
    created_on: Instant,
    state: Mutex<ItemState>,
}

impl<K, V> Item<K, V> {
    /// Creates an item that expires at a fixed instant.
    pub(crate) fn with_deadline(key: K, value: V, expires_at: Instant) -> Self {
        Self {
            key,
            value,
            interval: None,
            created_on: Instant::now(),
            state: Mutex::new(ItemState {
                expires_at,
                last_access: None,
                access_count: 0,
            }),
        }
    }

    /// Creates a keep-alive item expiring `interval` after its last access.
    ///
    /// A zero interval degrades to a plain item that is already due.
    pub(crate) fn keep_alive(key: K, value: V, interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            key,
            value,
            interval: (!interval.is_zero()).then_some(interval),
            created_on: now,
            state: Mutex::new(ItemState {
                expires_at: deadline_after(now, interval),
                last_access: None,
                access_count: 0,
            }),
        }
    }

    /// Returns the key.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Returns the value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the sliding interval for keep-alive items.
    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Returns true if reads push the expiry forward.
    #[inline]
    pub fn is_keep_alive(&self) -> bool {
        self.interval.is_some()
    }

    pub fn created_on(&self) -> Instant {
        self.created_on
    }

    /// Returns the current expiry instant.
    pub fn expires_at(&self) -> Instant {
        self.state.lock().expires_at
    }

    /// Returns the instant of the last `get`, if the item was ever read.
    pub fn last_access(&self) -> Option<Instant> {
        self.state.lock().last_access
    }

    /// Returns how many times the item was read through `get`.
    pub fn access_count(&self) -> u64 {
        self.state.lock().access_count
    }

    /// Checks whether the expiry instant has passed.
    ///
    /// Uses the same strict comparison as the sweeper: an item expiring
    /// exactly now is still alive.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.state.lock().expires_at < Instant::now()
    }

    /// Returns the time left until expiry, or zero if already due.
    pub fn remaining(&self) -> Duration {
        self.state
            .lock()
            .expires_at
            .saturating_duration_since(Instant::now())
    }

    /// Records a successful read.
    ///
    /// Bumps the access counter, stamps the access time and, for keep-alive
    /// items, moves the expiry to `now + interval`.
    pub(crate) fn record_access(&self) {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.access_count += 1;
        state.last_access = Some(now);
        if let Some(interval) = self.interval {
            state.expires_at = deadline_after(now, interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_item_fields() {
        let deadline = Instant::now() + Duration::from_secs(60);
        let item = Item::with_deadline("key", "value", deadline);

        assert_eq!(*item.key(), "key");
        assert_eq!(*item.value(), "value");
        assert_eq!(item.expires_at(), deadline);
        assert_eq!(item.interval(), None);
        assert!(!item.is_keep_alive());
        assert!(!item.is_expired());
        assert_eq!(item.access_count(), 0);
        assert!(item.last_access().is_none());
    }

    #[test]
    fn test_plain_item_expiry_is_fixed() {
        let deadline = Instant::now() + Duration::from_secs(60);
        let item = Item::with_deadline("key", "value", deadline);

        item.record_access();
        item.record_access();

        assert_eq!(item.expires_at(), deadline);
        assert_eq!(item.access_count(), 2);
        assert!(item.last_access().is_some());
    }

    #[test]
    fn test_past_deadline_is_expired() {
        let item = Item::with_deadline("key", "value", Instant::now() - Duration::from_secs(1));

        assert!(item.is_expired());
        assert_eq!(item.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_extends_on_access() {
        let item = Item::keep_alive("marco", "polo", Duration::from_millis(100));
        let first = item.expires_at();
        assert_eq!(first, item.created_on() + Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(60)).await;
        item.record_access();

        let second = item.expires_at();
        assert!(second > first);
        assert_eq!(second, Instant::now() + Duration::from_millis(100));
        assert_eq!(item.last_access(), Some(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_expiry_never_moves_backwards() {
        let item = Item::keep_alive("key", 1u32, Duration::from_millis(50));
        let mut last = item.expires_at();

        for _ in 0..5 {
            tokio::time::advance(Duration::from_millis(10)).await;
            item.record_access();
            let now = item.expires_at();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(item.access_count(), 5);
    }

    #[test]
    fn test_huge_interval_does_not_overflow() {
        let item = Item::keep_alive("key", "value", Duration::MAX);

        item.record_access();
        assert!(item.remaining() > Duration::from_secs(365 * 24 * 60 * 60));
    }

    #[test]
    fn test_zero_interval_is_not_keep_alive() {
        let item = Item::keep_alive("key", "value", Duration::ZERO);

        assert!(!item.is_keep_alive());
        assert_eq!(item.expires_at(), item.created_on());
    }
}
