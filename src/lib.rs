//! # tablecache - Named In-Process Cache Tables with Adaptive Expiry
//!
//! tablecache stores key/value pairs in named, concurrency-safe tables and
//! evicts each entry once its deadline passes. Entries either expire at a
//! fixed instant (TTL) or stay alive for as long as they keep being read
//! (keep-alive, a.k.a. sliding expiry).
//!
//! ## Features
//!
//! - **Per-item TTL**: Every entry carries its own absolute deadline
//! - **Keep-Alive**: Reads push a sliding entry's deadline forward
//! - **Adaptive Sweeper**: One background Tokio task per table, sleeping
//!   until the soonest known expiry instead of polling on a fixed tick
//! - **Fine-Grained Locking**: Sharded map plus one lock per item
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              tablecache                                 │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────────────────────────────────────┐     │
//! │  │  Registry   │───>│                  Table                      │     │
//! │  │ name->Table │    │  ┌────────┐ ┌────────┐ ┌────────┐ ┌───────┐ │     │
//! │  └─────────────┘    │  │ Item   │ │ Item   │ │ Item   │ │ ...   │ │     │
//! │                     │  │ Mutex  │ │ Mutex  │ │ Mutex  │ │       │ │     │
//! │                     │  └────────┘ └────────┘ └────────┘ └───────┘ │     │
//! │                     │                 timer (table lock)          │     │
//! │                     └─────────────────────────────────────────────┘     │
//! │                                         ▲                               │
//! │                     ┌───────────────────┴─────────────────────────┐     │
//! │                     │               Sweeper                       │     │
//! │                     │      (Background Tokio Task per Table)      │     │
//! │                     └─────────────────────────────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use tablecache::Registry;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), tablecache::TableError> {
//! let registry: Registry<&str, &str> = Registry::new();
//! let table = registry.table("test")?;
//!
//! // Gone about five seconds from now
//! table.add_with_ttl("bobby", "tables", Duration::from_secs(5))?;
//!
//! // Gone 100ms after the last `get`
//! table.add_keep_alive("marco", "polo", Duration::from_millis(100))?;
//! assert_eq!(table.get(&"marco"), Some("polo"));
//!
//! // `exists` never refreshes a keep-alive entry
//! assert!(table.exists(&"marco"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Design Highlights
//!
//! ### Soonest-Wins Timer
//!
//! Each table has a single wake-up deadline. Inserts can only pull it closer;
//! only a sweep can push it further out. A long-lived insert after a
//! short-lived one therefore never hides the short deadline.
//!
//! ### No Lazy Expiry
//!
//! Reads do not check deadlines. An entry is visible until the sweeper
//! removes it, which happens shortly after its deadline (the sweeper wakes at
//! the soonest known expiry).

pub mod storage;

// Re-export commonly used types for convenience
pub use storage::{Item, Registry, Table, TableConfig, TableError};

/// Version of tablecache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
