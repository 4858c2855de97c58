//! Storage Module
//!
//! This module provides the building blocks of tablecache: cache items, the
//! table that holds them, the background sweeper that expires them and the
//! registry that hands out named tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Registry                             │
//! │           "sessions" ──┐        "users" ──┐                 │
//! └────────────────────────┼──────────────────┼─────────────────┘
//!                          ▼                  ▼
//!              ┌──────────────────┐  ┌──────────────────┐
//!              │ Table            │  │ Table            │
//!              │  DashMap<K,Item> │  │  DashMap<K,Item> │
//!              │  timer           │  │  timer           │
//!              └────────▲─────────┘  └────────▲─────────┘
//!                       │                     │
//!              ┌────────┴─────────┐  ┌────────┴─────────┐
//!              │ Sweeper task     │  │ Sweeper task     │
//!              └──────────────────┘  └──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use tablecache::storage::{Table, TableConfig};
//! use std::time::Duration;
//!
//! // Without `init` nothing is swept, but the map works as usual.
//! let table: Table<&str, u32> = Table::new("scores");
//! table.add_with_ttl("alice", 10, Duration::from_secs(60)).unwrap();
//! assert_eq!(table.get(&"alice"), Some(10));
//! ```

pub mod expiry;
pub mod item;
pub mod registry;
pub mod table;

// Re-export commonly used types
pub use expiry::{TableConfig, DEFAULT_CEILING, DEFAULT_MIN_DELAY};
pub use item::Item;
pub use registry::Registry;
pub use table::{Table, TableError};
