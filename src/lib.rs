//! # prefdb
//!
//! A document store layered on a primitive string key-value substrate:
//! - Keyed CRUD for any serde-serializable document type
//! - Filtered, multi-key sorted and limited queries via chunked scans
//! - Reader/writer locking of the id index under concurrent writers
//! - Optional text-safe compression of stored documents
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Store (CRUD)                          │
//! │   insert · find_by_uid · find_one · find_all · count         │
//! │   delete · delete_all                                        │
//! └──────────────┬───────────────────────────────┬───────────────┘
//!                │                               │
//!                ▼                               ▼
//!        ┌──────────────┐               ┌─────────────────┐
//!        │ QueryEngine  │──────────────►│    KeyIndex     │
//!        │ (chunk scan) │               │   (id record)   │
//!        └──────┬───────┘               └────────┬────────┘
//!               │                                │
//!               ▼                                ▼
//!        ┌──────────────┐               ┌─────────────────┐
//!        │DocumentCodec │               │ LockCoordinator │
//!        │ (JSON + LZ4) │               │  (shared/excl)  │
//!        └──────┬───────┘               └─────────────────┘
//!               │
//!               ▼
//!        ┌──────────────────────────────────────────────┐
//!        │     Substrate (get / set / remove / clear)   │
//!        └──────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use prefdb::{Config, Filter, FindOptions, MemorySubstrate, SortKey, Store};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize, PartialEq)]
//! struct Reading {
//!     sensor: String,
//!     t: u64,
//! }
//!
//! let store: Store<MemorySubstrate, String, Reading> =
//!     Store::open(MemorySubstrate::new(), Config::default())?;
//!
//! store.insert("a".to_string(), Reading { sensor: "wlan".into(), t: 100 })?;
//! store.insert("b".to_string(), Reading { sensor: "ble".into(), t: 200 })?;
//!
//! let latest = store.find_one(None, &FindOptions::new().sort_by(SortKey::desc("t")))?;
//! assert_eq!(latest.map(|r| r.t), Some(200));
//! assert_eq!(store.count(Some(&Filter::eq("sensor", "wlan")))?, 1);
//! # Ok::<(), prefdb::PrefDbError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod substrate;
pub mod lock;
pub mod index;
pub mod codec;
pub mod query;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PrefDbError, Result};
pub use config::Config;
pub use lock::{LockCoordinator, LockMode};
pub use query::{Filter, FindOptions, SortComposition, SortDirection, SortKey};
pub use store::Store;
pub use substrate::{FileSubstrate, MemorySubstrate, Substrate};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of prefdb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
