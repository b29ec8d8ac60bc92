//! Substrate Module
//!
//! The primitive key-value layer every store is built on.
//!
//! ## Contract
//! - One flat namespace of string keys to string values
//! - `get` / `set` / `remove` / `clear`, each independently atomic
//! - No range scans, no batch operations, no cross-key atomicity
//!
//! Everything database-like (ordered iteration, sorting, locking) is
//! synthesized above this layer.

mod file;
mod memory;

use std::sync::Arc;

use crate::error::Result;

pub use file::FileSubstrate;
pub use memory::MemorySubstrate;

/// A flat string key-value store with atomic single-key operations
pub trait Substrate: Send + Sync {
    /// Read the value stored under `key`, `None` when absent
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> Result<()>;

    /// Remove every key
    fn clear(&self) -> Result<()>;

    /// Identifies this substrate instance for per-collection locking
    ///
    /// Wrappers that share one underlying store must report its identity.
    fn identity(&self) -> usize {
        self as *const Self as *const () as usize
    }
}

impl<S: Substrate + ?Sized> Substrate for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn identity(&self) -> usize {
        (**self).identity()
    }
}
