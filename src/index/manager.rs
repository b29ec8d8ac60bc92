//! Key Index Manager
//!
//! Maintains the ordered list of live document ids under the collection's
//! index key. The substrate has no append primitive, so every mutation
//! rewrites the whole record.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{PrefDbError, Result};
use crate::lock::{coordinator_for, LockCoordinator, LockGuard, LockMode};
use crate::substrate::Substrate;

/// Primary id index for one collection
///
/// ## Concurrency:
/// - `list(Shared)`: lock held only around the substrate read
/// - `list(Exclusive)`: lock travels with the returned `IndexRecord` and is
///   held across the caller's read-modify-persist sequence
/// - Every `KeyIndex` on the same substrate and key shares one coordinator
pub struct KeyIndex<S, I> {
    substrate: Arc<S>,

    /// Substrate key of the index record
    key: String,

    /// Guards the index record; shared with every other handle on the
    /// same substrate and key
    lock: Arc<LockCoordinator>,

    _ids: PhantomData<fn() -> I>,
}

impl<S, I> KeyIndex<S, I>
where
    S: Substrate,
    I: Serialize + DeserializeOwned + PartialEq,
{
    /// Create an index stored under `key`
    pub fn new(substrate: Arc<S>, key: impl Into<String>) -> Self {
        let key = key.into();
        let lock = coordinator_for(substrate.identity(), &key);
        Self {
            substrate,
            key,
            lock,
            _ids: PhantomData,
        }
    }

    /// Read the id list in the requested mode
    ///
    /// A missing index key reads as an empty list. For `Shared` the lock is
    /// already released when this returns; for `Exclusive` it is released
    /// when the record is released or dropped.
    pub fn list(&self, mode: LockMode) -> Result<IndexRecord<'_, S, I>> {
        let guard = self.lock.lock(mode);
        let ids = self.read_ids()?;

        let guard = match mode {
            LockMode::Shared => {
                guard.release();
                None
            }
            LockMode::Exclusive => Some(guard),
        };

        Ok(IndexRecord {
            index: self,
            ids,
            guard,
        })
    }

    /// Snapshot of the live ids (shared read)
    pub fn ids(&self) -> Result<Vec<I>> {
        Ok(self.list(LockMode::Shared)?.into_ids())
    }

    /// Substrate key of the index record
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Coordinator guarding this index
    pub fn lock(&self) -> &LockCoordinator {
        &self.lock
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn read_ids(&self) -> Result<Vec<I>> {
        match self.substrate.get(&self.key)? {
            None => Ok(Vec::new()),
            Some(text) if text.is_empty() || text == "null" => Ok(Vec::new()),
            Some(text) => serde_json::from_str(&text).map_err(|e| {
                PrefDbError::Serialization(format!("corrupt index record {}: {}", self.key, e))
            }),
        }
    }

    fn write_ids(&self, ids: &[I]) -> Result<()> {
        let text =
            serde_json::to_string(ids).map_err(|e| PrefDbError::Serialization(e.to_string()))?;
        self.substrate.set(&self.key, &text)?;
        tracing::debug!(key = %self.key, len = ids.len(), "index record persisted");
        Ok(())
    }
}

/// In-memory copy of the index record
///
/// Obtained from `KeyIndex::list`. Mutations only touch the copy until
/// `persist` writes it back, which requires the record to have been listed
/// in `Exclusive` mode.
pub struct IndexRecord<'a, S, I> {
    index: &'a KeyIndex<S, I>,
    ids: Vec<I>,
    guard: Option<LockGuard<'a>>,
}

impl<'a, S, I> IndexRecord<'a, S, I>
where
    S: Substrate,
    I: Serialize + DeserializeOwned + PartialEq,
{
    /// Ids in insertion order
    pub fn ids(&self) -> &[I] {
        &self.ids
    }

    /// Consume the record, releasing any lock, and keep the ids
    pub fn into_ids(mut self) -> Vec<I> {
        std::mem::take(&mut self.ids)
    }

    /// Number of ids in the record
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if the record holds no ids
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Check if `id` is in the record
    pub fn contains(&self, id: &I) -> bool {
        self.ids.contains(id)
    }

    /// Append `id` unless already present; returns whether it was added
    pub fn add(&mut self, id: I) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Remove the occurrence of `id`; returns whether it was present
    pub fn remove(&mut self, id: &I) -> bool {
        match self.ids.iter().position(|candidate| candidate == id) {
            Some(pos) => {
                self.ids.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Drop every id
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Write the whole record back to the substrate
    pub fn persist(&self) -> Result<()> {
        match self.guard.as_ref().and_then(LockGuard::mode) {
            Some(LockMode::Exclusive) => self.index.write_ids(&self.ids),
            _ => Err(PrefDbError::Lock(format!(
                "index record {} persisted without exclusive lock",
                self.index.key
            ))),
        }
    }

    /// Whether this record still holds the exclusive lock
    pub fn is_exclusive(&self) -> bool {
        self.guard.is_some()
    }

    /// Release the lock (if held) and discard the record
    pub fn release(self) {}
}
