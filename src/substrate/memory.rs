//! In-memory substrate
//!
//! HashMap behind a RwLock. Used by embedders that only need process-local
//! storage and by the test suite.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;

use super::Substrate;

/// Process-local substrate
///
/// ## Concurrency:
/// - `get`: read lock (many concurrent readers)
/// - `set` / `remove` / `clear`: write lock
#[derive(Debug, Default)]
pub struct MemorySubstrate {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySubstrate {
    /// Create an empty substrate
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    /// Check if no keys are stored
    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Check if a key is stored
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    /// Sorted list of all stored keys (for testing and debugging)
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Substrate for MemorySubstrate {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.values.write().clear();
        Ok(())
    }
}
