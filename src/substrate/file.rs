//! File-backed substrate
//!
//! A flat preferences file: the whole key-value map is kept in memory and
//! rewritten to disk as one JSON object on every mutation.
//!
//! ## File Format
//! ```text
//! {"default.user_keys":"[\"a\"]","default.user.a":"{...}"}
//! ```
//!
//! Each mutation writes a sibling `.tmp` file, fsyncs it, and renames it over
//! the target, so a crash leaves either the old or the new map on disk.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{PrefDbError, Result};

use super::Substrate;

/// Substrate persisted to a single JSON file
pub struct FileSubstrate {
    /// Target file path
    path: PathBuf,

    /// Current contents; the mutex also serializes file rewrites
    values: Mutex<BTreeMap<String, String>>,
}

impl FileSubstrate {
    /// Open or create a substrate file
    ///
    /// A missing file is an empty map. Parent directories are created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let values = if path.exists() {
            let bytes = fs::read(&path)?;
            if bytes.is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_slice(&bytes).map_err(|e| {
                    PrefDbError::Substrate(format!(
                        "unreadable substrate file {}: {}",
                        path.display(),
                        e
                    ))
                })?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), keys = values.len(), "opened file substrate");

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Get the substrate file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    /// Check if no keys are stored
    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Apply `mutate` to a copy of the map, persist it, then publish it
    ///
    /// The in-memory map only changes once the file rename succeeded.
    fn mutate<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut values = self.values.lock();
        let mut next = values.clone();
        mutate(&mut next);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let tmp_path = self.path.with_extension("tmp");

        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, values)
                .map_err(|e| PrefDbError::Serialization(e.to_string()))?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl Substrate for FileSubstrate {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.values.lock().contains_key(key) {
            return Ok(());
        }
        self.mutate(|values| {
            values.remove(key);
        })
    }

    fn clear(&self) -> Result<()> {
        self.mutate(|values| values.clear())
    }
}
