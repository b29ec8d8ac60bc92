//! Store Module
//!
//! The public document-store contract for one collection.
//!
//! ## Responsibilities
//! - Keyed CRUD on top of a flat string substrate
//! - Filtered, sorted and limited queries through the query engine
//! - Keep the id index consistent under concurrent writers
//!
//! ## Write Ordering
//! ```text
//! insert:  set(document) ──► [exclusive: read index, add id, persist index]
//! delete:  [exclusive: read index, remove id, persist index] ──► remove(document)
//! ```
//! The document write and the index update are two separate critical
//! sections. A crash between them can leave a document value with no index
//! entry; such a value is unreachable by scans and never reported as present.
//!
//! ## Timeouts
//! No operation can be cancelled or timed out. Callers that need a deadline
//! race the operation on another thread and abandon it on timeout; the
//! abandoned operation still runs to completion.
//!
//! ```
//! use std::sync::{mpsc, Arc};
//! use std::time::Duration;
//!
//! use prefdb::{Config, MemorySubstrate, Store};
//!
//! let store: Arc<Store<MemorySubstrate, String, serde_json::Value>> =
//!     Arc::new(Store::open(MemorySubstrate::new(), Config::default())?);
//!
//! let (tx, rx) = mpsc::channel();
//! let worker = Arc::clone(&store);
//! std::thread::spawn(move || {
//!     let _ = tx.send(worker.count(None));
//! });
//!
//! match rx.recv_timeout(Duration::from_secs(5)) {
//!     Ok(result) => assert_eq!(result?, 0),
//!     Err(_) => println!("count abandoned"),
//! }
//! # Ok::<(), prefdb::PrefDbError>(())
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::codec::DocumentCodec;
use crate::config::Config;
use crate::error::{PrefDbError, Result};
use crate::index::{DocumentId, KeyIndex, KeyScheme};
use crate::lock::LockMode;
use crate::query::{Filter, FindOptions, QueryEngine};
use crate::substrate::Substrate;

/// A collection of `T` documents keyed by `I`, stored in substrate `S`
///
/// ## Concurrency Model
///
/// - **Index mutations** (insert/delete): exclusive lock around the whole
///   read-modify-persist of the index record
/// - **Index reads** (queries, counts): shared lock around the index read
///   only; document fetches run unlocked
/// - **Document values**: independently keyed, never locked
///
/// All methods take `&self`; share a store between threads with `Arc`.
pub struct Store<S, I, T> {
    config: Config,
    scheme: KeyScheme,
    codec: DocumentCodec,
    substrate: Arc<S>,
    index: Arc<KeyIndex<S, I>>,
    engine: QueryEngine<S, I>,
    _documents: PhantomData<fn() -> T>,
}

impl<S, I, T> Store<S, I, T>
where
    S: Substrate,
    I: DocumentId,
    T: Serialize + DeserializeOwned,
{
    /// Open a store over `substrate`
    pub fn open(substrate: S, config: Config) -> Result<Self> {
        Self::open_shared(Arc::new(substrate), config)
    }

    /// Open a store over a substrate shared with other stores
    pub fn open_shared(substrate: Arc<S>, config: Config) -> Result<Self> {
        config.validate()?;

        let scheme = KeyScheme::for_type::<T>(&config);
        let codec = DocumentCodec::new(config.compress);
        let index = Arc::new(KeyIndex::new(Arc::clone(&substrate), scheme.index_key()));
        let engine = QueryEngine::new(
            Arc::clone(&substrate),
            Arc::clone(&index),
            scheme.clone(),
            codec,
            config.chunk_size,
            config.sort_composition,
        );

        tracing::debug!(
            collection = scheme.base(),
            chunk_size = config.chunk_size,
            compress = config.compress,
            "store opened"
        );

        Ok(Self {
            config,
            scheme,
            codec,
            substrate,
            index,
            engine,
            _documents: PhantomData,
        })
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store `doc` under `id` and register `id` in the index
    ///
    /// Steps:
    /// 1. Encode and write the document value
    /// 2. Acquire the index exclusively
    /// 3. Append `id` if absent and persist the index
    /// 4. Release (also on error)
    pub fn insert(&self, id: I, doc: T) -> Result<T> {
        let key = self.scheme.document_key(&id);
        let stored = self.codec.encode(&doc)?;
        self.substrate.set(&key, &stored)?;

        let mut record = self.index.list(LockMode::Exclusive)?;
        if record.add(id) {
            record.persist()?;
        }
        record.release();

        tracing::trace!(%key, "document inserted");
        Ok(doc)
    }

    /// Remove `id` from the index, then remove its document value
    ///
    /// Deleting an unknown id is not an error.
    pub fn delete(&self, id: &I) -> Result<()> {
        {
            let mut record = self.index.list(LockMode::Exclusive)?;
            if record.remove(id) {
                record.persist()?;
            }
        }

        let key = self.scheme.document_key(id);
        self.substrate.remove(&key)?;

        tracing::trace!(%key, "document deleted");
        Ok(())
    }

    /// Delete every document, or every document matching `filter`
    ///
    /// Without a filter this is a single substrate `clear`, which empties
    /// the whole substrate, not only this collection. With a filter the
    /// matches are exactly those `find_all` would return, and each one is
    /// deleted independently, with its own index lock.
    pub fn delete_all(&self, filter: Option<&Filter>) -> Result<()> {
        match filter {
            None => {
                let _exclusive = self.index.lock().lock(LockMode::Exclusive);
                self.substrate.clear()?;
                tracing::info!(collection = self.scheme.base(), "substrate cleared");
            }
            Some(filter) => {
                let ids = self.engine.scan(Some(filter), &FindOptions::new(), |id, document| {
                    Self::materialize(&self.scheme.document_key(id), document).map(|_| id.clone())
                })?;
                let deleted = ids.len();
                for id in &ids {
                    self.delete(id)?;
                }
                tracing::info!(collection = self.scheme.base(), deleted, "filtered delete");
            }
        }
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch the document stored under `id`
    ///
    /// Reads the document key directly, without consulting the index.
    /// Fails with `NotFound` if the value is absent or does not decode.
    pub fn find_by_uid(&self, id: &I) -> Result<T> {
        let key = self.scheme.document_key(id);
        let not_found = || PrefDbError::NotFound { key: key.clone() };

        let document = self.engine.fetch(id)?.ok_or_else(not_found)?;
        Self::materialize(&key, &document).ok_or_else(not_found)
    }

    /// First match for `filter` under `options.sort`; `None` when nothing matches
    ///
    /// Any limit in `options` is replaced by 1.
    pub fn find_one(&self, filter: Option<&Filter>, options: &FindOptions) -> Result<Option<T>> {
        let options = FindOptions {
            limit: Some(1),
            sort: options.sort.clone(),
        };
        Ok(self.find_all(filter, &options)?.into_iter().next())
    }

    /// All matches for `filter`, sorted and limited per `options`
    pub fn find_all(&self, filter: Option<&Filter>, options: &FindOptions) -> Result<Vec<T>> {
        self.engine.scan(filter, options, |id, document| {
            Self::materialize(&self.scheme.document_key(id), document)
        })
    }

    /// Number of documents matching `filter`
    pub fn count(&self, filter: Option<&Filter>) -> Result<usize> {
        self.engine.count(filter, |id, document| {
            Self::materialize(&self.scheme.document_key(id), document).is_some()
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Snapshot of the live ids in insertion order
    pub fn ids(&self) -> Result<Vec<I>> {
        self.index.ids()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the key scheme of this collection
    pub fn keys(&self) -> &KeyScheme {
        &self.scheme
    }

    /// Get the underlying substrate
    pub fn substrate(&self) -> &Arc<S> {
        &self.substrate
    }

    /// Get the index (for testing and debugging)
    pub fn index(&self) -> &KeyIndex<S, I> {
        &self.index
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Convert a decoded document into `T`, logging values that do not fit
    fn materialize(key: &str, document: &Value) -> Option<T> {
        match T::deserialize(document) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(%key, error = %e, "stored document does not match the collection type");
                None
            }
        }
    }
}
