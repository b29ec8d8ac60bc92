//! Query Module
//!
//! Chunked scans over the id index with in-memory filtering and sorting.
//!
//! # Execution Flow
//!
//! 1. Read the live id list (shared lock, released right after the read)
//! 2. Walk the ids in fixed-size chunks
//! 3. Fetch and decode each document, one at a time
//! 4. Skip documents that do not decode
//! 5. Apply the filter
//! 6. Without sort: stop as soon as `limit` matches are collected
//! 7. With sort: collect every match, sort, then truncate to `limit`

mod engine;
mod filter;
mod sort;

pub use engine::QueryEngine;
pub use filter::{resolve_path, Filter};
pub use sort::{compare_documents, sort_by_document, SortComposition, SortDirection, SortKey};

/// Options for `find_all` / `find_one`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Maximum number of documents returned; `None` is unbounded
    pub limit: Option<usize>,

    /// Sort keys in priority order; empty means index order
    pub sort: Vec<SortKey>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Append a sort key
    pub fn sort_by(mut self, key: SortKey) -> Self {
        self.sort.push(key);
        self
    }

    /// Replace all sort keys
    pub fn sort(mut self, keys: Vec<SortKey>) -> Self {
        self.sort = keys;
        self
    }

    pub fn is_sorted(&self) -> bool {
        !self.sort.is_empty()
    }
}
