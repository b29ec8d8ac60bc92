//! Query Engine
//!
//! Chunked scan over the id index: fetch, decode, filter, sort, limit.

use std::ops::ControlFlow;
use std::sync::Arc;

use serde_json::Value;

use crate::codec::DocumentCodec;
use crate::error::Result;
use crate::index::{DocumentId, KeyIndex, KeyScheme};
use crate::lock::LockMode;
use crate::substrate::Substrate;

use super::sort::sort_by_document;
use super::{Filter, FindOptions, SortComposition};

/// A match kept together with its JSON form until sorting is done
struct Hit<D> {
    document: Value,
    item: D,
}

/// Executes scans and counts for one collection
///
/// Fetches are sequential: chunking bounds how many ids are handled per
/// step, not how many reads are in flight.
pub struct QueryEngine<S, I> {
    substrate: Arc<S>,
    index: Arc<KeyIndex<S, I>>,
    scheme: KeyScheme,
    codec: DocumentCodec,
    chunk_size: usize,
    composition: SortComposition,
}

impl<S, I> QueryEngine<S, I>
where
    S: Substrate,
    I: DocumentId,
{
    pub fn new(
        substrate: Arc<S>,
        index: Arc<KeyIndex<S, I>>,
        scheme: KeyScheme,
        codec: DocumentCodec,
        chunk_size: usize,
        composition: SortComposition,
    ) -> Self {
        Self {
            substrate,
            index,
            scheme,
            codec,
            chunk_size: chunk_size.max(1),
            composition,
        }
    }

    /// Fetch and decode one document; `None` if absent or undecodable
    pub fn fetch(&self, id: &I) -> Result<Option<Value>> {
        let key = self.scheme.document_key(id);
        let stored = match self.substrate.get(&key)? {
            Some(stored) => stored,
            None => return Ok(None),
        };

        let decoded = self.codec.decode(&stored);
        if decoded.is_none() {
            tracing::warn!(%key, "skipping stored value that does not decode");
        }
        Ok(decoded)
    }

    /// Run a query, turning each match into a result with `materialize`
    ///
    /// Matches for which `materialize` returns `None` are skipped as if they
    /// had failed to decode, so they never count towards the limit.
    pub fn scan<D, F>(&self, filter: Option<&Filter>, options: &FindOptions, materialize: F) -> Result<Vec<D>>
    where
        F: Fn(&I, &Value) -> Option<D>,
    {
        if options.limit == Some(0) {
            return Ok(Vec::new());
        }

        let mut hits: Vec<Hit<D>> = Vec::new();
        let early_exit = if options.is_sorted() { None } else { options.limit };

        self.visit(filter, |id, document| {
            if let Some(item) = materialize(id, &document) {
                hits.push(Hit { document, item });
                if early_exit.is_some_and(|limit| hits.len() >= limit) {
                    return ControlFlow::Break(());
                }
            }
            ControlFlow::Continue(())
        })?;

        if options.is_sorted() {
            hits = sort_by_document(hits, &options.sort, self.composition, |hit| &hit.document);
        }
        if let Some(limit) = options.limit {
            hits.truncate(limit);
        }

        Ok(hits.into_iter().map(|hit| hit.item).collect())
    }

    /// Count matches accepted by `accept`; always a full scan
    pub fn count<F>(&self, filter: Option<&Filter>, accept: F) -> Result<usize>
    where
        F: Fn(&I, &Value) -> bool,
    {
        let mut count = 0;
        self.visit(filter, |id, document| {
            if accept(id, &document) {
                count += 1;
            }
            ControlFlow::Continue(())
        })?;
        Ok(count)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn composition(&self) -> SortComposition {
        self.composition
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Walk the index chunk by chunk, handing each decoded match to `visitor`
    fn visit<V>(&self, filter: Option<&Filter>, mut visitor: V) -> Result<()>
    where
        V: FnMut(&I, Value) -> ControlFlow<()>,
    {
        let ids = self.index.list(LockMode::Shared)?.into_ids();
        let match_all = Filter::All;
        let filter = filter.unwrap_or(&match_all);

        for (chunk_no, chunk) in ids.chunks(self.chunk_size).enumerate() {
            tracing::trace!(chunk = chunk_no, len = chunk.len(), "scanning chunk");

            for id in chunk {
                let document = match self.fetch(id)? {
                    Some(document) => document,
                    None => continue,
                };

                if !filter.matches(&document) {
                    continue;
                }

                if visitor(id, document).is_break() {
                    return Ok(());
                }
            }
        }

        Ok(())
    }
}
