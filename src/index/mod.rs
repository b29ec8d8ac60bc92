//! Index Module
//!
//! Substrate key derivation and the primary id index.
//!
//! ## Responsibilities
//! - Derive the index key and per-document keys for one collection
//! - Keep the ordered list of live ids as one serialized record
//! - Route every index access through the lock coordinator
//!
//! ## Key Layout
//! ```text
//! {namespace}.{prefix}_keys      → ["id1","id2",...]   (index record)
//! {namespace}.{prefix}.{id}      → document text       (one per document)
//! ```

mod keys;
mod manager;

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use keys::{type_prefix, KeyScheme};
pub use manager::{IndexRecord, KeyIndex};

/// Requirements on document identifiers
///
/// Ids are stored as JSON inside the index record and rendered with
/// `Display` into document keys.
pub trait DocumentId: Serialize + DeserializeOwned + Display + PartialEq + Clone + Send + Sync {}

impl<T> DocumentId for T where T: Serialize + DeserializeOwned + Display + PartialEq + Clone + Send + Sync {}
