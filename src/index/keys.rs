//! Key scheme
//!
//! Deterministic substrate keys for a collection. The layout must stay
//! bit-exact: stores written by earlier versions are read back through it.

use std::fmt::Display;

use crate::config::Config;

/// Derives substrate keys for one namespace/prefix collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScheme {
    /// `{namespace}.{prefix}`, lower-cased as a whole
    base: String,
}

impl KeyScheme {
    const INDEX_SUFFIX: &'static str = "_keys";

    /// Build a scheme from an explicit namespace and prefix
    pub fn new(namespace: &str, prefix: &str) -> Self {
        Self {
            base: format!("{}.{}", namespace, prefix).to_lowercase(),
        }
    }

    /// Build the scheme for documents of type `T`
    ///
    /// Uses the configured prefix, falling back to the type name.
    pub fn for_type<T: ?Sized>(config: &Config) -> Self {
        match &config.prefix {
            Some(prefix) => Self::new(&config.namespace, prefix),
            None => Self::new(&config.namespace, &type_prefix::<T>()),
        }
    }

    /// `{namespace}.{prefix}`
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Key holding the serialized id list
    pub fn index_key(&self) -> String {
        format!("{}{}", self.base, Self::INDEX_SUFFIX)
    }

    /// Key holding the document with the given id
    ///
    /// The id keeps its case; only the base is lower-cased.
    pub fn document_key(&self, id: &impl Display) -> String {
        format!("{}.{}", self.base, id)
    }
}

/// Bare name of `T`: module path and generic arguments removed
///
/// `my_app::model::Sensor` → `Sensor`, `alloc::vec::Vec<u8>` → `Vec`
pub fn type_prefix<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_string()
}
