//! Configuration for prefdb
//!
//! Centralized store configuration with sensible defaults.

use crate::error::{PrefDbError, Result};
use crate::query::SortComposition;

/// Main configuration for a prefdb store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Key Scheme Configuration
    // -------------------------------------------------------------------------
    /// Namespace prepended to every derived substrate key
    /// Derived keys:
    ///   {namespace}.{prefix}_keys    (index record)
    ///   {namespace}.{prefix}.{id}    (one per document)
    pub namespace: String,

    /// Collection prefix; `None` resolves to the lower-cased type name
    pub prefix: Option<String>,

    // -------------------------------------------------------------------------
    // Query Configuration
    // -------------------------------------------------------------------------
    /// Number of ids fetched per scan step
    pub chunk_size: usize,

    /// How multiple sort keys are combined
    pub sort_composition: SortComposition,

    // -------------------------------------------------------------------------
    // Codec Configuration
    // -------------------------------------------------------------------------
    /// Compress stored documents (LZ4 + base64)
    pub compress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace: Self::DEFAULT_NAMESPACE.to_string(),
            prefix: None,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            sort_composition: SortComposition::Cascade,
            compress: false,
        }
    }
}

impl Config {
    pub const DEFAULT_NAMESPACE: &'static str = "default";
    pub const DEFAULT_CHUNK_SIZE: usize = 10;

    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the recognized options for values the store cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(PrefDbError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.namespace.is_empty() {
            return Err(PrefDbError::Config("namespace must not be empty".to_string()));
        }
        if matches!(&self.prefix, Some(p) if p.is_empty()) {
            return Err(PrefDbError::Config("prefix must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the key namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Override the collection prefix (defaults to the type name)
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.prefix = Some(prefix.into());
        self
    }

    /// Set the number of ids per scan chunk
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Enable or disable compression of stored documents
    pub fn compress(mut self, compress: bool) -> Self {
        self.config.compress = compress;
        self
    }

    /// Set how multi-key sorts are combined
    pub fn sort_composition(mut self, composition: SortComposition) -> Self {
        self.config.sort_composition = composition;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
