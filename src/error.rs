//! Error types for prefdb
//!
//! Provides a unified error type for all store operations.
//!
//! Decode failures are deliberately absent from this enum: a stored value
//! that cannot be decoded is treated as missing, never reported.

use thiserror::Error;

/// Result type alias using PrefDbError
pub type Result<T> = std::result::Result<T, PrefDbError>;

/// Unified error type for prefdb operations
#[derive(Debug, Error)]
pub enum PrefDbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Substrate Errors
    // -------------------------------------------------------------------------
    #[error("Substrate failure: {0}")]
    Substrate(String),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Document not found: {key}")]
    NotFound { key: String },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Query Errors
    // -------------------------------------------------------------------------
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Lock error: {0}")]
    Lock(String),
}

impl PrefDbError {
    /// Whether this error is a "not found" condition
    pub fn is_not_found(&self) -> bool {
        matches!(self, PrefDbError::NotFound { .. })
    }
}
