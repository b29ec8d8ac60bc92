//! Document codec

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{PrefDbError, Result};

use super::compress::{compress_text, decompress_text};

/// Encodes documents to stored strings and back
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCodec {
    compress: bool,
}

impl DocumentCodec {
    pub fn new(compress: bool) -> Self {
        Self { compress }
    }

    /// Whether stored values are compressed
    pub fn is_compressed(&self) -> bool {
        self.compress
    }

    /// Serialize `doc` to its stored string
    ///
    /// Fails only if `doc` itself cannot be represented as JSON (for example
    /// a map with non-string keys).
    pub fn encode<T: Serialize + ?Sized>(&self, doc: &T) -> Result<String> {
        let text =
            serde_json::to_string(doc).map_err(|e| PrefDbError::Serialization(e.to_string()))?;

        if self.compress {
            Ok(compress_text(&text))
        } else {
            Ok(text)
        }
    }

    /// Parse a stored string into a JSON document
    ///
    /// Returns `None` for anything that does not decode.
    pub fn decode(&self, stored: &str) -> Option<Value> {
        let parsed = if self.compress {
            let text = decompress_text(stored)?;
            serde_json::from_str(&text)
        } else {
            serde_json::from_str(stored)
        };

        match parsed {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(error = %e, "stored value is not valid JSON");
                None
            }
        }
    }

    /// Decode straight into `T`
    pub fn decode_as<T: DeserializeOwned>(&self, stored: &str) -> Option<T> {
        let value = self.decode(stored)?;
        serde_json::from_value(value).ok()
    }
}
