//! Codec Module
//!
//! Converts documents to and from the string values the substrate stores.
//!
//! ## Stored Forms
//! - plain:      canonical JSON text
//! - compressed: base64(lz4(JSON text)), size-prepended LZ4 block
//!
//! Decoding never fails loudly: malformed, truncated or foreign text decodes
//! to `None`, exactly like a missing key.

mod compress;
mod document;

pub use compress::{compress_text, decompress_text};
pub use document::DocumentCodec;
