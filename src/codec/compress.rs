//! Text-safe compression
//!
//! LZ4 block compression with the uncompressed size prepended, rendered as
//! standard base64 so the result is still a plain string.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Little-endian u32 uncompressed length in front of the LZ4 block
const SIZE_PREFIX_LEN: usize = 4;

/// Upper bound on the LZ4 block expansion ratio
const MAX_LZ4_RATIO: usize = 255;

/// Compress `text` into a base64 string
pub fn compress_text(text: &str) -> String {
    let compressed = lz4_flex::compress_prepend_size(text.as_bytes());
    STANDARD.encode(compressed)
}

/// Reverse `compress_text`; `None` if any stage fails
pub fn decompress_text(encoded: &str) -> Option<String> {
    let compressed = match STANDARD.decode(encoded.trim()) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "stored value is not base64");
            return None;
        }
    };

    // A corrupted size prefix must not drive a huge allocation.
    if compressed.len() < SIZE_PREFIX_LEN {
        return None;
    }
    let mut prefix = [0u8; SIZE_PREFIX_LEN];
    prefix.copy_from_slice(&compressed[..SIZE_PREFIX_LEN]);
    let claimed = u32::from_le_bytes(prefix) as usize;
    if claimed > (compressed.len() - SIZE_PREFIX_LEN).saturating_mul(MAX_LZ4_RATIO) + SIZE_PREFIX_LEN {
        tracing::debug!(claimed, "stored value has an implausible size prefix");
        return None;
    }

    let bytes = match lz4_flex::decompress_size_prepended(&compressed) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "stored value failed to decompress");
            return None;
        }
    };

    String::from_utf8(bytes).ok()
}
