use crate::config;
use crate::errors::{ByteSourceError, Result};

/// Allocates a zero-initialised buffer of `len` bytes.
///
/// Lengths above the configured limit (see [`config::Config::alloc_limit`])
/// are refused instead of letting an untrusted length field abort the
/// process.
pub fn byte_array(len: usize) -> Result<Vec<u8>> {
    byte_array_limited(len, config::get().alloc_limit)
}

pub(crate) fn byte_array_limited(len: usize, limit: usize) -> Result<Vec<u8>> {
    if len > limit {
        log::debug!(
            "byte-source: refusing to allocate {} bytes (limit {})",
            len,
            limit
        );
        return Err(ByteSourceError::AllocationTooLarge {
            requested: len,
            limit,
        });
    }
    Ok(vec![0; len])
}
