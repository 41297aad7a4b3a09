use std::io::{self, Read};

use crate::errors::{ByteSourceError, Result};

/// Advances `reader` by exactly `n` bytes, discarding them.
///
/// Fails with [`ByteSourceError::UnexpectedEnd`] when the reader runs out
/// first.
pub fn skip_bytes<R: Read + ?Sized>(reader: &mut R, n: u64) -> Result<()> {
    let skipped = io::copy(&mut reader.take(n), &mut io::sink())?;
    if skipped < n {
        return Err(ByteSourceError::UnexpectedEnd {
            expected: n,
            actual: skipped,
        });
    }
    Ok(())
}
