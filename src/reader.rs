use std::io::{self, Read};
use std::rc::Rc;

use crate::cache::{BlockCache, CacheBlock, BLOCK_SIZE};
use crate::errors::{ByteSourceError, Result};

/// Sequential reader over the cached blocks of a
/// [`StreamByteSource`](crate::StreamByteSource).
///
/// Every reader starts at the logical start of the source and keeps its own
/// position. Blocks are pulled from the channel only when this reader is the
/// first to walk past the cache frontier. A single call never copies across
/// a block boundary.
pub struct CachingReader<R> {
    // Declared before `cache` so the current block is released first and
    // the cache can unlink the whole chain when it goes away.
    block: Option<Rc<CacheBlock>>,
    index: usize,
    started: bool,
    cache: Rc<BlockCache<R>>,
}

impl<R: Read> CachingReader<R> {
    pub(crate) fn new(cache: Rc<BlockCache<R>>) -> Self {
        Self {
            block: None,
            index: 0,
            started: false,
            cache,
        }
    }

    /// Moves to the next block with unread bytes and returns them, or
    /// `None` once the source is exhausted.
    fn remaining(&mut self) -> io::Result<Option<&[u8]>> {
        if !self.started {
            self.block = self.cache.head()?;
            self.index = 0;
            self.started = true;
        }

        while let Some(block) = &self.block {
            if self.index < block.len() {
                break;
            }
            self.block = block.resolve_next(&self.cache)?;
            self.index = 0;
        }

        Ok(self
            .block
            .as_deref()
            .map(|block| &block.bytes()[self.index..]))
    }

    /// Reads one byte; `None` at end of data.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = match self.remaining()? {
            Some(bytes) => bytes[0],
            None => return Ok(None),
        };
        self.index += 1;
        Ok(Some(byte))
    }

    /// Copies up to `length` bytes into `buf[offset..offset + length]`.
    ///
    /// Stops at the end of the current block, so fewer bytes than requested
    /// may be returned even when more data follows. Returns `0` at end of
    /// data (or when `length` is `0`).
    pub fn read_into(
        &mut self,
        buf: &mut [u8],
        offset: usize,
        length: usize,
    ) -> Result<usize> {
        if offset > buf.len() || length > buf.len() - offset {
            return Err(ByteSourceError::BoundsViolation {
                offset,
                length,
                capacity: buf.len(),
            });
        }
        if length == 0 {
            return Ok(0);
        }

        let copied = match self.remaining()? {
            Some(bytes) => {
                let n = length.min(bytes.len());
                buf[offset..offset + n].copy_from_slice(&bytes[..n]);
                n
            }
            None => return Ok(0),
        };
        self.index += copied;
        Ok(copied)
    }

    /// Skips up to `n` bytes without copying them and returns how many were
    /// skipped, which is less than `n` only at end of data.
    pub fn skip(&mut self, n: u64) -> io::Result<u64> {
        let mut left = n;
        while left > 0 {
            let step = match self.remaining()? {
                Some(bytes) => left.min(bytes.len().min(BLOCK_SIZE) as u64),
                None => break,
            };
            self.index += step as usize;
            left -= step;
        }
        Ok(n - left)
    }
}

impl<R: Read> Read for CachingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = buf.len();
        Ok(self.read_into(buf, 0, len)?)
    }
}
