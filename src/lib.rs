//! # Byte Source
//!
//! `byte-source` gives format decoders random access to bytes that may only
//! be readable once, front to back (a network body, a pipe, stdin).
//!
//! [`StreamByteSource`] pulls such a channel lazily in blocks of
//! [`BLOCK_SIZE`] bytes and keeps every block it has pulled, so any number
//! of [`CachingReader`]s and range reads can revisit earlier offsets without
//! touching the channel again. [`ArrayByteSource`] and [`FileByteSource`]
//! implement the same [`ByteSource`] trait for data already in memory or on
//! disk.
//!
//! ```
//! use byte_source::ByteSource;
//!
//! let channel = std::io::Cursor::new(vec![7u8; 2500]);
//! let source = byte_source::from_reader(channel, None);
//! assert_eq!(source.size().unwrap(), 2500);
//! assert_eq!(source.read_range(1000, 600).unwrap().len(), 600);
//! ```

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

pub mod alloc;
mod array;
mod cache;
pub mod config;
mod errors;
mod file;
mod reader;
mod source;
mod stream;
pub mod util;

pub use array::ArrayByteSource;
pub use cache::BLOCK_SIZE;
pub use errors::{ByteSourceError, Result};
pub use file::FileByteSource;
pub use reader::CachingReader;
pub use source::ByteSource;
pub use stream::StreamByteSource;

/// Wraps a forward-only channel.
pub fn from_reader<R: Read>(
    reader: R,
    file_name: Option<String>,
) -> StreamByteSource<R> {
    StreamByteSource::new(reader, file_name)
}

/// Wraps bytes already in memory.
pub fn from_bytes(
    bytes: impl Into<Arc<[u8]>>,
    file_name: Option<String>,
) -> ArrayByteSource {
    ArrayByteSource::new(bytes, file_name)
}

/// Reads from a file on disk.
pub fn from_path<P: AsRef<Path>>(path: P) -> FileByteSource {
    FileByteSource::new(path)
}
