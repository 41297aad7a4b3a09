use std::io::Read;

use anyhow::anyhow;

use crate::errors::Result;

/// Random access to the bytes of an image (or any other) resource.
///
/// Format decoders only see this trait; implementations decide how the
/// bytes are actually stored or fetched.
pub trait ByteSource {
    /// Sequential reader returned by [`ByteSource::open_reader`].
    type Reader: Read;

    /// Opens a reader positioned at the start of the source.
    fn open_reader(&self) -> Result<Self::Reader>;

    /// Reads exactly `length` bytes starting at offset `from`.
    ///
    /// Ranges reaching past the end of the source are rejected with
    /// [`crate::ByteSourceError::InvalidRange`].
    fn read_range(&self, from: u64, length: usize) -> Result<Vec<u8>>;

    /// Total length of the source in bytes.
    fn size(&self) -> Result<u64>;

    /// Name of the file the bytes came from, if known.
    fn file_name(&self) -> Option<&str>;

    /// Reads the whole source.
    fn read_all(&self) -> Result<Vec<u8>> {
        let size = self.size()?;
        let length = usize::try_from(size).map_err(|_| {
            anyhow!("{} bytes do not fit in memory", size)
        })?;
        self.read_range(0, length)
    }

    fn description(&self) -> String {
        match self.file_name() {
            Some(name) => name.to_owned(),
            None => "unnamed byte source".to_owned(),
        }
    }
}
