use std::io::Cursor;
use std::sync::Arc;

use crate::alloc;
use crate::errors::{ByteSourceError, Result};
use crate::source::ByteSource;

/// A [`ByteSource`] over bytes already held in memory.
#[derive(Debug, Clone)]
pub struct ArrayByteSource {
    bytes: Arc<[u8]>,
    file_name: Option<String>,
}

impl ArrayByteSource {
    pub fn new(bytes: impl Into<Arc<[u8]>>, file_name: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            file_name,
        }
    }
}

impl ByteSource for ArrayByteSource {
    type Reader = Cursor<Arc<[u8]>>;

    fn open_reader(&self) -> Result<Self::Reader> {
        Ok(Cursor::new(Arc::clone(&self.bytes)))
    }

    fn read_range(&self, from: u64, length: usize) -> Result<Vec<u8>> {
        let size = self.bytes.len() as u64;
        let range = usize::try_from(from)
            .ok()
            .and_then(|start| Some(start..start.checked_add(length)?))
            .filter(|range| range.end <= self.bytes.len());
        let Some(range) = range else {
            return Err(ByteSourceError::InvalidRange { from, length, size });
        };

        let mut bytes = alloc::byte_array(length)?;
        bytes.copy_from_slice(&self.bytes[range]);
        Ok(bytes)
    }

    fn size(&self) -> Result<u64> {
        Ok(self.bytes.len() as u64)
    }

    fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}
