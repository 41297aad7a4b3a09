use std::fs::{self, File};
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::alloc;
use crate::errors::{ByteSourceError, Result};
use crate::source::ByteSource;

/// A [`ByteSource`] over a file on disk.
///
/// The file is reopened for every reader and range read, so the source
/// itself holds no open handle.
#[derive(Debug, Clone)]
pub struct FileByteSource {
    path: PathBuf,
    file_name: Option<String>,
}

impl FileByteSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Self { path, file_name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileByteSource {
    type Reader = BufReader<File>;

    fn open_reader(&self) -> Result<Self::Reader> {
        Ok(BufReader::new(File::open(&self.path)?))
    }

    fn read_range(&self, from: u64, length: usize) -> Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        let size = file.metadata()?.len();
        let in_range = from
            .checked_add(length as u64)
            .map_or(false, |end| end <= size);
        if !in_range {
            return Err(ByteSourceError::InvalidRange { from, length, size });
        }

        file.seek(SeekFrom::Start(from))?;
        let mut bytes = alloc::byte_array(length)?;
        let mut total = 0;
        while total < length {
            let read = file.read(&mut bytes[total..])?;
            if read == 0 {
                // Truncated since the length was read.
                return Err(ByteSourceError::ShortRead {
                    from,
                    length,
                    read: total,
                });
            }
            total += read;
        }
        Ok(bytes)
    }

    fn size(&self) -> Result<u64> {
        Ok(fs::metadata(&self.path)?.len())
    }

    fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }
}
