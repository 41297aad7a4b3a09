use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ByteSourceError>;

#[derive(Error, Debug)]
pub enum ByteSourceError {
    #[error(
        "Could not read block (block start: {from}, block length: {length}, data length: {size})"
    )]
    InvalidRange { from: u64, length: usize, size: u64 },
    #[error(
        "Could not read block (block start: {from}, block length: {length}): source ended after {read} bytes"
    )]
    ShortRead { from: u64, length: usize, read: usize },
    #[error(
        "Out of bounds (offset: {offset}, length: {length}, buffer length: {capacity})"
    )]
    BoundsViolation {
        offset: usize,
        length: usize,
        capacity: usize,
    },
    #[error("Unexpected end of data: expected {expected} bytes, got {actual}")]
    UnexpectedEnd { expected: u64, actual: u64 },
    #[error("Allocation of {requested} bytes exceeds the limit of {limit}")]
    AllocationTooLarge { requested: usize, limit: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ByteSourceError> for io::Error {
    fn from(e: ByteSourceError) -> Self {
        match e {
            ByteSourceError::Io(inner) => inner,
            ByteSourceError::BoundsViolation { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, e)
            }
            ByteSourceError::ShortRead { .. }
            | ByteSourceError::UnexpectedEnd { .. } => {
                io::Error::new(io::ErrorKind::UnexpectedEof, e)
            }
            _ => io::Error::new(io::ErrorKind::Other, e),
        }
    }
}
