use std::fmt;

use super::path::StoragePath;

/// Failure of a blob store operation.
#[derive(Debug)]
pub enum StorageError {
    /// No blob is stored at this path.
    NotFound(StoragePath),
    Io(std::io::Error),
    /// The path does not point inside an owner directory of the storage root.
    InvalidPath(String),
    /// The stream grew past the store's ceiling and was discarded.
    SizeLimitExceeded { actual: u64, limit: u64 },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "no blob stored at {path}"),
            Self::Io(err) => write!(f, "blob storage I/O failed: {err}"),
            Self::InvalidPath(raw) => write!(f, "path is outside the blob root: {raw}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "upload of {actual} bytes exceeds the {limit} byte ceiling")
            }
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
