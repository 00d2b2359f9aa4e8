use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::path::StoragePath;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// A blob that has been durably written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub path: StoragePath,
    /// Number of bytes written.
    pub size: u64,
}

/// Per-owner blob storage for uploaded book files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under a freshly generated name in the owner's namespace.
    async fn save_bytes(
        &self,
        owner_id: i32,
        original_filename: &str,
        data: &[u8],
    ) -> Result<StoredBlob, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.save(owner_id, original_filename, reader).await
    }

    /// Copy the whole reader into storage and return where it landed.
    ///
    /// The generated name keeps the lower-cased extension of `original_filename`.
    /// On error nothing is left under the generated name.
    async fn save(
        &self,
        owner_id: i32,
        original_filename: &str,
        reader: BoxReader,
    ) -> Result<StoredBlob, StorageError>;

    /// Retrieve all bytes of a blob.
    async fn read(&self, path: &StoragePath) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.open(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Open a blob as a streaming async reader.
    async fn open(&self, path: &StoragePath) -> Result<BoxReader, StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, path: &StoragePath) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, path: &StoragePath) -> Result<bool, StorageError>;
}
