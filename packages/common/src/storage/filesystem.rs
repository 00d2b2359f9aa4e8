use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::path::StoragePath;
use super::traits::{BlobStore, BoxReader, StoredBlob};
use crate::book::extension_of;

/// Directory under the base path used for in-flight writes.
const TEMP_DIR: &str = ".tmp";

/// Filesystem-backed blob store.
///
/// Blobs live in one directory per owner:
/// `{base_path}/{owner_id}/{uuid}_{unix seconds}{extension}`
pub struct FilesystemBlobStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        if base_path.to_str().is_none() {
            return Err(StorageError::InvalidPath(format!(
                "base path is not valid UTF-8: {}",
                base_path.display()
            )));
        }
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(TEMP_DIR)).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Directory holding every blob of one owner.
    pub fn owner_dir(&self, owner_id: i32) -> PathBuf {
        self.base_path.join(owner_id.to_string())
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(TEMP_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Map a persisted path back onto the filesystem, refusing anything outside the owner directories.
    fn resolve(&self, path: &StoragePath) -> Result<PathBuf, StorageError> {
        let candidate = Path::new(path.as_str());
        let inside = candidate
            .strip_prefix(&self.base_path)
            .map_err(|_| StorageError::InvalidPath(path.to_string()))?;

        let mut components = inside.components();
        match components.next() {
            Some(Component::Normal(first)) if first != TEMP_DIR => {}
            _ => return Err(StorageError::InvalidPath(path.to_string())),
        }
        if components.any(|c| !matches!(c, Component::Normal(_))) {
            return Err(StorageError::InvalidPath(path.to_string()));
        }

        Ok(candidate.to_path_buf())
    }
}

/// Collision-free blob name that keeps the original extension.
fn generated_name(original_filename: &str) -> String {
    format!(
        "{}_{}{}",
        uuid::Uuid::new_v4(),
        Utc::now().timestamp(),
        extension_of(original_filename)
    )
}

/// Copy `reader` into `file`, failing once more than `limit` bytes were read.
async fn copy_limited(
    reader: &mut BoxReader,
    file: &mut fs::File,
    limit: u64,
) -> Result<u64, StorageError> {
    let mut total_bytes: u64 = 0;
    let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }

        total_bytes += n as u64;
        if total_bytes > limit {
            return Err(StorageError::SizeLimitExceeded {
                actual: total_bytes,
                limit,
            });
        }

        file.write_all(&buf[..n]).await?;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(total_bytes)
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn save(
        &self,
        owner_id: i32,
        original_filename: &str,
        mut reader: BoxReader,
    ) -> Result<StoredBlob, StorageError> {
        let temp_path = self.temp_path();
        let mut temp_file = fs::File::create(&temp_path).await?;

        let copied = copy_limited(&mut reader, &mut temp_file, self.max_size).await;
        drop(temp_file);

        let size = match copied {
            Ok(size) => size,
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e);
            }
        };

        let owner_dir = self.owner_dir(owner_id);
        if let Err(e) = fs::create_dir_all(&owner_dir).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        let blob_path = owner_dir.join(generated_name(original_filename));
        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(StoredBlob {
            path: StoragePath::new(blob_path.to_string_lossy().into_owned()),
            size,
        })
    }

    async fn open(&self, path: &StoragePath) -> Result<BoxReader, StorageError> {
        let blob_path = self.resolve(path)?;
        match fs::File::open(&blob_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &StoragePath) -> Result<bool, StorageError> {
        let blob_path = self.resolve(path)?;
        Ok(fs::try_exists(&blob_path).await?)
    }

    async fn delete(&self, path: &StoragePath) -> Result<bool, StorageError> {
        let blob_path = self.resolve(path)?;
        match fs::remove_file(&blob_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
