use std::sync::Arc;

use common::book::{title_from_filename, validate_upload};
use common::storage::{BlobStore, BoxReader, StoragePath};
use tracing::{debug, error, info, instrument, warn};

use crate::entity::book;
use crate::error::AppError;
use crate::store::{BookStore, NewBook, StoreError};

/// Keeps book blobs and book rows consistent.
///
/// The row is authoritative and the blob is derived from it. Uploads write
/// the blob before the row; deletes remove the row before the blob. A crash
/// between phases therefore leaves at most an orphan blob, never a row
/// pointing at nothing. The one window where a blob would be orphaned by a
/// request that reports failure (row insert failing after the blob landed)
/// is closed by [`BookService::compensate_orphan_blob`].
#[derive(Clone)]
pub struct BookService {
    books: Arc<dyn BookStore>,
    blobs: Arc<dyn BlobStore>,
}

/// A file received from a client.
pub struct Upload {
    pub filename: String,
    /// Size reported for the file before any byte is stored.
    pub declared_size: u64,
    pub reader: BoxReader,
}

/// A book together with a reader over its file.
pub struct BookDownload {
    pub book: book::Model,
    pub reader: BoxReader,
}

fn book_not_found(err: StoreError) -> AppError {
    match err {
        StoreError::NotFound => AppError::book_not_found(),
        other => other.into(),
    }
}

impl BookService {
    pub fn new(books: Arc<dyn BookStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { books, blobs }
    }

    /// Validate, stage the blob, then commit the row.
    #[instrument(skip(self, upload), fields(filename = %upload.filename, size = upload.declared_size))]
    pub async fn upload(&self, owner_id: i32, upload: Upload) -> Result<book::Model, AppError> {
        let format = validate_upload(&upload.filename, upload.declared_size)?;

        let stored = self
            .blobs
            .save(owner_id, &upload.filename, upload.reader)
            .await?;

        let new_book = NewBook {
            user_id: owner_id,
            title: title_from_filename(&upload.filename),
            filename: upload.filename,
            file_path: stored.path.clone(),
            file_size: i64::try_from(stored.size).unwrap_or(i64::MAX),
            format,
        };

        match self.books.create(new_book).await {
            Ok(model) => {
                info!(book_id = model.id, path = %stored.path, "Book uploaded");
                Ok(model)
            }
            Err(e) => {
                self.compensate_orphan_blob(&stored.path).await;
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32, owner_id: i32) -> Result<book::Model, AppError> {
        self.books
            .find_by_id(id, owner_id)
            .await
            .map_err(book_not_found)
    }

    #[instrument(skip(self))]
    pub async fn list(&self, owner_id: i32) -> Result<Vec<book::Model>, AppError> {
        Ok(self.books.find_all_by_owner(owner_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_progress(
        &self,
        id: i32,
        owner_id: i32,
        current_page: i32,
        progress_percentage: f64,
    ) -> Result<(), AppError> {
        self.books
            .find_by_id(id, owner_id)
            .await
            .map_err(book_not_found)?;

        self.books
            .update_progress(id, owner_id, current_page, progress_percentage)
            .await
            .map_err(book_not_found)
    }

    /// Remove the row, then reclaim its blob on a best-effort basis.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32, owner_id: i32) -> Result<(), AppError> {
        let book = self
            .books
            .find_by_id(id, owner_id)
            .await
            .map_err(book_not_found)?;

        self.books
            .delete(id, owner_id)
            .await
            .map_err(book_not_found)?;

        self.reclaim_blob(&StoragePath::new(book.file_path)).await;
        Ok(())
    }

    /// Storage path of an owned book, provided its blob is still present.
    #[instrument(skip(self))]
    pub async fn download_path(&self, id: i32, owner_id: i32) -> Result<StoragePath, AppError> {
        let (_, path) = self.locate(id, owner_id).await?;
        Ok(path)
    }

    #[instrument(skip(self))]
    pub async fn open_download(&self, id: i32, owner_id: i32) -> Result<BookDownload, AppError> {
        let (book, path) = self.locate(id, owner_id).await?;
        let reader = self.blobs.open(&path).await?;
        Ok(BookDownload { book, reader })
    }

    async fn locate(&self, id: i32, owner_id: i32) -> Result<(book::Model, StoragePath), AppError> {
        let book = self
            .books
            .find_by_id(id, owner_id)
            .await
            .map_err(book_not_found)?;
        let path = StoragePath::new(book.file_path.clone());

        if !self.blobs.exists(&path).await? {
            warn!(book_id = id, path = %path, "Book row has no blob in storage");
            return Err(AppError::BlobMissing);
        }

        Ok((book, path))
    }

    /// Undo a staged blob whose row could not be committed.
    async fn compensate_orphan_blob(&self, path: &StoragePath) {
        match self.blobs.delete(path).await {
            Ok(_) => debug!(path = %path, "Removed blob after failed record insert"),
            Err(e) => error!(
                path = %path,
                error = %e,
                "Failed to remove blob after failed record insert; blob is orphaned"
            ),
        }
    }

    /// Delete the blob of a removed row. Failures are reported, never returned.
    async fn reclaim_blob(&self, path: &StoragePath) {
        match self.blobs.delete(path).await {
            Ok(true) => debug!(path = %path, "Reclaimed blob"),
            Ok(false) => warn!(path = %path, "Blob was already missing when its book was deleted"),
            Err(e) => warn!(path = %path, error = %e, "Failed to delete blob of removed book"),
        }
    }
}
