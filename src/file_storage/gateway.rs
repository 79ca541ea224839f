//! # File Gateway
//!
//! Owner-scoped access to stored files.
//!
//! ## Invariants
//! - A file is only ever returned to, or deleted by, its owner
//! - A file owned by someone else is reported exactly like a missing one

use std::sync::Arc;

use uuid::Uuid;

use super::errors::{StorageError, StorageResult};
use super::file::{FileMetadata, FileObject, FileQuery, FileRecord, NewFile};
use super::metadata::FileStore;

/// Default per-file upload limit (100 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Default number of files accepted in one upload request
pub const DEFAULT_MAX_FILES_PER_UPLOAD: usize = 10;

/// Owner-scoped file operations over a `FileStore`
pub struct FileGateway<F: FileStore> {
    store: Arc<F>,
    max_upload_bytes: u64,
    max_files_per_upload: usize,
}

impl<F: FileStore> FileGateway<F> {
    pub fn new(store: F) -> Self {
        Self::with_limit(store, DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn with_limit(store: F, max_upload_bytes: u64) -> Self {
        Self {
            store: Arc::new(store),
            max_upload_bytes,
            max_files_per_upload: DEFAULT_MAX_FILES_PER_UPLOAD,
        }
    }

    pub fn with_max_files(mut self, max_files_per_upload: usize) -> Self {
        self.max_files_per_upload = max_files_per_upload;
        self
    }

    /// Per-file size limit
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    pub fn max_files_per_upload(&self) -> usize {
        self.max_files_per_upload
    }

    /// Owner's files, newest first, without payloads
    pub fn list_for_owner(&self, owner_id: Uuid) -> StorageResult<Vec<FileMetadata>> {
        Ok(self
            .store
            .list_by_owner(owner_id)?
            .iter()
            .map(FileRecord::metadata)
            .collect())
    }

    /// Owner's files matching a name search and type filter, newest first
    pub fn search(&self, owner_id: Uuid, query: &FileQuery) -> StorageResult<Vec<FileMetadata>> {
        Ok(self
            .list_for_owner(owner_id)?
            .into_iter()
            .filter(|file| query.matches(file))
            .collect())
    }

    /// Fetch a file with its payload
    ///
    /// `NotFound` both when the id does not exist and when another owner
    /// holds it.
    pub fn fetch(&self, file_id: Uuid, owner_id: Uuid) -> StorageResult<FileObject> {
        let record = self
            .store
            .get_by_id_and_owner(file_id, owner_id)?
            .ok_or(StorageError::NotFound)?;

        record.into_object().map_err(|e| {
            tracing::error!(file_id = %file_id, error = %e, "stored payload failed to decode");
            e
        })
    }

    /// Reject a file that `create` would refuse, without storing anything
    pub fn check(&self, file: &NewFile) -> StorageResult<()> {
        if file.original_name.trim().is_empty() {
            return Err(StorageError::InvalidFile("file name is empty".to_string()));
        }
        let size = file.data.len() as u64;
        if size > self.max_upload_bytes {
            return Err(StorageError::FileTooLarge(size, self.max_upload_bytes));
        }
        Ok(())
    }

    /// Store a new file for `owner_id`
    pub fn create(&self, owner_id: Uuid, file: NewFile) -> StorageResult<FileObject> {
        self.check(&file)?;
        self.insert(owner_id, file)
    }

    /// Store a batch of files for `owner_id`
    ///
    /// Every file is checked before any is stored, so a rejected batch
    /// leaves nothing behind.
    pub fn create_all(&self, owner_id: Uuid, files: Vec<NewFile>) -> StorageResult<Vec<FileObject>> {
        if files.len() > self.max_files_per_upload {
            return Err(StorageError::InvalidFile(format!(
                "at most {} files per upload",
                self.max_files_per_upload
            )));
        }
        for file in &files {
            self.check(file)?;
        }

        files
            .into_iter()
            .map(|file| self.insert(owner_id, file))
            .collect()
    }

    fn insert(&self, owner_id: Uuid, file: NewFile) -> StorageResult<FileObject> {
        let size = file.data.len() as u64;
        let record = self.store.insert(FileRecord::new(owner_id, &file))?;
        tracing::info!(
            file_id = %record.id,
            owner_id = %owner_id,
            size,
            "file stored"
        );

        Ok(FileObject {
            metadata: record.metadata(),
            owner_id,
            data: file.data,
        })
    }

    /// Delete a file; true only if the owner's file was removed
    pub fn delete(&self, file_id: Uuid, owner_id: Uuid) -> StorageResult<bool> {
        let removed = self.store.delete_by_id_and_owner(file_id, owner_id)? > 0;
        if removed {
            tracing::info!(file_id = %file_id, owner_id = %owner_id, "file deleted");
        }
        Ok(removed)
    }

    /// Remove every file of an owner whose account is going away
    pub fn purge_owner(&self, owner_id: Uuid) -> StorageResult<usize> {
        let removed = self.store.delete_all_for_owner(owner_id)?;
        tracing::info!(owner_id = %owner_id, removed, "owner files purged");
        Ok(removed)
    }
}
