//! # File Store
//!
//! Persistence abstraction for file records. Every read or delete of a
//! single record takes both the file id and the owner id, so ownership is
//! decided by the store in one step.

use std::sync::RwLock;

use uuid::Uuid;

use super::errors::{StorageError, StorageResult};
use super::file::FileRecord;

/// Trait for file record storage
pub trait FileStore: Send + Sync {
    /// Insert a new record
    fn insert(&self, record: FileRecord) -> StorageResult<FileRecord>;

    /// All records of an owner, newest first
    fn list_by_owner(&self, owner_id: Uuid) -> StorageResult<Vec<FileRecord>>;

    /// The record with this id, only if owned by `owner_id`
    fn get_by_id_and_owner(&self, id: Uuid, owner_id: Uuid) -> StorageResult<Option<FileRecord>>;

    /// Delete the record with this id if owned by `owner_id`; returns rows removed
    fn delete_by_id_and_owner(&self, id: Uuid, owner_id: Uuid) -> StorageResult<usize>;

    /// Delete every record of an owner (cascade when the owner goes away)
    fn delete_all_for_owner(&self, owner_id: Uuid) -> StorageResult<usize>;
}

/// In-memory file store
#[derive(Debug, Default)]
pub struct InMemoryFileStore {
    records: RwLock<Vec<FileRecord>>,
}

impl InMemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StorageError {
    StorageError::Internal("Lock poisoned".to_string())
}

impl FileStore for InMemoryFileStore {
    fn insert(&self, record: FileRecord) -> StorageResult<FileRecord> {
        let mut records = self.records.write().map_err(poisoned)?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(StorageError::Internal(format!("duplicate file id {}", record.id)));
        }
        records.push(record.clone());
        Ok(record)
    }

    fn list_by_owner(&self, owner_id: Uuid) -> StorageResult<Vec<FileRecord>> {
        let records = self.records.read().map_err(poisoned)?;

        // Later inserts first among equal timestamps
        let mut owned: Vec<FileRecord> = records
            .iter()
            .rev()
            .filter(|r| r.user_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));

        Ok(owned)
    }

    fn get_by_id_and_owner(&self, id: Uuid, owner_id: Uuid) -> StorageResult<Option<FileRecord>> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records
            .iter()
            .find(|r| r.id == id && r.user_id == owner_id)
            .cloned())
    }

    fn delete_by_id_and_owner(&self, id: Uuid, owner_id: Uuid) -> StorageResult<usize> {
        let mut records = self.records.write().map_err(poisoned)?;
        let len_before = records.len();
        records.retain(|r| !(r.id == id && r.user_id == owner_id));
        Ok(len_before - records.len())
    }

    fn delete_all_for_owner(&self, owner_id: Uuid) -> StorageResult<usize> {
        let mut records = self.records.write().map_err(poisoned)?;
        let len_before = records.len();
        records.retain(|r| r.user_id != owner_id);
        Ok(len_before - records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_storage::file::NewFile;
    use chrono::Duration;

    fn record(owner: Uuid, name: &str) -> FileRecord {
        FileRecord::new(owner, &NewFile::new(name, "text/plain", name.as_bytes().to_vec()))
    }

    #[test]
    fn test_scoped_get_and_delete() {
        let store = InMemoryFileStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let file = store.insert(record(alice, "a.txt")).unwrap();

        assert!(store.get_by_id_and_owner(file.id, alice).unwrap().is_some());
        assert!(store.get_by_id_and_owner(file.id, bob).unwrap().is_none());

        assert_eq!(store.delete_by_id_and_owner(file.id, bob).unwrap(), 0);
        assert!(store.get_by_id_and_owner(file.id, alice).unwrap().is_some());

        assert_eq!(store.delete_by_id_and_owner(file.id, alice).unwrap(), 1);
        assert_eq!(store.delete_by_id_and_owner(file.id, alice).unwrap(), 0);
    }

    #[test]
    fn test_list_newest_first_and_scoped() {
        let store = InMemoryFileStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let mut old = record(alice, "old.txt");
        old.uploaded_at = old.uploaded_at - Duration::minutes(5);
        store.insert(old).unwrap();
        store.insert(record(alice, "first.txt")).unwrap();
        store.insert(record(bob, "bob.txt")).unwrap();
        store.insert(record(alice, "second.txt")).unwrap();

        let names: Vec<String> = store
            .list_by_owner(alice)
            .unwrap()
            .into_iter()
            .map(|r| r.original_name)
            .collect();
        assert_eq!(names, vec!["second.txt", "first.txt", "old.txt"]);
    }

    #[test]
    fn test_cascade_delete() {
        let store = InMemoryFileStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.insert(record(alice, "a")).unwrap();
        store.insert(record(alice, "b")).unwrap();
        store.insert(record(bob, "c")).unwrap();

        assert_eq!(store.delete_all_for_owner(alice).unwrap(), 2);
        assert!(store.list_by_owner(alice).unwrap().is_empty());
        assert_eq!(store.list_by_owner(bob).unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let store = InMemoryFileStore::new();
        let file = record(Uuid::new_v4(), "a");
        store.insert(file.clone()).unwrap();
        assert!(store.insert(file).is_err());
    }
}
