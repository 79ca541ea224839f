//! File Gateway Tests
//!
//! Owner isolation under concurrent use, and the credential format seen
//! from outside the crate.

use std::sync::Arc;
use std::thread;

use filevault::auth::{CredentialVerifier, KdfParams, StoredCredential};
use filevault::file_storage::{FileGateway, FileKind, FileQuery, InMemoryFileStore, NewFile, StorageError};
use uuid::Uuid;

// =============================================================================
// Owner Isolation
// =============================================================================

#[test]
fn test_concurrent_owners_never_see_each_other() {
    let gateway = Arc::new(FileGateway::new(InMemoryFileStore::new()));
    let owners: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();

    let handles: Vec<_> = owners
        .iter()
        .copied()
        .map(|owner| {
            let gateway = Arc::clone(&gateway);
            thread::spawn(move || {
                for i in 0..25 {
                    let file = NewFile::new(
                        format!("{}-{}.txt", owner, i),
                        "text/plain",
                        owner.as_bytes().to_vec(),
                    );
                    gateway.create(owner, file).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    for owner in &owners {
        let files = gateway.list_for_owner(*owner).unwrap();
        assert_eq!(files.len(), 25);

        for meta in files {
            assert!(meta.original_name.starts_with(&owner.to_string()));
            let object = gateway.fetch(meta.id, *owner).unwrap();
            assert_eq!(object.owner_id, *owner);
            assert_eq!(object.data, owner.as_bytes().to_vec());
        }
    }
}

#[test]
fn test_concurrent_foreign_deletes_leave_files_intact() {
    let gateway = Arc::new(FileGateway::new(InMemoryFileStore::new()));
    let owner = Uuid::new_v4();
    let stored = gateway
        .create(owner, NewFile::new("keep.pdf", "application/pdf", vec![1, 2, 3]))
        .unwrap();
    let file_id = stored.metadata.id;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let gateway = Arc::clone(&gateway);
            thread::spawn(move || gateway.delete(file_id, Uuid::new_v4()).unwrap())
        })
        .collect();

    for handle in handles {
        assert!(!handle.join().unwrap());
    }

    assert_eq!(gateway.fetch(file_id, owner).unwrap().data, vec![1, 2, 3]);

    let documents = FileQuery {
        search: None,
        kind: FileKind::Documents,
    };
    assert_eq!(gateway.search(owner, &documents).unwrap().len(), 1);
}

#[test]
fn test_purge_owner_only_touches_that_owner() {
    let gateway = FileGateway::new(InMemoryFileStore::new());
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    for name in ["a.txt", "b.txt"] {
        gateway.create(alice, NewFile::new(name, "text/plain", vec![0])).unwrap();
    }
    let bobs = gateway
        .create(bob, NewFile::new("c.txt", "text/plain", vec![0]))
        .unwrap();

    assert_eq!(gateway.purge_owner(alice).unwrap(), 2);
    assert!(gateway.list_for_owner(alice).unwrap().is_empty());
    assert!(gateway.fetch(bobs.metadata.id, bob).is_ok());
    assert_eq!(
        gateway.fetch(bobs.metadata.id, alice).unwrap_err(),
        StorageError::NotFound
    );
}

// =============================================================================
// Stored Credentials
// =============================================================================

#[test]
fn test_stored_credential_format() {
    let verifier = CredentialVerifier::new(KdfParams {
        log_n: 8,
        ..KdfParams::default()
    });

    let credential = verifier.issue("correct horse").unwrap();
    let encoded = credential.encode();
    let (digest, salt) = encoded.split_once('.').unwrap();

    assert_eq!(digest.len(), 64);
    assert_eq!(salt.len(), 32);
    assert!(encoded.chars().all(|c| c == '.' || c.is_ascii_hexdigit()));

    let reparsed: StoredCredential = encoded.parse().unwrap();
    assert!(verifier.verify("correct horse", &reparsed).unwrap());
    assert!(!verifier.verify("Correct horse", &reparsed).unwrap());
}
