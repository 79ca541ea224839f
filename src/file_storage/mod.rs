//! # File Storage Module
//!
//! Per-user file storage. Payloads are kept as base64 text next to their
//! metadata, and every access is scoped by owner.

pub mod errors;
pub mod file;
pub mod gateway;
pub mod metadata;

pub use errors::{StorageError, StorageResult};
pub use file::{FileKind, FileMetadata, FileObject, FileQuery, FileRecord, NewFile};
pub use gateway::{FileGateway, DEFAULT_MAX_FILES_PER_UPLOAD, DEFAULT_MAX_UPLOAD_BYTES};
pub use metadata::{FileStore, InMemoryFileStore};
