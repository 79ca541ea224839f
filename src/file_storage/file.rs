//! # File Objects
//!
//! A stored file exists in two shapes: the persisted `FileRecord`, whose
//! payload is base64 text, and the decoded `FileObject` handed to callers.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::{StorageError, StorageResult};

/// Persisted file row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub file_size: u64,
    /// Standard base64 of the payload
    pub file_data: String,
    pub uploaded_at: DateTime<Utc>,
}

impl FileRecord {
    /// Build a record for a new upload owned by `owner_id`
    pub fn new(owner_id: Uuid, file: &NewFile) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: owner_id,
            file_name: file.file_name.clone(),
            original_name: file.original_name.clone(),
            mime_type: file.mime_type.clone(),
            file_size: file.data.len() as u64,
            file_data: STANDARD.encode(&file.data),
            uploaded_at: Utc::now(),
        }
    }

    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            id: self.id,
            file_name: self.file_name.clone(),
            original_name: self.original_name.clone(),
            mime_type: self.mime_type.clone(),
            file_size: self.file_size,
            uploaded_at: self.uploaded_at,
        }
    }

    /// Decode into a `FileObject`
    pub fn into_object(self) -> StorageResult<FileObject> {
        let data = STANDARD
            .decode(self.file_data.as_bytes())
            .map_err(|_| StorageError::CorruptPayload)?;
        Ok(FileObject {
            metadata: self.metadata(),
            owner_id: self.user_id,
            data,
        })
    }
}

/// File listing entry (no payload)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub id: Uuid,
    pub file_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub file_size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// A file with its decoded payload
#[derive(Debug, Clone)]
pub struct FileObject {
    pub metadata: FileMetadata,
    pub owner_id: Uuid,
    pub data: Vec<u8>,
}

/// Upload input
#[derive(Debug, Clone)]
pub struct NewFile {
    pub file_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl NewFile {
    /// Upload where the stored name is the client's name
    pub fn new(original_name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        let original_name = original_name.into();
        Self {
            file_name: original_name.clone(),
            original_name,
            mime_type: mime_type.into(),
            data,
        }
    }
}

/// Media-type buckets for list filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    #[default]
    All,
    Images,
    Videos,
    Audio,
    Documents,
}

impl FileKind {
    pub fn matches(&self, mime_type: &str) -> bool {
        match self {
            FileKind::All => true,
            FileKind::Images => mime_type.starts_with("image/"),
            FileKind::Videos => mime_type.starts_with("video/"),
            FileKind::Audio => mime_type.starts_with("audio/"),
            FileKind::Documents => mime_type.contains("pdf") || mime_type.contains("document"),
        }
    }
}

/// Listing filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileQuery {
    /// Case-insensitive substring of the original name
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: FileKind,
}

impl FileQuery {
    pub fn matches(&self, file: &FileMetadata) -> bool {
        let name_matches = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(needle) => file
                .original_name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        };
        name_matches && self.kind.matches(&file.mime_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(name: &str, mime: &str) -> FileMetadata {
        FileRecord::new(Uuid::new_v4(), &NewFile::new(name, mime, vec![1, 2, 3])).metadata()
    }

    #[test]
    fn test_record_encodes_payload() {
        let owner = Uuid::new_v4();
        let record = FileRecord::new(owner, &NewFile::new("a.txt", "text/plain", b"hello".to_vec()));

        assert_eq!(record.file_data, "aGVsbG8=");
        assert_eq!(record.file_size, 5);
        assert_eq!(record.user_id, owner);
        assert_eq!(record.file_name, "a.txt");

        let object = record.into_object().unwrap();
        assert_eq!(object.data, b"hello");
        assert_eq!(object.owner_id, owner);
    }

    #[test]
    fn test_corrupt_payload_detected() {
        let mut record = FileRecord::new(Uuid::new_v4(), &NewFile::new("a", "text/plain", vec![]));
        record.file_data = "***".to_string();
        assert!(matches!(record.into_object(), Err(StorageError::CorruptPayload)));
    }

    #[test]
    fn test_file_kind_matching() {
        assert!(FileKind::Images.matches("image/png"));
        assert!(!FileKind::Images.matches("video/mp4"));
        assert!(FileKind::Videos.matches("video/mp4"));
        assert!(FileKind::Audio.matches("audio/mpeg"));
        assert!(FileKind::Documents.matches("application/pdf"));
        assert!(FileKind::Documents.matches(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        ));
        assert!(!FileKind::Documents.matches("text/plain"));
        assert!(FileKind::All.matches("anything/else"));
    }

    #[test]
    fn test_query_matching() {
        let report = metadata("Quarterly Report.pdf", "application/pdf");
        let photo = metadata("holiday.JPG", "image/jpeg");

        let query = FileQuery { search: Some("report".into()), kind: FileKind::All };
        assert!(query.matches(&report));
        assert!(!query.matches(&photo));

        let query = FileQuery { search: Some("jpg".into()), kind: FileKind::Images };
        assert!(query.matches(&photo));

        let query = FileQuery { search: Some("  ".into()), kind: FileKind::Documents };
        assert!(query.matches(&report));
        assert!(!query.matches(&photo));
    }

    #[test]
    fn test_metadata_serializes_camel_case_without_payload() {
        let json = serde_json::to_value(metadata("a.txt", "text/plain")).unwrap();
        assert!(json.get("originalName").is_some());
        assert!(json.get("mimeType").is_some());
        assert!(json.get("uploadedAt").is_some());
        assert!(json.get("fileData").is_none());
    }
}
