//! File records derived from binary content.
//!
//! A [`FileRecord`] can be built two ways:
//!
//! - from raw bytes ([`FileRecord::new`], [`FileRecord::from_file`]), deriving the digest,
//!   media type and dimensions from the content, or
//! - from a persisted [`FileDescription`] ([`FileRecord::from_description`]), trusting the
//!   stored metadata as already validated.
//!
//! Serialising a record produces the API shape
//! `{ id, sha1, name, mimeType, width, height, blob, created, lastModified }` with RFC 3339
//! timestamps and the blob as base64 text.

use crate::content::{serialize_blob, ContentInfo};
use crate::{FilesError, FilesResult};
use chrono::{DateTime, Utc};
use mediastore_types::{FileName, Sha1Hash};
use std::fs;
use std::path::Path;

/// A file whose identity and metadata follow from its content.
///
/// `sha1`, `mime_type`, `width` and `height` always describe the blob most recently set;
/// they are replaced together by [`FileRecord::set_blob`]. The blob itself may be absent
/// when a store was asked not to load it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    id: Option<String>,
    sha1: Sha1Hash,
    name: FileName,
    mime_type: String,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(serialize_with = "serialize_blob")]
    blob: Option<Vec<u8>>,
    created: Option<DateTime<Utc>>,
    last_modified: Option<DateTime<Utc>>,
}

/// Field set of a persisted file, as written and read by storage backends.
///
/// The blob is never part of the stored description; backends attach it when loading.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FileDescription {
    pub id: Option<String>,
    pub sha1: Sha1Hash,
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    pub created: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub blob: Option<Vec<u8>>,
}

impl FileRecord {
    /// Creates an unsaved record from a name and its content.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidInput`] if the blob is empty or the name is empty after
    /// sanitisation.
    pub fn new(name: &str, blob: Vec<u8>) -> FilesResult<Self> {
        let info = ContentInfo::derive(&blob)?;
        Ok(Self {
            id: None,
            sha1: info.sha1,
            name: sanitize_name(name)?,
            mime_type: info.mime_type,
            width: info.width,
            height: info.height,
            blob: Some(blob),
            created: None,
            last_modified: None,
        })
    }

    /// Reads a file from disk into an unsaved record.
    ///
    /// Returns `None` when the path cannot be canonicalised, the file cannot be read, the
    /// file is empty, or its base name sanitises to nothing.
    pub fn from_file(path: &Path) -> Option<Self> {
        let path = match path.canonicalize() {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!("cannot resolve {}: {}", path.display(), e);
                return None;
            }
        };

        let blob = match fs::read(&path) {
            Ok(blob) if !blob.is_empty() => blob,
            Ok(_) => {
                tracing::debug!("skipping empty file {}", path.display());
                return None;
            }
            Err(e) => {
                tracing::debug!("cannot read {}: {}", path.display(), e);
                return None;
            }
        };

        let base_name = path.file_name()?.to_string_lossy();
        match Self::new(&base_name, blob) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("cannot build record for {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Rebuilds a record from persisted fields.
    ///
    /// The digest, media type and dimensions are taken verbatim; nothing is re-derived from
    /// the blob.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidInput`] if the stored name is not in sanitised form or
    /// the description carries an empty blob.
    pub fn from_description(description: FileDescription) -> FilesResult<Self> {
        let name = FileName::parse(&description.name).map_err(|e| {
            FilesError::InvalidInput(format!("Stored name is not sanitised: {}", e))
        })?;

        if matches!(&description.blob, Some(blob) if blob.is_empty()) {
            return Err(FilesError::InvalidInput("Stored blob cannot be empty".to_string()));
        }

        Ok(Self {
            id: description.id,
            sha1: description.sha1,
            name,
            mime_type: description.mime_type,
            width: description.width,
            height: description.height,
            blob: description.blob,
            created: description.created,
            last_modified: description.last_modified,
        })
    }

    /// Replaces the content and re-derives digest, media type and dimensions.
    ///
    /// On error the record is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidInput`] if `blob` is empty.
    pub fn set_blob(&mut self, blob: Vec<u8>) -> FilesResult<&mut Self> {
        let info = ContentInfo::derive(&blob)?;
        self.sha1 = info.sha1;
        self.mime_type = info.mime_type;
        self.width = info.width;
        self.height = info.height;
        self.blob = Some(blob);
        Ok(self)
    }

    /// Sets the name after sanitising it.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidInput`] if nothing is left after sanitisation.
    pub fn set_name(&mut self, name: &str) -> FilesResult<&mut Self> {
        self.name = sanitize_name(name)?;
        Ok(self)
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn sha1(&self) -> &Sha1Hash {
        &self.sha1
    }

    pub fn name(&self) -> &FileName {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn created(&self) -> Option<DateTime<Utc>> {
        self.created
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    /// The content, or `None` when it was not loaded.
    pub fn blob(&self) -> Option<&[u8]> {
        self.blob.as_deref()
    }

    /// Returns the persisted field set of this record, without the blob.
    pub fn description(&self) -> FileDescription {
        FileDescription {
            id: self.id.clone(),
            sha1: self.sha1.clone(),
            name: self.name.as_str().to_string(),
            mime_type: self.mime_type.clone(),
            width: self.width,
            height: self.height,
            created: self.created,
            last_modified: self.last_modified,
            blob: None,
        }
    }

    /// Drops the content, keeping the metadata.
    pub fn without_blob(mut self) -> Self {
        self.blob = None;
        self
    }

    pub(crate) fn into_blob(self) -> Option<Vec<u8>> {
        self.blob
    }
}

pub(crate) fn sanitize_name(name: &str) -> FilesResult<FileName> {
    FileName::sanitize(name)
        .map_err(|_| FilesError::InvalidInput("Name cannot be an empty string".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures;
    use tempfile::TempDir;

    fn hello() -> FileRecord {
        FileRecord::new("hello.txt", b"hello".to_vec()).unwrap()
    }

    #[test]
    fn test_new_derives_metadata() {
        let record = hello();

        assert_eq!(record.id(), None);
        assert_eq!(
            record.sha1().as_str(),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
        assert_eq!(record.name().as_str(), "hello.txt");
        assert_eq!(record.mime_type(), "text/plain");
        assert_eq!(record.width(), None);
        assert_eq!(record.height(), None);
        assert_eq!(record.blob(), Some(&b"hello"[..]));
        assert_eq!(record.created(), None);
        assert_eq!(record.last_modified(), None);
    }

    #[test]
    fn test_new_rejects_empty_blob() {
        let result = FileRecord::new("empty.txt", Vec::new());
        assert!(matches!(result, Err(FilesError::InvalidInput(_))));
    }

    #[test]
    fn test_new_rejects_unusable_name() {
        let result = FileRecord::new("***", b"hello".to_vec());
        assert!(matches!(result, Err(FilesError::InvalidInput(_))));
    }

    #[test]
    fn test_set_blob_is_idempotent() {
        let jpeg = fixtures::jpeg(320, 200);
        let mut record = hello();

        record.set_blob(jpeg.clone()).unwrap();
        let first = record.clone();
        record.set_blob(jpeg).unwrap();

        assert_eq!(record.sha1(), first.sha1());
        assert_eq!(record.mime_type(), first.mime_type());
        assert_eq!(record.width(), first.width());
        assert_eq!(record.height(), first.height());
    }

    #[test]
    fn test_set_blob_replaces_all_derived_fields() {
        let mut record = FileRecord::new("photo.jpg", fixtures::jpeg(800, 600)).unwrap();
        assert_eq!(record.mime_type(), "image/jpeg");
        assert_eq!(record.width(), Some(800));
        assert_eq!(record.height(), Some(600));

        record.set_blob(b"hello".to_vec()).unwrap();

        assert_eq!(
            record.sha1().as_str(),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
        assert_eq!(record.mime_type(), "text/plain");
        assert_eq!(record.width(), None);
        assert_eq!(record.height(), None);
    }

    #[test]
    fn test_set_blob_empty_leaves_record_unchanged() {
        let mut record = hello();
        let before = record.clone();

        let result = record.set_blob(Vec::new());

        assert!(matches!(result, Err(FilesError::InvalidInput(_))));
        assert_eq!(record, before);
    }

    #[test]
    fn test_set_name_sanitises() {
        let mut record = hello();

        record.set_name("  Holiday Photo (2).JPG ").unwrap();
        assert_eq!(record.name().as_str(), "holiday-photo--2-.jpg");

        record.set_name("Already-Clean_Name.txt").unwrap();
        assert_eq!(record.name().as_str(), "already-clean_name.txt");
    }

    #[test]
    fn test_set_name_rejects_only_disallowed_characters() {
        let mut record = hello();

        let result = record.set_name("***");

        assert!(matches!(result, Err(FilesError::InvalidInput(_))));
        assert_eq!(record.name().as_str(), "hello.txt");
    }

    #[test]
    fn test_from_file_success() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("Report 2024.TXT");
        fs::write(&path, b"Hello, World!").unwrap();

        let record = FileRecord::from_file(&path).unwrap();

        assert_eq!(record.name().as_str(), "report-2024.txt");
        assert_eq!(
            record.sha1().as_str(),
            "0a0a9f2a6772942557ab5355d76af442f8f65e01"
        );
        assert_eq!(record.mime_type(), "text/plain");
        assert_eq!(record.blob(), Some(&b"Hello, World!"[..]));
    }

    #[test]
    fn test_from_file_image() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pixel.png");
        fs::write(&path, fixtures::png(16, 9)).unwrap();

        let record = FileRecord::from_file(&path).unwrap();

        assert_eq!(record.mime_type(), "image/png");
        assert_eq!(record.width(), Some(16));
        assert_eq!(record.height(), Some(9));
    }

    #[test]
    fn test_from_file_nonexistent_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(FileRecord::from_file(&temp.path().join("missing.txt")).is_none());
    }

    #[test]
    fn test_from_file_empty_is_none() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.dat");
        fs::write(&path, b"").unwrap();

        assert!(FileRecord::from_file(&path).is_none());
    }

    #[test]
    fn test_from_file_directory_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(FileRecord::from_file(temp.path()).is_none());
    }

    #[test]
    fn test_from_description_trusts_stored_metadata() {
        let created = "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let description = FileDescription {
            id: Some("42".to_string()),
            sha1: Sha1Hash::parse("0000000000000000000000000000000000000000").unwrap(),
            name: "scan.png".to_string(),
            mime_type: "image/png".to_string(),
            width: Some(10),
            height: Some(20),
            created: Some(created),
            last_modified: Some(created),
            blob: Some(b"hello".to_vec()),
        };

        let record = FileRecord::from_description(description).unwrap();

        assert_eq!(record.id(), Some("42"));
        assert_eq!(
            record.sha1().as_str(),
            "0000000000000000000000000000000000000000"
        );
        assert_eq!(record.mime_type(), "image/png");
        assert_eq!(record.width(), Some(10));
        assert_eq!(record.created(), Some(created));
        assert_eq!(record.blob(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_from_description_rejects_unsanitised_name() {
        let mut description = hello().description();
        description.name = "Not Clean.txt".to_string();

        let result = FileRecord::from_description(description);
        assert!(matches!(result, Err(FilesError::InvalidInput(_))));
    }

    #[test]
    fn test_from_description_rejects_empty_blob() {
        let mut description = hello().description();
        description.blob = Some(Vec::new());

        let result = FileRecord::from_description(description);
        assert!(matches!(result, Err(FilesError::InvalidInput(_))));
    }

    #[test]
    fn test_description_omits_blob() {
        let record = hello();
        let description = record.description();

        assert_eq!(description.blob, None);
        let rebuilt = FileRecord::from_description(description).unwrap();
        assert_eq!(rebuilt, record.without_blob());
    }

    #[test]
    fn test_serialization_shape() {
        let created = "2024-01-01T12:30:00Z".parse::<DateTime<Utc>>().unwrap();
        let mut description = FileRecord::new("hello.txt", b"Hello, World!".to_vec())
            .unwrap()
            .description();
        description.id = Some("7".to_string());
        description.created = Some(created);
        description.blob = Some(b"Hello, World!".to_vec());
        let record = FileRecord::from_description(description).unwrap();

        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": "7",
                "sha1": "0a0a9f2a6772942557ab5355d76af442f8f65e01",
                "name": "hello.txt",
                "mimeType": "text/plain",
                "width": null,
                "height": null,
                "blob": "SGVsbG8sIFdvcmxkIQ==",
                "created": "2024-01-01T12:30:00Z",
                "lastModified": null,
            })
        );
    }

    #[test]
    fn test_serialization_without_blob_is_null() {
        let json = serde_json::to_value(hello().without_blob()).unwrap();

        assert!(json["blob"].is_null());
        assert!(json["id"].is_null());
    }

    #[test]
    fn test_description_json_round_trip_uses_snake_case() {
        let description = hello().description();
        let json = serde_json::to_value(&description).unwrap();

        assert!(json.get("mime_type").is_some());
        assert!(json.get("last_modified").is_some());
        assert!(json.get("blob").is_none());

        let back: FileDescription = serde_json::from_value(json).unwrap();
        assert_eq!(back, description);
    }
}
