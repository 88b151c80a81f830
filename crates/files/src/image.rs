//! Persisted image records.

use crate::content::{serialize_blob, ContentInfo};
use crate::record::{sanitize_name, FileRecord};
use crate::FilesResult;
use chrono::{DateTime, Utc};
use mediastore_types::{FileName, Sha1Hash};
use mediastore_uuid::ShardableUuid;

/// An image identified by a uuid that is assigned at creation and never changes.
///
/// Content metadata follows the same rules as [`FileRecord`]: it is derived from the blob
/// and replaced as a whole whenever the blob changes. The uuid is the key under which the
/// image is held in an [`ImageCollection`](crate::ImageCollection).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    uuid: ShardableUuid,
    sha1: Sha1Hash,
    name: FileName,
    mime_type: String,
    width: Option<u32>,
    height: Option<u32>,
    description: Option<String>,
    #[serde(serialize_with = "serialize_blob")]
    blob: Option<Vec<u8>>,
    created: Option<DateTime<Utc>>,
    last_modified: Option<DateTime<Utc>>,
}

impl ImageRecord {
    /// Creates an image from a name and its content.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidInput`](crate::FilesError::InvalidInput) if the blob is
    /// empty or the name is empty after sanitisation.
    pub fn new(uuid: ShardableUuid, name: &str, blob: Vec<u8>) -> FilesResult<Self> {
        let info = ContentInfo::derive(&blob)?;
        Ok(Self {
            uuid,
            sha1: info.sha1,
            name: sanitize_name(name)?,
            mime_type: info.mime_type,
            width: info.width,
            height: info.height,
            description: None,
            blob: Some(blob),
            created: None,
            last_modified: None,
        })
    }

    /// Turns a file record into an image with the given identity.
    ///
    /// The file's metadata and blob carry over unchanged; its id and timestamps do not.
    pub fn from_file_record(uuid: ShardableUuid, file: FileRecord) -> Self {
        let sha1 = file.sha1().clone();
        let name = file.name().clone();
        let mime_type = file.mime_type().to_string();
        let (width, height) = (file.width(), file.height());

        Self {
            uuid,
            sha1,
            name,
            mime_type,
            width,
            height,
            description: None,
            blob: file.into_blob(),
            created: None,
            last_modified: None,
        }
    }

    /// Replaces the content and re-derives digest, media type and dimensions.
    ///
    /// On error the record is left untouched.
    pub fn set_blob(&mut self, blob: Vec<u8>) -> FilesResult<&mut Self> {
        let info = ContentInfo::derive(&blob)?;
        self.sha1 = info.sha1;
        self.mime_type = info.mime_type;
        self.width = info.width;
        self.height = info.height;
        self.blob = Some(blob);
        Ok(self)
    }

    pub fn set_name(&mut self, name: &str) -> FilesResult<&mut Self> {
        self.name = sanitize_name(name)?;
        Ok(self)
    }

    /// Sets the free-text description, kept exactly as given. An empty string clears it.
    pub fn set_description(&mut self, description: Option<&str>) -> &mut Self {
        self.description = description
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.set_description(Some(description));
        self
    }

    pub fn uuid(&self) -> &ShardableUuid {
        &self.uuid
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

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
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

    /// Drops the content, keeping the metadata.
    pub fn without_blob(mut self) -> Self {
        self.blob = None;
        self
    }

    /// Records persistence timestamps. Only stores assign these.
    pub(crate) fn stamp(&mut self, created: DateTime<Utc>, last_modified: DateTime<Utc>) {
        self.created = Some(created);
        self.last_modified = Some(last_modified);
    }
}
