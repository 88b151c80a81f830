//! Storage contracts for file and image records.
//!
//! Backends implement these traits; everything above them works with records only.
//!
//! `load_blob = false` asks for metadata only. A record loaded that way reports
//! `blob() == None`, which callers must read as "not loaded" rather than "empty": empty
//! content is never a valid record.

use crate::collection::ImageCollection;
use crate::image::ImageRecord;
use crate::record::FileRecord;
use crate::FilesResult;
use mediastore_types::Sha1Hash;
use mediastore_uuid::ShardableUuid;

/// Persistence of [`FileRecord`]s.
pub trait Files {
    /// Looks a file up by its store-assigned id.
    fn get_by_id(&self, id: &str, load_blob: bool) -> FilesResult<Option<FileRecord>>;

    /// Looks a file up by its content digest.
    fn get_by_sha1(&self, sha1: &Sha1Hash, load_blob: bool) -> FilesResult<Option<FileRecord>>;

    /// Persists `file` and returns a fresh record carrying the stored id and timestamps.
    fn save(&mut self, file: &FileRecord, load_blob: bool) -> FilesResult<FileRecord>;

    /// Removes a stored file. The record is consumed and cannot be reused.
    fn delete(&mut self, file: FileRecord) -> FilesResult<()>;
}

/// Persistence of [`ImageRecord`]s, keyed by uuid.
pub trait Images {
    fn get_by_uuid(
        &self,
        uuid: &ShardableUuid,
        load_blob: bool,
    ) -> FilesResult<Option<ImageRecord>>;

    fn get_by_sha1(&self, sha1: &Sha1Hash, load_blob: bool) -> FilesResult<Option<ImageRecord>>;

    /// Every stored image, in the order they were first saved. Blobs are not loaded.
    fn get_all(&self) -> FilesResult<ImageCollection>;

    /// Persists `image` and returns a fresh record carrying the stored timestamps.
    fn save(&mut self, image: &ImageRecord) -> FilesResult<ImageRecord>;

    /// Removes a stored image. The record is consumed and cannot be reused.
    fn delete(&mut self, image: ImageRecord) -> FilesResult<()>;
}
