//! Content-addressed file storage on the local filesystem.
//!
//! [`FilesService`] implements [`Files`] on top of a data directory:
//!
//! ```text
//! <data_dir>/
//! └── files/
//!     ├── sha1/                 # content-addressed by SHA-1
//!     │   └── ab/               # two-level sharding
//!     │       └── cd/
//!     │           ├── abcd12…       # blob
//!     │           └── abcd12….json  # description (no blob)
//!     └── ids/                  # id -> digest index
//!         └── 55/0e/550e84…     # contains the digest
//! ```
//!
//! # Content Addressing
//!
//! - **Deduplication**: saving identical content twice yields the same stored file; the
//!   id and creation time of the first save are kept
//! - **Integrity**: blobs are verified against their digest when loaded
//! - **Deterministic paths**: same content always produces the same path
//!
//! # Identity
//!
//! Ids are canonical uuids drawn from a [`UuidSource`]. Ids that are not canonical uuids
//! cannot name a stored file, so lookups with them simply miss.
//!
//! Saving a stored file whose content has changed keeps its id and creation time: the id is
//! re-pointed at the new digest and the previous blob is removed. A digest names at most one
//! file, so moving onto content already stored under another id is rejected.

use crate::constants::{DESCRIPTION_EXTENSION, FILES_FOLDER_NAME, HASH_FOLDER_NAME, IDS_FOLDER_NAME};
use crate::content::sha1_digest;
use crate::record::{FileDescription, FileRecord};
use crate::repository::Files;
use crate::{FilesError, FilesResult, StoreConfig};
use chrono::Utc;
use mediastore_types::Sha1Hash;
use mediastore_uuid::{RandomUuidSource, ShardableUuid, UuidSource};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Filesystem-backed [`Files`] store rooted at a data directory.
pub struct FilesService {
    /// Canonicalised data directory
    root_directory: PathBuf,

    /// Source of ids for newly stored files
    uuid_source: Box<dyn UuidSource>,
}

impl fmt::Debug for FilesService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilesService")
            .field("root_directory", &self.root_directory)
            .finish_non_exhaustive()
    }
}

impl FilesService {
    /// Creates a store rooted at `root_directory`, assigning random ids.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if the directory does not exist, is not a
    /// directory, or cannot be canonicalised.
    pub fn new(root_directory: &Path) -> FilesResult<Self> {
        Self::with_uuid_source(root_directory, RandomUuidSource)
    }

    /// Creates a store for the configured data directory.
    pub fn from_config(config: &StoreConfig) -> FilesResult<Self> {
        Self::new(config.data_dir())
    }

    /// Creates a store that draws ids for new files from `uuid_source`.
    pub fn with_uuid_source(
        root_directory: &Path,
        uuid_source: impl UuidSource + 'static,
    ) -> FilesResult<Self> {
        if !root_directory.exists() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Directory does not exist: {}",
                root_directory.display()
            )));
        }

        if !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self {
            root_directory,
            uuid_source: Box::new(uuid_source),
        })
    }

    /// Reads the stored blob for `sha1`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::NotFound` if nothing is stored under the digest and
    /// `FilesError::Io` if the blob cannot be read.
    pub fn read(&self, sha1: &Sha1Hash) -> FilesResult<Vec<u8>> {
        let storage_path = self.compute_storage_path(sha1);

        if !storage_path.exists() {
            return Err(FilesError::NotFound(format!(
                "File not found for hash: {}",
                sha1
            )));
        }

        fs::read(&storage_path).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read file from {}: {}", storage_path.display(), e),
            ))
        })
    }

    /// Absolute path of the blob: `<root>/files/sha1/<shard1>/<shard2>/<hash>`.
    fn compute_storage_path(&self, sha1: &Sha1Hash) -> PathBuf {
        self.root_directory.join(Self::compute_relative_path(sha1))
    }

    /// Path of the blob relative to the data directory.
    fn compute_relative_path(sha1: &Sha1Hash) -> PathBuf {
        let hash_hex = sha1.as_str();
        let shard1 = &hash_hex[0..2];
        let shard2 = &hash_hex[2..4];
        Path::new(FILES_FOLDER_NAME)
            .join(HASH_FOLDER_NAME)
            .join(shard1)
            .join(shard2)
            .join(hash_hex)
    }

    fn description_path(&self, sha1: &Sha1Hash) -> PathBuf {
        self.compute_storage_path(sha1)
            .with_extension(DESCRIPTION_EXTENSION)
    }

    fn id_index_path(&self, id: &ShardableUuid) -> PathBuf {
        id.sharded_dir(&self.ids_directory())
    }

    fn files_directory(&self) -> PathBuf {
        self.root_directory.join(FILES_FOLDER_NAME)
    }

    fn ids_directory(&self) -> PathBuf {
        self.files_directory().join(IDS_FOLDER_NAME)
    }

    fn read_description(&self, sha1: &Sha1Hash) -> FilesResult<Option<FileDescription>> {
        let path = self.description_path(sha1);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FilesError::Io(e)),
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn write_description(&self, description: &FileDescription) -> FilesResult<()> {
        let path = self.description_path(&description.sha1);
        write_creating_parents(&path, &serde_json::to_vec_pretty(description)?)
    }

    /// Resolves an id through the index. Missing or corrupt entries resolve to `None`.
    fn resolve_id(&self, id: &ShardableUuid) -> FilesResult<Option<Sha1Hash>> {
        let path = self.id_index_path(id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(FilesError::Io(e)),
        };

        match Sha1Hash::parse(contents.trim()) {
            Ok(sha1) => Ok(Some(sha1)),
            Err(e) => {
                tracing::warn!("corrupt id index entry {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    /// The stored description owned by `id`.
    ///
    /// Ids that are malformed, unknown or whose index entry points at another file's
    /// description resolve to `None`.
    fn owned_description(
        &self,
        id: Option<&str>,
    ) -> FilesResult<Option<(ShardableUuid, FileDescription)>> {
        let Some(Ok(id)) = id.map(ShardableUuid::parse) else {
            return Ok(None);
        };
        let Some(sha1) = self.resolve_id(&id)? else {
            return Ok(None);
        };

        let key = id.to_string();
        match self.read_description(&sha1)? {
            Some(description) if description.id.as_deref() == Some(key.as_str()) => {
                Ok(Some((id, description)))
            }
            _ => {
                tracing::warn!(%id, %sha1, "id index entry does not match the stored file");
                Ok(None)
            }
        }
    }

    /// Builds the record for a stored description, attaching the verified blob if asked.
    fn load(
        &self,
        mut description: FileDescription,
        load_blob: bool,
    ) -> FilesResult<Option<FileRecord>> {
        if load_blob {
            let blob = self.read(&description.sha1)?;
            if sha1_digest(&blob) != description.sha1 {
                tracing::warn!(
                    "stored blob does not match its digest: {}",
                    self.compute_storage_path(&description.sha1).display()
                );
                return Ok(None);
            }
            description.blob = Some(blob);
        }
        FileRecord::from_description(description).map(Some)
    }
}

impl Files for FilesService {
    fn get_by_id(&self, id: &str, load_blob: bool) -> FilesResult<Option<FileRecord>> {
        let Ok(id) = ShardableUuid::parse(id) else {
            tracing::debug!("id is not a stored file id: {}", id);
            return Ok(None);
        };

        match self.resolve_id(&id)? {
            Some(sha1) => self.get_by_sha1(&sha1, load_blob),
            None => Ok(None),
        }
    }

    fn get_by_sha1(&self, sha1: &Sha1Hash, load_blob: bool) -> FilesResult<Option<FileRecord>> {
        match self.read_description(sha1)? {
            Some(description) => self.load(description, load_blob),
            None => Ok(None),
        }
    }

    fn save(&mut self, file: &FileRecord, load_blob: bool) -> FilesResult<FileRecord> {
        let now = Utc::now();
        let sha1 = file.sha1().clone();
        let storage_path = self.compute_storage_path(&sha1);

        let owned = self.owned_description(file.id())?;
        let at_digest = self.read_description(&sha1)?;

        // Id whose index entry must point at `sha1` once the content is written.
        let mut index = None;
        // Digest previously owned by this file, released after the move.
        let mut replaced = None;

        let description = match (owned, at_digest) {
            (Some((_, mut previous)), _) if previous.sha1 == sha1 => {
                previous.name = file.name().as_str().to_string();
                previous.last_modified = Some(now);
                previous
            }
            (Some((id, _)), Some(other)) => {
                return Err(FilesError::InvalidInput(format!(
                    "Content of file {} is already stored as file {}",
                    id,
                    other.id.as_deref().unwrap_or_default()
                )));
            }
            (Some((id, previous)), None) => {
                let mut description = file.description();
                description.id = Some(id.to_string());
                description.created = previous.created.or(Some(now));
                description.last_modified = Some(now);
                replaced = Some(previous.sha1);
                index = Some(id);
                description
            }
            (None, Some(mut existing)) => {
                existing.name = file.name().as_str().to_string();
                existing.last_modified = Some(now);
                existing
            }
            (None, None) => {
                let id = self.uuid_source.next_uuid();
                let mut description = file.description();
                description.id = Some(id.to_string());
                description.created = Some(now);
                description.last_modified = Some(now);
                index = Some(id);
                description
            }
        };

        if !storage_path.exists() {
            let blob = file.blob().ok_or_else(|| {
                FilesError::InvalidInput(format!("Cannot store {} without its content", sha1))
            })?;
            write_creating_parents(&storage_path, blob)?;
        }

        self.write_description(&description)?;

        if let Some(id) = &index {
            write_creating_parents(&self.id_index_path(id), sha1.as_str().as_bytes())?;
        }

        if let Some(previous) = &replaced {
            remove_if_present(&self.compute_storage_path(previous))?;
            remove_if_present(&self.description_path(previous))?;
        }

        tracing::info!(
            id = description.id.as_deref().unwrap_or_default(),
            %sha1,
            "stored file {}",
            description.name
        );

        self.load(description, load_blob)?.ok_or_else(|| {
            FilesError::NotFound(format!("Stored file failed verification: {}", sha1))
        })
    }

    fn delete(&mut self, file: FileRecord) -> FilesResult<()> {
        let id = file
            .id()
            .ok_or_else(|| FilesError::InvalidInput("Cannot delete an unsaved file".into()))?;
        let not_found = || FilesError::NotFound(format!("File not found for id: {}", id));

        let id = ShardableUuid::parse(id).map_err(|_| not_found())?;
        let sha1 = self.resolve_id(&id)?.ok_or_else(not_found)?;

        remove_if_present(&self.compute_storage_path(&sha1))?;
        remove_if_present(&self.description_path(&sha1))?;
        remove_if_present(&self.id_index_path(&id))?;

        tracing::info!(%id, %sha1, "deleted file");
        Ok(())
    }
}

fn write_creating_parents(path: &Path, contents: &[u8]) -> FilesResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create storage directory {}: {}",
                    parent.display(),
                    e
                ),
            ))
        })?;
    }

    fs::write(path, contents).map_err(|e| {
        FilesError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to write file to {}: {}", path.display(), e),
        ))
    })
}

fn remove_if_present(path: &Path) -> FilesResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FilesError::Io(e)),
    }
}
