//! Mediastore file records
//!
//! This crate models immutable, content-identified file and image records and a keyed
//! collection for holding them.
//!
//! ## Records
//!
//! - [`FileRecord`] is derived from a byte blob: its SHA-1 digest, sniffed MIME type and,
//!   for images, pixel dimensions are always computed together from the current blob.
//! - [`ImageRecord`] is a persisted image identified by a [`ShardableUuid`], carrying an
//!   optional free-text description.
//!
//! ## Collections
//!
//! [`ImageCollection`] is both a map keyed by each image's uuid and an ordered sequence
//! with a single explicit cursor.
//!
//! ## Storage
//!
//! The [`Files`] and [`Images`] traits are the boundary to persistence backends.
//! [`FilesService`] stores files content-addressed on disk:
//!
//! ```text
//! <data_dir>/
//! └── files/
//!     ├── sha1/
//!     │   └── aa/
//!     │       └── f4/
//!     │           ├── aaf4c61d…        # blob
//!     │           └── aaf4c61d….json   # description
//!     └── ids/
//!         └── 55/0e/550e8400…          # id -> sha1 index
//! ```
//!
//! [`MemoryImages`] keeps images in memory.
//!
//! ## Example Usage
//!
//! ```no_run
//! use mediastore_files::{FileRecord, Files, FilesService, StoreConfig};
//! use std::path::{Path, PathBuf};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StoreConfig::new(PathBuf::from("mediastore_data"))?;
//! config.ensure_data_dir()?;
//!
//! let mut files = FilesService::from_config(&config)?;
//! if let Some(record) = FileRecord::from_file(Path::new("logo.png")) {
//!     let saved = files.save(&record, false)?;
//!     println!("{} -> {}", saved.name(), saved.sha1());
//! }
//! # Ok(())
//! # }
//! ```

mod collection;
mod config;
mod constants;
mod content;
mod files;
mod image;
mod memory;
mod record;
mod repository;

pub use collection::ImageCollection;
pub use config::{resolve_data_dir, StoreConfig};
pub use constants::{DEFAULT_DATA_DIR, FILES_FOLDER_NAME};
pub use content::ContentInfo;
pub use files::FilesService;
pub use image::ImageRecord;
pub use memory::MemoryImages;
pub use record::{FileDescription, FileRecord};
pub use repository::{Files, Images};

pub use mediastore_types::{FileName, Sha1Hash};
pub use mediastore_uuid::{RandomUuidSource, ShardableUuid, UuidSource};

/// Errors that can occur during file and image operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Input rejected by a record, collection or store (empty blob, empty name, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Keyed lookup against an absent entry
    #[error("Not found: {0}")]
    NotFound(String),

    /// Data directory does not exist or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored description could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// UUID error from mediastore-uuid crate
    #[error("UUID error: {0}")]
    Uuid(#[from] mediastore_uuid::UuidError),
}

/// Result type for file and image operations.
pub type FilesResult<T> = Result<T, FilesError>;
