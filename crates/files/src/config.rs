//! Store configuration.
//!
//! Configuration is resolved once at process startup and passed into the stores. Nothing in
//! this crate reads environment variables; the binary does that and hands the values over.

use crate::constants::DEFAULT_DATA_DIR;
use crate::{FilesError, FilesResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    data_dir: PathBuf,
}

impl StoreConfig {
    /// Create a new `StoreConfig`.
    ///
    /// The directory does not have to exist yet, but if something already exists at that
    /// path it must be a directory.
    pub fn new(data_dir: PathBuf) -> FilesResult<Self> {
        if data_dir.as_os_str().is_empty() {
            return Err(FilesError::InvalidInput("data_dir cannot be empty".into()));
        }

        if data_dir.exists() && !data_dir.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                data_dir.display()
            )));
        }

        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Creates the data directory if it is missing.
    pub fn ensure_data_dir(&self) -> FilesResult<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            FilesError::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory {}: {}",
                    self.data_dir.display(),
                    e
                ),
            ))
        })
    }
}

/// Resolve the data directory from an optional configured value.
///
/// If `value` is `None` or empty/whitespace, the default directory is used.
pub fn resolve_data_dir(value: Option<String>) -> PathBuf {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}
