/// Folder under the data directory holding all stored files.
pub const FILES_FOLDER_NAME: &str = "files";

/// Content-addressed blob folder, named after the digest algorithm.
pub(crate) const HASH_FOLDER_NAME: &str = "sha1";

/// Id -> digest index folder.
pub(crate) const IDS_FOLDER_NAME: &str = "ids";

/// Extension of the description stored next to each blob.
pub(crate) const DESCRIPTION_EXTENSION: &str = "json";

/// Data directory used when none is configured.
pub const DEFAULT_DATA_DIR: &str = "mediastore_data";

/// MIME type reported for valid UTF-8 content that no signature matches.
pub(crate) const TEXT_MIME_TYPE: &str = "text/plain";

/// MIME type reported for unrecognised binary content.
pub(crate) const BINARY_MIME_TYPE: &str = "application/octet-stream";
