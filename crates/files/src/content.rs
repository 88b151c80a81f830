//! Content introspection for stored blobs.
//!
//! Everything here is derived from the bytes alone: the digest, the media type (sniffed from
//! the leading bytes, never from a file name) and, for images, the pixel dimensions read
//! from the format header.

use crate::constants::{BINARY_MIME_TYPE, TEXT_MIME_TYPE};
use crate::{FilesError, FilesResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use mediastore_types::Sha1Hash;
use sha1::{Digest, Sha1};

/// Metadata derived from a blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentInfo {
    /// SHA-1 digest of the blob
    pub sha1: Sha1Hash,

    /// Sniffed media type
    pub mime_type: String,

    /// Pixel width, for images whose header could be read
    pub width: Option<u32>,

    /// Pixel height, for images whose header could be read
    pub height: Option<u32>,
}

impl ContentInfo {
    /// Derives digest, media type and dimensions from `blob`.
    ///
    /// Dimensions are only looked for when the media type starts with `image/`. A header
    /// that cannot be decoded leaves both unset and is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidInput`] if `blob` is empty.
    pub fn derive(blob: &[u8]) -> FilesResult<Self> {
        if blob.is_empty() {
            return Err(FilesError::InvalidInput("Blob cannot be empty".to_string()));
        }

        let sha1 = sha1_digest(blob);
        let mime_type = sniff_mime_type(blob);

        let (width, height) = if mime_type.starts_with("image/") {
            match image_dimensions(blob) {
                Some((width, height)) => (Some(width), Some(height)),
                None => {
                    tracing::debug!(%sha1, %mime_type, "image header has no readable dimensions");
                    (None, None)
                }
            }
        } else {
            (None, None)
        };

        Ok(Self {
            sha1,
            mime_type,
            width,
            height,
        })
    }

    /// Returns `true` when the sniffed media type is an image type.
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Computes the SHA-1 digest of `blob`.
pub(crate) fn sha1_digest(blob: &[u8]) -> Sha1Hash {
    let digest: [u8; 20] = Sha1::digest(blob).into();
    Sha1Hash::from_bytes(&digest)
}

/// Sniffs the media type from the leading bytes.
///
/// Known signatures win; otherwise valid UTF-8 is plain text and anything else is an
/// opaque binary stream.
fn sniff_mime_type(blob: &[u8]) -> String {
    if let Some(kind) = infer::get(blob) {
        return kind.mime_type().to_string();
    }

    if std::str::from_utf8(blob).is_ok() {
        TEXT_MIME_TYPE.to_string()
    } else {
        BINARY_MIME_TYPE.to_string()
    }
}

fn image_dimensions(blob: &[u8]) -> Option<(u32, u32)> {
    let size = imagesize::blob_size(blob).ok()?;
    let width = u32::try_from(size.width).ok()?;
    let height = u32::try_from(size.height).ok()?;
    Some((width, height))
}

/// Serialises an optional blob as base64 text, or `null` when absent.
pub(crate) fn serialize_blob<S>(blob: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match blob {
        Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
        None => serializer.serialize_none(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_rejects_empty_blob() {
        assert!(matches!(
            ContentInfo::derive(b""),
            Err(FilesError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_derive_plain_text() {
        let info = ContentInfo::derive(b"hello").unwrap();

        assert_eq!(
            info.sha1.as_str(),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
        assert_eq!(info.mime_type, "text/plain");
        assert_eq!(info.width, None);
        assert_eq!(info.height, None);
        assert!(!info.is_image());
    }

    #[test]
    fn test_derive_jpeg_dimensions() {
        let info = ContentInfo::derive(&fixtures::jpeg(640, 480)).unwrap();

        assert_eq!(info.mime_type, "image/jpeg");
        assert_eq!(info.width, Some(640));
        assert_eq!(info.height, Some(480));
    }

    #[test]
    fn test_derive_png_dimensions() {
        let info = ContentInfo::derive(&fixtures::png(31, 7)).unwrap();

        assert_eq!(info.mime_type, "image/png");
        assert_eq!(info.width, Some(31));
        assert_eq!(info.height, Some(7));
    }

    #[test]
    fn test_derive_truncated_image_has_no_dimensions() {
        let signature_only = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let info = ContentInfo::derive(&signature_only).unwrap();

        assert_eq!(info.mime_type, "image/png");
        assert!(info.is_image());
        assert_eq!(info.width, None);
        assert_eq!(info.height, None);
    }

    #[test]
    fn test_derive_unknown_binary() {
        let info = ContentInfo::derive(&[0x00, 0xFF, 0xFE, 0x80]).unwrap();

        assert_eq!(info.mime_type, "application/octet-stream");
        assert_eq!(info.width, None);
    }

    #[test]
    fn test_derive_is_deterministic() {
        let blobs: Vec<Vec<u8>> = vec![
            b"hello".to_vec(),
            (0..=255).collect(),
            fixtures::jpeg(1, 1),
            fixtures::png(1024, 768),
        ];

        for blob in blobs {
            assert_eq!(
                ContentInfo::derive(&blob).unwrap(),
                ContentInfo::derive(&blob).unwrap()
            );
        }
    }

    #[test]
    fn test_sha1_digest_known_value() {
        assert_eq!(
            sha1_digest(b"Hello, World!").as_str(),
            "0a0a9f2a6772942557ab5355d76af442f8f65e01"
        );
    }
}
