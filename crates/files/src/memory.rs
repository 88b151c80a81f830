//! In-memory image store.

use crate::collection::ImageCollection;
use crate::image::ImageRecord;
use crate::repository::Images;
use crate::{FilesError, FilesResult};
use chrono::Utc;
use mediastore_types::Sha1Hash;
use mediastore_uuid::ShardableUuid;

/// [`Images`] backed by an [`ImageCollection`] held in memory.
///
/// Saving an image that is already stored keeps its `created` timestamp and refreshes
/// `last_modified`. Saving one without a blob only updates metadata, so the image must
/// already be stored.
#[derive(Debug, Default)]
pub struct MemoryImages {
    images: ImageCollection,
}

impl MemoryImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn loaded(image: &ImageRecord, load_blob: bool) -> ImageRecord {
        if load_blob {
            image.clone()
        } else {
            image.clone().without_blob()
        }
    }
}

impl Images for MemoryImages {
    fn get_by_uuid(
        &self,
        uuid: &ShardableUuid,
        load_blob: bool,
    ) -> FilesResult<Option<ImageRecord>> {
        let key = uuid.to_string();
        if !self.images.exists(&key) {
            return Ok(None);
        }
        Ok(Some(Self::loaded(self.images.get(&key)?, load_blob)))
    }

    fn get_by_sha1(&self, sha1: &Sha1Hash, load_blob: bool) -> FilesResult<Option<ImageRecord>> {
        Ok(self
            .images
            .iter()
            .find(|image| image.sha1() == sha1)
            .map(|image| Self::loaded(image, load_blob)))
    }

    fn get_all(&self) -> FilesResult<ImageCollection> {
        Ok(self
            .images
            .iter()
            .map(|image| Self::loaded(image, false))
            .collect())
    }

    fn save(&mut self, image: &ImageRecord) -> FilesResult<ImageRecord> {
        let key = image.uuid().to_string();
        let existing = self.images.get(&key).ok();
        let now = Utc::now();

        let mut stored = image.clone();
        match existing {
            Some(existing) => {
                if stored.blob().is_none() {
                    if let Some(blob) = existing.blob() {
                        stored.set_blob(blob.to_vec())?;
                    }
                }
                stored.stamp(existing.created().unwrap_or(now), now);
            }
            None => {
                if stored.blob().is_none() {
                    return Err(FilesError::InvalidInput(format!(
                        "Image {} has no content to save",
                        key
                    )));
                }
                stored.stamp(now, now);
            }
        }

        tracing::info!(uuid = %key, sha1 = %stored.sha1(), "saved image");
        self.images.set(stored.clone());
        Ok(stored)
    }

    fn delete(&mut self, image: ImageRecord) -> FilesResult<()> {
        let key = image.uuid().to_string();
        match self.images.remove(&key) {
            Some(_) => {
                tracing::info!(uuid = %key, "deleted image");
                Ok(())
            }
            None => Err(FilesError::NotFound(format!("Image not found: {}", key))),
        }
    }
}
