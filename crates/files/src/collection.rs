//! Keyed, ordered collection of images with a single traversal cursor.
//!
//! The keyed store and the cursor share one insertion-ordered map, so inserts and removals
//! made through either facet are visible to the other.

use crate::image::ImageRecord;
use crate::{FilesError, FilesResult};
use indexmap::IndexMap;

/// Images keyed by their canonical uuid string, in insertion order.
///
/// Every slot holds a complete [`ImageRecord`]; there are no empty placeholders.
///
/// Only one cursor traversal can be in progress at a time. [`ImageCollection::reset`]
/// restarts it from the first remaining image. For plain iteration that does not touch the
/// cursor, use [`ImageCollection::iter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageCollection {
    images: IndexMap<String, ImageRecord>,
    cursor: usize,
}

impl ImageCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Returns `true` if an image is stored under `key`.
    pub fn exists(&self, key: &str) -> bool {
        self.images.contains_key(key)
    }

    /// Returns the image stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::NotFound`] if no image is stored under `key`.
    pub fn get(&self, key: &str) -> FilesResult<&ImageRecord> {
        self.images
            .get(key)
            .ok_or_else(|| FilesError::NotFound(format!("Offset not found: {}", key)))
    }

    /// Stores `image` under its own uuid, replacing any image with the same uuid.
    ///
    /// A replaced image keeps its original position in the traversal order. Returns the
    /// replaced image, if any.
    pub fn set(&mut self, image: ImageRecord) -> Option<ImageRecord> {
        let key = image.uuid().to_string();
        self.images.insert(key, image)
    }

    /// Removes the image stored under `key`. Absent keys are ignored.
    ///
    /// If the cursor sits on the removed image it moves on to the following one; otherwise it
    /// stays on the image it pointed at.
    pub fn remove(&mut self, key: &str) -> Option<ImageRecord> {
        let (index, _, image) = self.images.shift_remove_full(key)?;
        if index < self.cursor {
            self.cursor -= 1;
        }
        Some(image)
    }

    /// The image under the cursor, or `None` once the cursor has run past the end.
    pub fn current(&self) -> Option<&ImageRecord> {
        self.images.get_index(self.cursor).map(|(_, image)| image)
    }

    /// The key of the image under the cursor.
    pub fn key(&self) -> Option<&str> {
        self.images
            .get_index(self.cursor)
            .map(|(key, _)| key.as_str())
    }

    /// Moves the cursor one position forward.
    pub fn advance(&mut self) {
        if self.cursor < self.images.len() {
            self.cursor += 1;
        }
    }

    /// Returns `true` while [`ImageCollection::current`] yields an image.
    pub fn is_valid(&self) -> bool {
        self.current().is_some()
    }

    /// Moves the cursor back to the first image.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Keys in traversal order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }

    /// Images in traversal order, independent of the cursor.
    pub fn iter(&self) -> indexmap::map::Values<'_, String, ImageRecord> {
        self.images.values()
    }
}

impl FromIterator<ImageRecord> for ImageCollection {
    fn from_iter<I: IntoIterator<Item = ImageRecord>>(iter: I) -> Self {
        let mut collection = Self::new();
        collection.extend(iter);
        collection
    }
}

impl Extend<ImageRecord> for ImageCollection {
    fn extend<I: IntoIterator<Item = ImageRecord>>(&mut self, iter: I) {
        for image in iter {
            self.set(image);
        }
    }
}

impl IntoIterator for ImageCollection {
    type Item = ImageRecord;
    type IntoIter = indexmap::map::IntoValues<String, ImageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.into_values()
    }
}

impl<'a> IntoIterator for &'a ImageCollection {
    type Item = &'a ImageRecord;
    type IntoIter = indexmap::map::Values<'a, String, ImageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl serde::Serialize for ImageCollection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures;
    use mediastore_uuid::ShardableUuid;

    fn image(n: u8) -> ImageRecord {
        let uuid = ShardableUuid::parse(&format!("{:032x}", n)).unwrap();
        let name = format!("image-{}.png", n);
        ImageRecord::new(uuid, &name, fixtures::png(n.into(), 1)).unwrap()
    }

    fn key(n: u8) -> String {
        format!("{:032x}", n)
    }

    fn walk(collection: &mut ImageCollection) -> Vec<String> {
        let mut names = Vec::new();
        collection.reset();
        while collection.is_valid() {
            names.push(collection.current().unwrap().name().to_string());
            collection.advance();
        }
        names
    }

    #[test]
    fn test_set_keys_by_uuid() {
        let mut collection = ImageCollection::new();
        collection.set(image(1));

        assert!(collection.exists(&key(1)));
        assert_eq!(
            collection.get(&key(1)).unwrap().name().as_str(),
            "image-1.png"
        );
    }

    #[test]
    fn test_set_same_uuid_overwrites() {
        let mut collection = ImageCollection::new();
        collection.set(image(1));
        collection.set(image(2));

        let mut replacement = image(1);
        replacement.set_name("renamed.png").unwrap();
        let previous = collection.set(replacement);

        assert_eq!(collection.len(), 2);
        assert_eq!(previous.unwrap().name().as_str(), "image-1.png");
        assert_eq!(walk(&mut collection), vec!["renamed.png", "image-2.png"]);
    }

    #[test]
    fn test_get_absent_key_is_not_found() {
        let collection = ImageCollection::new();

        assert!(!collection.exists(&key(9)));
        assert!(matches!(
            collection.get(&key(9)),
            Err(FilesError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_absent_key_is_noop() {
        let mut collection: ImageCollection = [image(1)].into_iter().collect();

        assert!(collection.remove(&key(5)).is_none());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_traversal_skips_removed_keys() {
        let mut collection: ImageCollection = (1..=5).map(image).collect();

        collection.remove(&key(2));
        collection.remove(&key(4));

        assert_eq!(
            walk(&mut collection),
            vec!["image-1.png", "image-3.png", "image-5.png"]
        );
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_cursor_walk_reports_keys() {
        let mut collection: ImageCollection = (1..=3).map(image).collect();

        collection.reset();
        assert_eq!(collection.key(), Some(key(1).as_str()));
        collection.advance();
        assert_eq!(collection.key(), Some(key(2).as_str()));
        collection.advance();
        collection.advance();

        assert!(!collection.is_valid());
        assert_eq!(collection.current(), None);
        assert_eq!(collection.key(), None);

        collection.advance();
        assert!(!collection.is_valid());
    }

    #[test]
    fn test_empty_collection_is_never_valid() {
        let mut collection = ImageCollection::new();
        collection.reset();

        assert!(collection.is_empty());
        assert!(!collection.is_valid());
        assert_eq!(collection.key(), None);
    }

    #[test]
    fn test_remove_before_cursor_keeps_current() {
        let mut collection: ImageCollection = (1..=4).map(image).collect();
        collection.advance();
        collection.advance();
        assert_eq!(collection.key(), Some(key(3).as_str()));

        collection.remove(&key(1));

        assert_eq!(collection.key(), Some(key(3).as_str()));
    }

    #[test]
    fn test_remove_current_moves_to_next() {
        let mut collection: ImageCollection = (1..=3).map(image).collect();
        collection.advance();

        collection.remove(&key(2));

        assert_eq!(collection.key(), Some(key(3).as_str()));
    }

    #[test]
    fn test_reset_after_removing_first() {
        let mut collection: ImageCollection = (1..=3).map(image).collect();
        collection.remove(&key(1));

        collection.reset();

        assert_eq!(collection.key(), Some(key(2).as_str()));
    }

    #[test]
    fn test_iter_does_not_move_cursor() {
        let mut collection: ImageCollection = (1..=3).map(image).collect();
        collection.advance();

        let keys: Vec<&str> = collection.keys().collect();
        let count = collection.iter().count();

        assert_eq!(keys, vec![key(1), key(2), key(3)]);
        assert_eq!(count, 3);
        assert_eq!(collection.key(), Some(key(2).as_str()));
    }

    #[test]
    fn test_serializes_as_array() {
        let collection: ImageCollection = (1..=2).map(|n| image(n).without_blob()).collect();

        let json = serde_json::to_value(&collection).unwrap();

        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["uuid"], key(1));
        assert_eq!(items[1]["name"], "image-2.png");
    }
}
