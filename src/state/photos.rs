/// Stored photos fetched for the list rows and the edit dialog
///
/// Keyed by the path a record carries in `image`: a new upload comes back
/// under a new path and is fetched again, unchanged rows keep their handle.
/// Each path is requested once. A failed fetch stays failed until the next
/// manual reload.

use std::collections::{HashMap, HashSet};

use iced::widget::image::Handle;

use super::data::Record;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone)]
enum PhotoSlot {
    Fetching,
    Ready(Handle),
    Failed,
}

#[derive(Debug, Default)]
pub struct PhotoCache {
    slots: HashMap<String, PhotoSlot>,
}

impl PhotoCache {
    /// Photo paths of `records` not requested yet. They are marked as fetching.
    pub fn request_missing(&mut self, records: &[Record]) -> Vec<String> {
        let mut requested = Vec::new();
        for path in records.iter().filter_map(Record::photo) {
            if !self.slots.contains_key(path) {
                self.slots.insert(path.to_string(), PhotoSlot::Fetching);
                requested.push(path.to_string());
            }
        }
        requested
    }

    /// Land a finished fetch. Bytes in no known image format count as a failure.
    pub fn accept(&mut self, path: String, result: ClientResult<Vec<u8>>) {
        let Some(slot) = self.slots.get_mut(&path) else {
            tracing::debug!(photo = %path, "photo no longer listed, dropping it");
            return;
        };

        let checked = result.and_then(|bytes| match image::guess_format(&bytes) {
            Ok(_) => Ok(bytes),
            Err(e) => Err(ClientError::Image(format!("{path}: {e}"))),
        });

        *slot = match checked {
            Ok(bytes) => {
                tracing::debug!(photo = %path, size = bytes.len(), "photo fetched");
                PhotoSlot::Ready(Handle::from_bytes(bytes))
            }
            Err(e) => {
                tracing::warn!(photo = %path, kind = ?e.kind(), error = %e, "photo unavailable");
                PhotoSlot::Failed
            }
        };
    }

    /// Drop photos that no listed record refers to
    pub fn retain_listed(&mut self, records: &[Record]) {
        let listed: HashSet<&str> = records.iter().filter_map(Record::photo).collect();
        self.slots.retain(|path, _| listed.contains(path.as_str()));
    }

    /// Forget failed fetches so the next `request_missing` tries them again
    pub fn forget_failures(&mut self) {
        self.slots.retain(|_, slot| !matches!(slot, PhotoSlot::Failed));
    }

    /// Display handle for a record's photo, once it has arrived
    pub fn get(&self, record: &Record) -> Option<&Handle> {
        match self.slots.get(record.photo()?) {
            Some(PhotoSlot::Ready(handle)) => Some(handle),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::fixtures::{ada, alan, grace};
    use crate::state::staging::fixtures::png_bytes;

    fn with_photo(record: Record, path: &str) -> Record {
        Record {
            image: Some(path.to_string()),
            ..record
        }
    }

    #[test]
    fn test_each_path_is_requested_once() {
        let mut cache = PhotoCache::default();
        let twin = with_photo(grace(), "images/ada.png");

        let requested = cache.request_missing(&[ada(), alan(), twin]);

        assert_eq!(requested, vec!["images/ada.png".to_string()]);
        assert!(cache.request_missing(&[ada()]).is_empty());
        assert!(cache.get(&ada()).is_none());
    }

    #[test]
    fn test_fetched_photo_is_shared_by_path() {
        let mut cache = PhotoCache::default();
        cache.request_missing(&[ada()]);

        cache.accept("images/ada.png".to_string(), Ok(png_bytes(8, 8)));

        assert!(cache.get(&ada()).is_some());
        assert!(cache.get(&with_photo(grace(), "images/ada.png")).is_some());
        assert!(cache.get(&alan()).is_none());
    }

    #[test]
    fn test_failures_wait_for_reload() {
        let mut cache = PhotoCache::default();
        cache.request_missing(&[ada()]);

        cache.accept("images/ada.png".to_string(), Ok(b"<html>not found</html>".to_vec()));
        assert!(cache.get(&ada()).is_none());
        assert!(cache.request_missing(&[ada()]).is_empty());

        cache.forget_failures();
        assert_eq!(cache.request_missing(&[ada()]), vec!["images/ada.png".to_string()]);
    }

    #[test]
    fn test_unlisted_photos_are_dropped() {
        let mut cache = PhotoCache::default();
        cache.request_missing(&[ada()]);
        cache.accept("images/ada.png".to_string(), Ok(png_bytes(2, 2)));

        let replaced = with_photo(ada(), "images/ada-2.png");
        cache.retain_listed(&[replaced.clone()]);
        assert!(cache.get(&ada()).is_none());

        // a fetch that lands after its path was dropped is ignored
        cache.accept("images/ada.png".to_string(), Ok(png_bytes(2, 2)));
        assert!(cache.get(&ada()).is_none());
        assert_eq!(cache.request_missing(&[replaced]), vec!["images/ada-2.png".to_string()]);
    }
}
