//! Process-local media store addressing objects as `memory://media/...`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::MediaUrl;
use crate::domain::ports::{MediaStore, MediaStoreError};

const URL_PREFIX: &str = "memory://media";

/// Media store keeping uploaded bytes in a process-local map.
///
/// URLs take the form `memory://media/<folder>/<uuid>.bin`.
#[derive(Debug, Default)]
pub struct InMemoryMediaStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryMediaStore {
    /// Create an empty bucket.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Vec<u8>>>, MediaStoreError> {
        self.objects
            .lock()
            .map_err(|_| MediaStoreError::transport("in-memory media lock poisoned"))
    }

    /// Whether the object behind `url` is stored.
    pub fn contains(&self, url: &MediaUrl) -> bool {
        match (url.object_key(), self.lock()) {
            (Some(key), Ok(objects)) => objects.contains_key(&key),
            _ => false,
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.lock().map(|objects| objects.len()).unwrap_or_default()
    }

    /// Whether no object is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn upload(&self, bytes: Vec<u8>, folder: &str) -> Result<MediaUrl, MediaStoreError> {
        let folder = folder.trim_matches('/');
        if folder.is_empty() || folder.contains(char::is_whitespace) {
            return Err(MediaStoreError::rejected(format!(
                "invalid media folder {folder:?}"
            )));
        }
        let key = format!("{folder}/{}", Uuid::new_v4());
        let url = MediaUrl::new(format!("{URL_PREFIX}/{key}.bin"))
            .map_err(|err| MediaStoreError::rejected(err.to_string()))?;
        self.lock()?.insert(key, bytes);
        Ok(url)
    }

    async fn delete(&self, url: &MediaUrl) -> Result<(), MediaStoreError> {
        let key = url
            .object_key()
            .ok_or_else(|| MediaStoreError::rejected(format!("{url} does not name an object")))?;
        match self.lock()?.remove(&key) {
            Some(_) => Ok(()),
            None => Err(MediaStoreError::not_found(url.to_string())),
        }
    }
}
