//! Driven port for the external object store holding thumbnails and videos.

use async_trait::async_trait;

use crate::domain::MediaUrl;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by media store adapters.
    pub enum MediaStoreError {
        /// The referenced object does not exist.
        NotFound { url: String } =>
            "media object not found: {url}",
        /// Network transport failed before the store answered.
        Transport { message: String } =>
            "media store transport failed: {message}",
        /// The store refused the request.
        Rejected { message: String } =>
            "media store rejected request: {message}",
    }
}

impl MediaStoreError {
    /// Whether the error means the object is already gone.
    ///
    /// Deletes treat this as success so retried cascades converge.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Port for uploading and deleting media objects.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `bytes` under `folder` and return the public URL.
    async fn upload(&self, bytes: Vec<u8>, folder: &str) -> Result<MediaUrl, MediaStoreError>;

    /// Delete the object behind `url`.
    async fn delete(&self, url: &MediaUrl) -> Result<(), MediaStoreError>;
}

/// Fixture implementation for tests that do not exercise media storage.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureMediaStore;

#[async_trait]
impl MediaStore for FixtureMediaStore {
    async fn upload(&self, _bytes: Vec<u8>, folder: &str) -> Result<MediaUrl, MediaStoreError> {
        MediaUrl::new(format!("memory://fixture/{folder}/object"))
            .map_err(|err| MediaStoreError::rejected(err.to_string()))
    }

    async fn delete(&self, _url: &MediaUrl) -> Result<(), MediaStoreError> {
        Ok(())
    }
}
