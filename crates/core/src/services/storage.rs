//! Image storage service.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use verdant_common::{AppResult, StorageBackend, StoredObject, generate_storage_key};

/// Uploads images and turns stored keys into signed URLs.
#[derive(Clone)]
pub struct StorageService {
    backend: Arc<dyn StorageBackend>,
    url_expiry: Duration,
}

impl StorageService {
    /// Create a storage service over `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, url_expiry: Duration) -> Self {
        Self {
            backend,
            url_expiry,
        }
    }

    /// Upload data under a fresh key below `prefix`.
    pub async fn upload(
        &self,
        prefix: &str,
        data: Bytes,
        content_type: &str,
    ) -> AppResult<StoredObject> {
        let key = generate_storage_key(prefix);
        self.backend.upload(&key, data, content_type).await
    }

    /// Signed URL for a stored key, or `None` if it cannot be signed.
    pub async fn signed_url(&self, key: &str) -> Option<String> {
        match self.backend.signed_url(key, self.url_expiry).await {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to sign image URL");
                None
            }
        }
    }

    /// Like [`Self::signed_url`], passing `None` through.
    pub async fn signed_url_opt(&self, key: Option<&str>) -> Option<String> {
        match key {
            Some(key) => self.signed_url(key).await,
            None => None,
        }
    }
}
