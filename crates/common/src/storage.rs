//! Object storage abstraction for image uploads.
//!
//! Objects are addressed by key. Keys are what the database stores; readable
//! URLs are produced on demand as time-limited signed links.

use std::time::Duration;

use aws_sdk_s3::{presigning::PresigningConfig, primitives::ByteStream};
use bytes::Bytes;

use crate::{AppError, AppResult, config::StorageConfig};

/// Metadata of an object written to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object key within the bucket.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME content type recorded with the object.
    pub content_type: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload an object under `key`.
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<StoredObject>;

    /// Produce a signed GET URL for `key`, valid for `expires_in`.
    async fn signed_url(&self, key: &str, expires_in: Duration) -> AppResult<String>;
}

/// S3-compatible object storage backend.
pub struct S3Storage {
    client: aws_sdk_s3::Client,
    bucket: Option<String>,
}

impl S3Storage {
    /// Create a new S3 storage backend.
    ///
    /// Region and credentials from `config` take precedence over the AWS
    /// default provider chain.
    pub async fn new(config: &StorageConfig) -> Self {
        use aws_config::{BehaviorVersion, Region};
        use aws_sdk_s3::config::Credentials;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            let credentials =
                Credentials::new(access_key_id, secret_access_key, None, None, "verdant");
            loader = loader.credentials_provider(credentials);
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        if config.bucket.is_none() {
            tracing::warn!("No storage bucket configured; image uploads will fail");
        }

        Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        }
    }

    fn bucket(&self) -> AppResult<&str> {
        self.bucket
            .as_deref()
            .ok_or_else(|| AppError::Storage("S3 bucket is not configured".to_string()))
    }
}

#[async_trait::async_trait]
impl StorageBackend for S3Storage {
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> AppResult<StoredObject> {
        let bucket = self.bucket()?;
        let size = data.len() as u64;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        Ok(StoredObject {
            key: key.to_string(),
            size,
            content_type: content_type.to_string(),
        })
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> AppResult<String> {
        let bucket = self.bucket()?;
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| AppError::Storage(format!("Invalid presigning config: {e}")))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| AppError::Storage(format!("S3 presign failed: {e}")))?;

        Ok(request.uri().to_string())
    }
}

/// Generate a unique storage key under `prefix` (e.g. `comments/3f2a...`).
#[must_use]
pub fn generate_storage_key(prefix: &str) -> String {
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        uuid::Uuid::new_v4().simple()
    )
}

#[cfg(feature = "test-utils")]
pub use memory::MemoryStorage;

#[cfg(feature = "test-utils")]
mod memory {
    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use bytes::Bytes;

    use super::{StorageBackend, StoredObject};
    use crate::{AppError, AppResult};

    /// In-memory storage backend for tests.
    #[derive(Default)]
    pub struct MemoryStorage {
        objects: Mutex<HashMap<String, (StoredObject, Bytes)>>,
        fail_uploads: bool,
    }

    impl MemoryStorage {
        /// Create an empty in-memory store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a store whose uploads always fail.
        #[must_use]
        pub fn failing() -> Self {
            Self {
                fail_uploads: true,
                ..Self::default()
            }
        }

        /// Number of stored objects.
        #[must_use]
        pub fn len(&self) -> usize {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }

        /// Whether nothing has been stored.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        /// Metadata of a stored object.
        #[must_use]
        pub fn get(&self, key: &str) -> Option<StoredObject> {
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .map(|(meta, _)| meta.clone())
        }
    }

    #[async_trait::async_trait]
    impl StorageBackend for MemoryStorage {
        async fn upload(
            &self,
            key: &str,
            data: Bytes,
            content_type: &str,
        ) -> AppResult<StoredObject> {
            if self.fail_uploads {
                return Err(AppError::Storage("memory storage rejected upload".to_string()));
            }

            let meta = StoredObject {
                key: key.to_string(),
                size: data.len() as u64,
                content_type: content_type.to_string(),
            };
            self.objects
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key.to_string(), (meta.clone(), data));
            Ok(meta)
        }

        async fn signed_url(&self, key: &str, expires_in: Duration) -> AppResult<String> {
            Ok(format!(
                "memory://{key}?expires_in={}",
                expires_in.as_secs()
            ))
        }
    }
}
