//! Remote object storage for published images.
//!
//! Publishing only ever needs one operation, `put`, so that is the whole
//! [`ObjectStore`] surface. The bucket is bound when the store is built.
//!
//! [`S3Store`] talks to AWS S3 or any S3-compatible service through the
//! blocking `rust-s3` client. Credentials come from the usual AWS sources
//! (`AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`, profile, instance metadata).
//! A custom endpoint switches to path-style addressing, which MinIO and R2
//! expect.

use crate::config::RemoteConfig;
use s3::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("S3 credentials: {0}")]
    Credentials(#[from] s3::creds::error::CredentialsError),
    #[error("S3 error: {0}")]
    S3(#[from] s3::error::S3Error),
    #[error("Upload of {key} rejected with HTTP {status}")]
    Rejected { key: String, status: u16 },
    #[error("{0}")]
    Other(String),
}

/// Write-only view of a remote bucket.
pub trait ObjectStore {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError>;
}

impl<S: ObjectStore + ?Sized> ObjectStore for &S {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError> {
        (**self).put(key, bytes, content_type)
    }
}

impl<S: ObjectStore + ?Sized> ObjectStore for Box<S> {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError> {
        (**self).put(key, bytes, content_type)
    }
}

/// MIME type for an image file, by extension.
pub fn content_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string()
}

/// S3 bucket client.
pub struct S3Store {
    bucket: Box<Bucket>,
}

impl S3Store {
    pub fn new(remote: &RemoteConfig) -> Result<Self, StoreError> {
        let credentials = Credentials::default()?;

        let region = match &remote.endpoint {
            Some(endpoint) => Region::Custom {
                region: remote.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => remote
                .region
                .parse()
                .map_err(|e| StoreError::Other(format!("invalid region {}: {e}", remote.region)))?,
        };

        let bucket = Bucket::new(&remote.bucket, region, credentials)?;
        let bucket = if remote.endpoint.is_some() {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(Self { bucket })
    }
}

impl ObjectStore for S3Store {
    fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError> {
        debug!(key = %key, content_type = %content_type, size = bytes.len(), "Uploading object");
        let response = self
            .bucket
            .put_object_with_content_type(key, bytes, content_type)?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StoreError::Rejected {
                key: key.to_string(),
                status,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("bucket", &self.bucket.name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// One recorded `put`.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StoredObject {
        pub key: String,
        pub bytes: Vec<u8>,
        pub content_type: String,
    }

    /// In-memory store recording every successful `put`.
    #[derive(Default)]
    pub struct MemoryStore {
        pub objects: Mutex<Vec<StoredObject>>,
        pub fail_on: Option<String>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Reject any key ending with `suffix`.
        pub fn failing_on(suffix: &str) -> Self {
            Self {
                fail_on: Some(suffix.to_string()),
                ..Self::default()
            }
        }

        pub fn keys(&self) -> Vec<String> {
            self.objects
                .lock()
                .unwrap()
                .iter()
                .map(|o| o.key.clone())
                .collect()
        }

        pub fn get(&self, key: &str) -> Option<StoredObject> {
            self.objects
                .lock()
                .unwrap()
                .iter()
                .find(|o| o.key == key)
                .cloned()
        }
    }

    impl ObjectStore for MemoryStore {
        fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), StoreError> {
            if self.fail_on.as_deref().is_some_and(|s| key.ends_with(s)) {
                return Err(StoreError::Rejected {
                    key: key.to_string(),
                    status: 503,
                });
            }
            self.objects.lock().unwrap().push(StoredObject {
                key: key.to_string(),
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            });
            Ok(())
        }
    }

    #[test]
    fn content_type_by_extension() {
        assert_eq!(content_type_for(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("cover.png")), "image/png");
        assert_eq!(
            content_type_for(Path::new("notes")),
            "application/octet-stream"
        );
    }

    #[test]
    fn memory_store_records_puts() {
        let store = MemoryStore::new();
        store.put("p/a.jpg", b"abc", "image/jpeg").unwrap();
        assert_eq!(store.keys(), vec!["p/a.jpg"]);
        assert_eq!(store.get("p/a.jpg").unwrap().bytes, b"abc");
    }

    #[test]
    fn memory_store_failure_records_nothing() {
        let store = MemoryStore::failing_on("b.jpg");
        assert!(store.put("p/b.jpg", b"x", "image/jpeg").is_err());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn store_usable_through_reference() {
        fn upload(store: impl ObjectStore) {
            store.put("k", b"v", "text/plain").unwrap();
        }
        let store = MemoryStore::new();
        upload(&store);
        assert_eq!(store.keys(), vec!["k"]);
    }
}
