//! Object storage primitives consumed by the layer's callers: store bytes at
//! a path, resolve a public URL for a stored object. Everything else about
//! blob handling lives outside this crate.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use url::Url;

use crate::error::{invalid_argument, not_found, DocSqlResult};
use crate::util::TtlCache;

/// Pointer to a stored object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageRef {
    path: String,
}

impl StorageRef {
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// The two primitives the compatibility layer needs from an object store.
#[async_trait]
pub trait ObjectStorage: Send + Sync + 'static {
    /// Stores `bytes` at `path`. Failures propagate as errors.
    async fn put_bytes(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> DocSqlResult<StorageRef>;

    /// Resolves the public URL for a previously stored object.
    async fn get_public_url(&self, reference: &StorageRef) -> DocSqlResult<Url>;
}

const URL_CACHE_TTL: Duration = Duration::from_secs(300);

/// In-memory [`ObjectStorage`] used in tests and local development. Public
/// URLs are joined onto a base URL and cached with a bounded lifetime.
pub struct MemoryObjectStorage {
    base_url: Url,
    objects: Mutex<HashMap<String, (Bytes, String)>>,
    url_cache: TtlCache<String, Url>,
}

impl MemoryObjectStorage {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            objects: Mutex::new(HashMap::new()),
            url_cache: TtlCache::new(URL_CACHE_TTL),
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn put_bytes(
        &self,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> DocSqlResult<StorageRef> {
        if path.is_empty() {
            return Err(invalid_argument("Storage path must be non-empty"));
        }
        debug!("storing {} bytes at {path}", bytes.len());
        let mut objects = self.objects.lock().unwrap_or_else(PoisonError::into_inner);
        objects.insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(StorageRef {
            path: path.to_string(),
        })
    }

    async fn get_public_url(&self, reference: &StorageRef) -> DocSqlResult<Url> {
        if let Some(url) = self.url_cache.get(&reference.path) {
            return Ok(url);
        }
        {
            let objects = self.objects.lock().unwrap_or_else(PoisonError::into_inner);
            if !objects.contains_key(&reference.path) {
                return Err(not_found(format!(
                    "No stored object at {}",
                    reference.path
                )));
            }
        }
        let url = self
            .base_url
            .join(&reference.path)
            .map_err(|err| invalid_argument(err.to_string()))?;
        self.url_cache.insert(reference.path.clone(), url.clone());
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> MemoryObjectStorage {
        MemoryObjectStorage::new(Url::parse("https://cdn.example.com/").unwrap())
    }

    #[tokio::test]
    async fn stores_and_resolves_public_url() {
        let storage = storage();
        let reference = storage
            .put_bytes("exports/report.pdf", Bytes::from_static(b"%PDF"), "application/pdf")
            .await
            .unwrap();
        let url = storage.get_public_url(&reference).await.unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/exports/report.pdf");
        // Second resolution is served from the TTL cache.
        let cached = storage.get_public_url(&reference).await.unwrap();
        assert_eq!(cached, url);
    }

    #[tokio::test]
    async fn rejects_empty_path() {
        let storage = storage();
        let err = storage
            .put_bytes("", Bytes::new(), "text/plain")
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "docsql/invalid-argument");
    }

    #[tokio::test]
    async fn missing_object_yields_not_found() {
        let storage = storage();
        let reference = StorageRef {
            path: "nope.txt".to_string(),
        };
        let err = storage.get_public_url(&reference).await.unwrap_err();
        assert_eq!(err.code_str(), "docsql/not-found");
    }
}
