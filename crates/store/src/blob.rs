//! Blob storage keyed by slash-separated paths.
//!
//! Paths are namespaced per account and purpose (see
//! [`kana_core::account`]). Each stored blob is reachable at
//! `{url_prefix}/{path}`, which the API serves back from the same store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;

/// URL prefix under which the API serves blobs.
pub const DEFAULT_URL_PREFIX: &str = "/api/v1/blobs";

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path`, replacing any previous blob, and return its
    /// public URL.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError>;

    /// Read a blob with its content type.
    async fn download(&self, path: &str) -> Result<(Vec<u8>, String), StoreError>;

    /// Delete a blob. Deleting a missing blob is `NotFound`.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Public URL of `path`, whether or not it exists.
    fn url_for(&self, path: &str) -> String;
}

/// Reject empty, absolute, or traversing paths.
pub fn validate_path(path: &str) -> Result<(), StoreError> {
    let ok = !path.is_empty()
        && !path.starts_with('/')
        && !path.contains('\\')
        && path
            .split('/')
            .all(|seg| !seg.is_empty() && seg != "." && seg != "..");
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidPath(path.to_string()))
    }
}

fn join_url(prefix: &str, path: &str) -> String {
    format!("{}/{path}", prefix.trim_end_matches('/'))
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct StoredBlob {
    bytes: Vec<u8>,
    content_type: String,
}

/// Process-local blob store; contents are lost on restart.
pub struct MemoryBlobStore {
    url_prefix: String,
    blobs: RwLock<HashMap<String, StoredBlob>>,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new(DEFAULT_URL_PREFIX)
    }
}

impl MemoryBlobStore {
    pub fn new(url_prefix: impl Into<String>) -> Self {
        Self {
            url_prefix: url_prefix.into(),
            blobs: RwLock::new(HashMap::new()),
        }
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.blobs.read().await.contains_key(path)
    }

    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String, StoreError> {
        validate_path(path)?;
        self.blobs.write().await.insert(
            path.to_string(),
            StoredBlob {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(self.url_for(path))
    }

    async fn download(&self, path: &str) -> Result<(Vec<u8>, String), StoreError> {
        validate_path(path)?;
        self.blobs
            .read()
            .await
            .get(path)
            .map(|b| (b.bytes.clone(), b.content_type.clone()))
            .ok_or_else(|| StoreError::not_found("Blob", path))
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        validate_path(path)?;
        self.blobs
            .write()
            .await
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Blob", path))
    }

    fn url_for(&self, path: &str) -> String {
        join_url(&self.url_prefix, path)
    }
}

// ---------------------------------------------------------------------------
// Local filesystem
// ---------------------------------------------------------------------------

/// Blob store rooted at a local directory.
///
/// Content types are not persisted; they are inferred from the extension
/// on download.
pub struct LocalBlobStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }
}

/// Content type for a stored path, from its extension.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = path
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => kana_core::types::DEFAULT_MIME_TYPE,
    }
}

fn map_not_found(err: std::io::Error, path: &str) -> StoreError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StoreError::not_found("Blob", path)
    } else {
        StoreError::Io(err)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String, StoreError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, bytes).await?;
        tracing::debug!(path, "Blob written");
        Ok(self.url_for(path))
    }

    async fn download(&self, path: &str) -> Result<(Vec<u8>, String), StoreError> {
        let target = self.resolve(path)?;
        let bytes = tokio::fs::read(&target)
            .await
            .map_err(|e| map_not_found(e, path))?;
        Ok((bytes, content_type_for(path).to_string()))
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let target = self.resolve(path)?;
        tokio::fs::remove_file(&target)
            .await
            .map_err(|e| map_not_found(e, path))
    }

    fn url_for(&self, path: &str) -> String {
        join_url(&self.url_prefix, path)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
