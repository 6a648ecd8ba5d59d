//! Persisted planner grid: one document per occupied slot under
//! `users/{account}/planner/{index}`, plus the uploaded slot images.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use kana_core::account::planner_upload_path;
use kana_core::planner::{default_slot_id, GridSlot, SLOT_COUNT};
use kana_core::types::{SourceFile, Timestamp};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::blob::BlobStore;
use crate::error::StoreError;

/// Length of the random suffix on uploaded planner image names.
const UPLOAD_SUFFIX_LEN: usize = 9;

/// Extension used when an upload's file name carries none.
const FALLBACK_EXTENSION: &str = "bin";

/// Stored form of one grid slot. The local file is never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDocument {
    pub id: String,
    pub url: Option<String>,
    pub caption: String,
    pub storage_path: Option<String>,
    pub updated_at: Timestamp,
}

impl SlotDocument {
    pub fn from_slot(slot: &GridSlot) -> Self {
        Self {
            id: slot.id.clone(),
            url: slot.url.clone(),
            caption: slot.caption.clone(),
            storage_path: slot.storage_path.clone(),
            updated_at: Utc::now(),
        }
    }

    fn into_slot(self, index: usize) -> GridSlot {
        GridSlot {
            id: if self.id.is_empty() {
                default_slot_id(index)
            } else {
                self.id
            },
            url: self.url,
            file: None,
            caption: self.caption,
            storage_path: self.storage_path,
        }
    }
}

/// Document path of a slot, for logs.
pub fn slot_document_path(account: &str, index: usize) -> String {
    format!("users/{account}/planner/{index}")
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PlannerRepo: Send + Sync {
    /// All slot documents of an account keyed by slot index.
    async fn list(&self, account: &str) -> Result<BTreeMap<usize, SlotDocument>, StoreError>;

    /// Create or replace the document at `index`.
    async fn put(&self, account: &str, index: usize, doc: SlotDocument) -> Result<(), StoreError>;

    /// Returns whether a document was removed.
    async fn remove(&self, account: &str, index: usize) -> Result<bool, StoreError>;
}

#[derive(Default)]
pub struct MemoryPlannerRepo {
    docs: RwLock<HashMap<String, BTreeMap<usize, SlotDocument>>>,
}

impl MemoryPlannerRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PlannerRepo for MemoryPlannerRepo {
    async fn list(&self, account: &str) -> Result<BTreeMap<usize, SlotDocument>, StoreError> {
        Ok(self
            .docs
            .read()
            .await
            .get(account)
            .cloned()
            .unwrap_or_default())
    }

    async fn put(&self, account: &str, index: usize, doc: SlotDocument) -> Result<(), StoreError> {
        self.docs
            .write()
            .await
            .entry(account.to_string())
            .or_default()
            .insert(index, doc);
        Ok(())
    }

    async fn remove(&self, account: &str, index: usize) -> Result<bool, StoreError> {
        Ok(self
            .docs
            .write()
            .await
            .get_mut(account)
            .and_then(|slots| slots.remove(&index))
            .is_some())
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Durable planner operations over a [`PlannerRepo`] and a [`BlobStore`].
#[derive(Clone)]
pub struct PlannerStore {
    repo: Arc<dyn PlannerRepo>,
    blobs: Arc<dyn BlobStore>,
}

impl PlannerStore {
    pub fn new(repo: Arc<dyn PlannerRepo>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { repo, blobs }
    }

    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Upload a slot image; returns `(url, storage_path)`.
    pub async fn upload_planner_image(
        &self,
        account: &str,
        file: &SourceFile,
    ) -> Result<(String, String), StoreError> {
        let suffix: String = rand::rng()
            .sample_iter(Alphanumeric)
            .take(UPLOAD_SUFFIX_LEN)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        let extension = file
            .extension()
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
        let path = planner_upload_path(account, Utc::now().timestamp_millis(), &suffix, &extension);

        let url = self
            .blobs
            .upload(&path, file.bytes.clone(), &file.mime_type)
            .await?;
        tracing::debug!(account_id = %account, path = %path, "Planner image uploaded");
        Ok((url, path))
    }

    /// Delete an uploaded slot image. Failures are logged and ignored.
    pub async fn delete_planner_image(&self, storage_path: &str) {
        if storage_path.is_empty() {
            return;
        }
        if let Err(e) = self.blobs.delete(storage_path).await {
            tracing::warn!(path = %storage_path, error = %e, "Failed to delete planner image");
        }
    }

    pub async fn save_slot(&self, account: &str, index: usize, slot: &GridSlot) -> Result<(), StoreError> {
        check_index(index)?;
        self.repo
            .put(account, index, SlotDocument::from_slot(slot))
            .await?;
        tracing::debug!(doc = %slot_document_path(account, index), "Planner slot saved");
        Ok(())
    }

    pub async fn delete_slot(&self, account: &str, index: usize) -> Result<(), StoreError> {
        check_index(index)?;
        self.repo.remove(account, index).await?;
        Ok(())
    }

    /// Fetch the full grid. Always returns [`SLOT_COUNT`] slots; positions
    /// without a document are empty.
    pub async fn fetch_grid(&self, account: &str) -> Result<Vec<GridSlot>, StoreError> {
        let mut docs = self.repo.list(account).await?;
        Ok((0..SLOT_COUNT)
            .map(|i| match docs.remove(&i) {
                Some(doc) => doc.into_slot(i),
                None => GridSlot::empty(i),
            })
            .collect())
    }

    /// Delete the image and document of every occupied slot in `slots`.
    pub async fn reset_grid(&self, account: &str, slots: &[GridSlot]) -> Result<(), StoreError> {
        let tasks = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| !slot.is_empty())
            .map(|(index, slot)| async move {
                if let Some(path) = &slot.storage_path {
                    self.delete_planner_image(path).await;
                }
                self.delete_slot(account, index).await
            });

        for result in join_all(tasks).await {
            result?;
        }
        tracing::info!(account_id = %account, "Planner grid reset");
        Ok(())
    }
}

fn check_index(index: usize) -> Result<(), StoreError> {
    if index >= SLOT_COUNT {
        return Err(StoreError::not_found("Planner slot", index.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
