//! Account profile documents and the service that keeps them in sync with
//! profile photo blobs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use kana_core::account::{profile_photo_path, AccountIdentity, ProfileDocument, ProfileUpdate};
use kana_core::types::SourceFile;
use tokio::sync::RwLock;

use crate::blob::BlobStore;
use crate::error::StoreError;

const PROFILE: &str = "Profile";

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Document store of `users/{id}` profile documents.
#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn find(&self, id: &str) -> Result<Option<ProfileDocument>, StoreError>;

    /// Insert `doc` unless a document with its id exists. Returns whether
    /// it was inserted.
    async fn insert_if_absent(&self, doc: ProfileDocument) -> Result<bool, StoreError>;

    /// Overwrite an existing document.
    async fn update(&self, doc: ProfileDocument) -> Result<(), StoreError>;

    /// Returns whether a document was deleted.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

#[derive(Default)]
pub struct MemoryAccountRepo {
    docs: RwLock<HashMap<String, ProfileDocument>>,
}

impl MemoryAccountRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepo for MemoryAccountRepo {
    async fn find(&self, id: &str) -> Result<Option<ProfileDocument>, StoreError> {
        Ok(self.docs.read().await.get(id).cloned())
    }

    async fn insert_if_absent(&self, doc: ProfileDocument) -> Result<bool, StoreError> {
        let mut docs = self.docs.write().await;
        if docs.contains_key(&doc.id) {
            return Ok(false);
        }
        docs.insert(doc.id.clone(), doc);
        Ok(true)
    }

    async fn update(&self, doc: ProfileDocument) -> Result<(), StoreError> {
        let mut docs = self.docs.write().await;
        match docs.get_mut(&doc.id) {
            Some(existing) => {
                *existing = doc;
                Ok(())
            }
            None => Err(StoreError::not_found(PROFILE, doc.id)),
        }
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.docs.write().await.remove(id).is_some())
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AccountService {
    accounts: Arc<dyn AccountRepo>,
    blobs: Arc<dyn BlobStore>,
}

impl AccountService {
    pub fn new(accounts: Arc<dyn AccountRepo>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { accounts, blobs }
    }

    /// Create the profile document on first sign-in.
    ///
    /// `overrides` take precedence over the identity's own display name.
    /// An existing document is returned untouched. The boolean reports
    /// whether a document was created.
    pub async fn create_or_sync(
        &self,
        identity: AccountIdentity,
        overrides: ProfileUpdate,
    ) -> Result<(ProfileDocument, bool), StoreError> {
        if let Some(existing) = self.accounts.find(&identity.id).await? {
            return Ok((existing, false));
        }

        let doc = ProfileDocument {
            id: identity.id,
            email: identity.email,
            display_name: overrides.display_name.or(identity.display_name),
            photo_url: identity.photo_url,
            storage_path: None,
            created_at: Utc::now(),
        };

        let created = self.accounts.insert_if_absent(doc.clone()).await?;
        if !created {
            // Lost a race with a concurrent sign-in; the stored one wins.
            let stored = self
                .accounts
                .find(&doc.id)
                .await?
                .ok_or_else(|| StoreError::not_found(PROFILE, doc.id.clone()))?;
            return Ok((stored, false));
        }

        tracing::info!(account_id = %doc.id, "Profile document created");
        Ok((doc, true))
    }

    pub async fn get(&self, id: &str) -> Result<ProfileDocument, StoreError> {
        self.accounts
            .find(id)
            .await?
            .ok_or_else(|| StoreError::not_found(PROFILE, id))
    }

    /// Apply profile edits, uploading a new photo first when given.
    pub async fn update_profile(
        &self,
        id: &str,
        update: ProfileUpdate,
        photo: Option<&SourceFile>,
    ) -> Result<ProfileDocument, StoreError> {
        let mut doc = self.get(id).await?;

        if let Some(photo) = photo {
            let path = profile_photo_path(id);
            let url = self
                .blobs
                .upload(&path, photo.bytes.clone(), &photo.mime_type)
                .await?;
            doc.photo_url = Some(url);
            doc.storage_path = Some(path);
        }
        if let Some(name) = update.display_name {
            doc.display_name = Some(name);
        }

        self.accounts.update(doc.clone()).await?;
        tracing::info!(account_id = %id, photo = photo.is_some(), "Profile updated");
        Ok(doc)
    }

    /// Delete the profile document, then the profile photo if present.
    pub async fn delete_account(&self, id: &str) -> Result<(), StoreError> {
        if !self.accounts.delete(id).await? {
            return Err(StoreError::not_found(PROFILE, id));
        }

        let path = profile_photo_path(id);
        match self.blobs.delete(&path).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => tracing::warn!(account_id = %id, error = %e, "Failed to delete profile photo"),
        }

        tracing::info!(account_id = %id, "Account deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
