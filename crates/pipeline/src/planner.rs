//! Planner session: the live [`GridPlanner`] plus everything that needs a
//! collaborator (caption generation, persistence, rasterization).
//!
//! The planner lock is never held across a remote call. Caption generation
//! reads its inputs, releases the lock, calls out, and re-checks that the
//! editor is still open on the same slot before writing the draft.

use std::sync::Arc;

use kana_core::error::CoreError;
use kana_core::generation::{ContentGenerator, GeneratedContent, ImageFetcher, Language, Platform};
use kana_core::grid_render::{rasterize_grid, GridRenderOptions};
use kana_core::planner::{CaptionEditor, DropSource, GridPlanner, GridSlot};
use kana_core::types::SourceFile;
use kana_store::PlannerStore;
use serde::Serialize;
use tokio::sync::RwLock;

/// Serializable view of the planner.
#[derive(Debug, Clone, Serialize)]
pub struct PlannerView {
    pub slots: Vec<GridSlot>,
    pub dragged_index: Option<usize>,
    pub dragging_external_file: bool,
    pub hovered_url: Option<String>,
    pub hover_caption: String,
    pub caption_editor: Option<CaptionEditor>,
}

impl From<&GridPlanner> for PlannerView {
    fn from(planner: &GridPlanner) -> Self {
        Self {
            slots: planner.slots().to_vec(),
            dragged_index: planner.dragged_index(),
            dragging_external_file: planner.is_dragging_external_file(),
            hovered_url: planner.hovered_url().map(str::to_string),
            hover_caption: planner.hover_caption().to_string(),
            caption_editor: planner.caption_editor().cloned(),
        }
    }
}

/// Result of a caption generation request.
#[derive(Debug, Clone, Serialize)]
pub struct CaptionSuggestion {
    pub content: GeneratedContent,
    /// Whether the draft was overwritten; `false` when the editor was closed
    /// or moved while the call was in flight.
    pub applied: bool,
}

pub struct PlannerSession {
    planner: RwLock<GridPlanner>,
    generator: Arc<dyn ContentGenerator>,
    fetcher: Arc<dyn ImageFetcher>,
    store: PlannerStore,
    render_options: GridRenderOptions,
}

impl PlannerSession {
    pub fn new(
        generator: Arc<dyn ContentGenerator>,
        fetcher: Arc<dyn ImageFetcher>,
        store: PlannerStore,
    ) -> Self {
        Self {
            planner: RwLock::new(GridPlanner::new()),
            generator,
            fetcher,
            store,
            render_options: GridRenderOptions::default(),
        }
    }

    pub fn with_render_options(mut self, options: GridRenderOptions) -> Self {
        self.render_options = options;
        self
    }

    pub async fn view(&self) -> PlannerView {
        PlannerView::from(&*self.planner.read().await)
    }

    /// Apply a synchronous edit and return the resulting view.
    async fn edit<F>(&self, op: F) -> Result<PlannerView, CoreError>
    where
        F: FnOnce(&mut GridPlanner) -> Result<(), CoreError>,
    {
        let mut planner = self.planner.write().await;
        op(&mut planner)?;
        Ok(PlannerView::from(&*planner))
    }

    // -- slot content ---------------------------------------------------------

    pub async fn assign_file(&self, index: usize, file: Arc<SourceFile>) -> Result<PlannerView, CoreError> {
        self.edit(|p| p.assign_file(index, file).map(|_| ())).await
    }

    /// Empty one slot. With an account, its persisted image and document
    /// are deleted too.
    pub async fn remove_slot(&self, index: usize, account: Option<&str>) -> Result<PlannerView, CoreError> {
        let (removed, view) = {
            let mut planner = self.planner.write().await;
            let removed = planner.remove_slot(index)?;
            (removed, PlannerView::from(&*planner))
        };

        if let Some(account) = account {
            if let Some(path) = &removed.storage_path {
                self.store.delete_planner_image(path).await;
            }
            self.store.delete_slot(account, index).await?;
        }
        Ok(view)
    }

    pub async fn reorder(&self, source: usize, target: usize) -> Result<PlannerView, CoreError> {
        self.edit(|p| p.reorder(source, target)).await
    }

    // -- drag and drop --------------------------------------------------------

    pub async fn start_slot_drag(&self, index: usize) -> Result<PlannerView, CoreError> {
        self.edit(|p| p.start_slot_drag(index)).await
    }

    pub async fn start_external_file_drag(&self) -> PlannerView {
        let mut planner = self.planner.write().await;
        planner.start_external_file_drag();
        PlannerView::from(&*planner)
    }

    pub async fn end_external_file_drag(&self) -> PlannerView {
        let mut planner = self.planner.write().await;
        planner.end_external_file_drag();
        PlannerView::from(&*planner)
    }

    pub async fn drop_on(&self, target: usize, source: DropSource) -> Result<PlannerView, CoreError> {
        self.edit(|p| p.drop_on(target, source)).await
    }

    pub async fn hover(&self, index: Option<usize>) -> Result<PlannerView, CoreError> {
        self.edit(|p| p.hover(index)).await
    }

    // -- captions -------------------------------------------------------------

    pub async fn edit_caption(&self, index: usize) -> Result<PlannerView, CoreError> {
        self.edit(|p| p.edit_caption(index).map(|_| ())).await
    }

    pub async fn set_draft(&self, text: String) -> Result<PlannerView, CoreError> {
        self.edit(|p| p.set_draft(text)).await
    }

    pub async fn close_caption_editor(&self) -> PlannerView {
        let mut planner = self.planner.write().await;
        planner.close_caption_editor();
        PlannerView::from(&*planner)
    }

    /// Commit a caption: the given text for `index`, or the open draft.
    pub async fn save_caption(&self, target: Option<(usize, String)>) -> Result<PlannerView, CoreError> {
        self.edit(|p| match target {
            Some((index, text)) => p.save_caption(index, text),
            None => p.save_draft().map(|_| ()),
        })
        .await
    }

    /// Generate a caption for the slot whose editor is open and write it
    /// into the draft. The saved caption is left alone.
    pub async fn generate_caption(
        &self,
        index: usize,
        platform: Platform,
        language: Language,
    ) -> Result<CaptionSuggestion, CoreError> {
        let (slot, context) = self.planner.read().await.caption_request(index)?;
        let file = self.resolve_file(&slot).await?;

        let content = self
            .generator
            .generate_caption(&file, &context, platform, language)
            .await
            .inspect_err(|e| tracing::warn!(slot = index, error = %e, "Caption generation failed"))?;

        let applied = self
            .planner
            .write()
            .await
            .apply_generated_caption(index, content.caption.clone());
        if !applied {
            tracing::debug!(slot = index, "Caption editor closed before generation finished");
        }
        Ok(CaptionSuggestion { content, applied })
    }

    // -- export ---------------------------------------------------------------

    /// Render the grid to JPEG. Failure leaves the planner untouched.
    pub async fn rasterize(&self) -> Result<Vec<u8>, CoreError> {
        let slots = self.planner.read().await.slots().to_vec();

        let mut cells = Vec::with_capacity(slots.len());
        for slot in &slots {
            let cell = if slot.is_empty() {
                None
            } else {
                Some(self.resolve_file(slot).await?.bytes.clone())
            };
            cells.push(cell);
        }

        let options = self.render_options;
        let bytes = tokio::task::spawn_blocking(move || rasterize_grid(&cells, &options))
            .await
            .map_err(|e| CoreError::Internal(format!("grid render task failed: {e}")))??;
        tracing::info!(bytes = bytes.len(), "Planner grid rasterized");
        Ok(bytes)
    }

    /// Image bytes behind a slot: the local file, the stored blob, or a
    /// fetch of its URL.
    async fn resolve_file(&self, slot: &GridSlot) -> Result<Arc<SourceFile>, CoreError> {
        if let Some(file) = &slot.file {
            return Ok(Arc::clone(file));
        }
        if let Some(path) = &slot.storage_path {
            let (bytes, content_type) = self.store.blobs().download(path).await?;
            return Ok(SourceFile::new(path.as_str(), content_type, bytes).shared());
        }
        let url = slot
            .url
            .as_deref()
            .ok_or_else(|| CoreError::Validation(format!("Slot '{}' is empty", slot.id)))?;
        let bytes = self.fetcher.fetch(url).await?;
        let mime_type = kana_core::data_url::decode(url)
            .map(|d| d.mime_type)
            .unwrap_or_default();
        Ok(SourceFile::new(slot.id.as_str(), mime_type, bytes).shared())
    }

    // -- persistence ----------------------------------------------------------

    /// Empty the grid. With an account, persisted images and documents of
    /// occupied slots are deleted too.
    pub async fn reset(&self, account: Option<&str>) -> Result<PlannerView, CoreError> {
        let slots = self.planner.read().await.slots().to_vec();
        if let Some(account) = account {
            self.store.reset_grid(account, &slots).await?;
        }
        let mut planner = self.planner.write().await;
        planner.reset();
        Ok(PlannerView::from(&*planner))
    }

    /// Replace the grid with the account's persisted grid.
    pub async fn load(&self, account: &str) -> Result<PlannerView, CoreError> {
        let slots = self.store.fetch_grid(account).await?;
        let mut planner = self.planner.write().await;
        planner.restore(slots)?;
        tracing::info!(account_id = %account, "Planner grid loaded");
        Ok(PlannerView::from(&*planner))
    }

    /// Persist every slot for `account`, uploading local images first.
    /// Empty slots have their documents deleted.
    pub async fn save(&self, account: &str) -> Result<PlannerView, CoreError> {
        let slots = self.planner.read().await.slots().to_vec();

        for (index, slot) in slots.iter().enumerate() {
            if slot.is_empty() {
                self.store.delete_slot(account, index).await?;
                continue;
            }

            let mut persisted = slot.clone();
            if let (Some(file), None) = (&slot.file, &slot.storage_path) {
                let (url, path) = self.store.upload_planner_image(account, file).await?;
                self.record_upload(slot, index, &url, &path).await;
                persisted.url = Some(url);
                persisted.storage_path = Some(path);
            }
            self.store.save_slot(account, index, &persisted).await?;
        }

        tracing::info!(account_id = %account, "Planner grid saved");
        Ok(self.view().await)
    }

    /// Point the live slot at its upload, unless the slot has changed since
    /// the save began.
    async fn record_upload(&self, uploaded: &GridSlot, index: usize, url: &str, path: &str) {
        let mut planner = self.planner.write().await;
        let unchanged = planner
            .slot(index)
            .is_ok_and(|current| current.id == uploaded.id && current.url == uploaded.url);
        if !unchanged {
            return;
        }
        if let Err(e) = planner.set_storage(index, url.to_string(), path.to_string()) {
            tracing::warn!(slot = index, error = %e, "Failed to record planner upload");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
