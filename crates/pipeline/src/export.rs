//! Selection & Export Manager: turns a download action into a single PNG,
//! a ZIP of PNGs, or nothing.
//!
//! Job state is never mutated. Compositing and archive encoding are CPU
//! bound and run on the blocking pool.

use std::sync::Arc;

use kana_core::compositor::compose;
use kana_core::error::CoreError;
use kana_core::export::{
    build_archive, plan_download, ExportArtifact, ExportPlan, ExportTarget, ARCHIVE_FILE_NAME,
    ARCHIVE_FOLDER, PNG_CONTENT_TYPE, ZIP_CONTENT_TYPE,
};
use kana_core::generation::ImageFetcher;

use crate::settings::SettingsHandle;
use crate::store::JobStore;

pub struct ExportManager {
    jobs: Arc<JobStore>,
    settings: Arc<SettingsHandle>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl ExportManager {
    pub fn new(
        jobs: Arc<JobStore>,
        settings: Arc<SettingsHandle>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            jobs,
            settings,
            fetcher,
        }
    }

    /// Produce the download for the current jobs and selection.
    ///
    /// `Ok(None)` when there is nothing completed to export.
    pub async fn download(&self) -> Result<Option<ExportArtifact>, CoreError> {
        let (jobs, selection) = self.jobs.export_snapshot().await;
        let plan = plan_download(&jobs, &selection);
        let frame = self.settings.frame().await.map(|f| Arc::new(f.bytes.clone()));

        match plan {
            ExportPlan::Nothing => {
                tracing::debug!("Nothing to export");
                Ok(None)
            }
            ExportPlan::Single(target) => {
                let bytes = self.composed(&target, frame).await?;
                tracing::info!(job_id = %target.job_id, "Exported single result");
                Ok(Some(ExportArtifact {
                    file_name: target.file_name,
                    content_type: PNG_CONTENT_TYPE,
                    bytes,
                }))
            }
            ExportPlan::Archive(targets) => {
                let mut entries = Vec::with_capacity(targets.len());
                for target in &targets {
                    let bytes = self.composed(target, frame.clone()).await?;
                    entries.push((target.file_name.clone(), bytes));
                }

                let bytes = tokio::task::spawn_blocking(move || {
                    build_archive(ARCHIVE_FOLDER, &entries)
                })
                .await
                .map_err(|e| CoreError::Internal(format!("archive task failed: {e}")))??;

                tracing::info!(entries = targets.len(), "Exported result archive");
                Ok(Some(ExportArtifact {
                    file_name: ARCHIVE_FILE_NAME.to_string(),
                    content_type: ZIP_CONTENT_TYPE,
                    bytes,
                }))
            }
        }
    }

    /// Fetch a target's result and burn in the frame, if any.
    async fn composed(
        &self,
        target: &ExportTarget,
        frame: Option<Arc<Vec<u8>>>,
    ) -> Result<Vec<u8>, CoreError> {
        let result = self.fetcher.fetch(&target.result_url).await?;
        tokio::task::spawn_blocking(move || compose(&result, frame.as_deref().map(Vec::as_slice)))
            .await
            .map_err(|e| CoreError::Internal(format!("compose task failed: {e}")))?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
