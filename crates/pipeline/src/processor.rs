//! Enhancement processing: one job at a time, or a batch run over every
//! pending job.
//!
//! A call is split in two halves. [`EnhanceProcessor::start`] marks the job
//! `processing` and snapshots the settings; [`EnhanceProcessor::complete`]
//! performs the remote call and applies the outcome. Callers that answer
//! before the remote call finishes (HTTP handlers) run `start` inline so
//! conflicts surface immediately, then spawn `complete`.
//!
//! Batch runs are single-flight: at most one runs at a time, and it
//! processes its snapshot strictly sequentially, awaiting each remote call
//! before starting the next.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kana_core::error::CoreError;
use kana_core::generation::ContentGenerator;
use kana_core::job::GENERIC_FAILURE_MESSAGE;
use kana_core::settings::EnhanceSettings;
use kana_core::types::{JobId, SourceFile};
use serde::Serialize;

use crate::settings::SettingsHandle;
use crate::store::JobStore;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// How a single processing call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Completed,
    Failed,
    /// The job was deleted while its call was in flight.
    Discarded,
}

/// Summary of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Jobs in the snapshot.
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Deleted before their turn, already processing, or discarded.
    pub skipped: usize,
}

/// A job that has entered `processing` and awaits its remote call.
#[derive(Debug)]
pub struct DispatchedJob {
    pub job_id: JobId,
    file: Arc<SourceFile>,
    settings: EnhanceSettings,
}

// ---------------------------------------------------------------------------
// Processor
// ---------------------------------------------------------------------------

pub struct EnhanceProcessor {
    jobs: Arc<JobStore>,
    settings: Arc<SettingsHandle>,
    generator: Arc<dyn ContentGenerator>,
    batch_running: AtomicBool,
}

impl EnhanceProcessor {
    pub fn new(
        jobs: Arc<JobStore>,
        settings: Arc<SettingsHandle>,
        generator: Arc<dyn ContentGenerator>,
    ) -> Self {
        Self {
            jobs,
            settings,
            generator,
            batch_running: AtomicBool::new(false),
        }
    }

    pub fn jobs(&self) -> &Arc<JobStore> {
        &self.jobs
    }

    pub fn settings(&self) -> &Arc<SettingsHandle> {
        &self.settings
    }

    pub fn is_batch_running(&self) -> bool {
        self.batch_running.load(Ordering::SeqCst)
    }

    // -- single job -----------------------------------------------------------

    /// Enter `processing` and capture the settings the call will use.
    ///
    /// `NotFound` for unknown jobs, `Conflict` when already processing.
    pub async fn start(&self, job_id: JobId) -> Result<DispatchedJob, CoreError> {
        let file = self.jobs.begin_processing(job_id).await?;
        let settings = self.settings.snapshot().await;
        Ok(DispatchedJob {
            job_id,
            file,
            settings,
        })
    }

    /// Run the remote call for a dispatched job and record its outcome.
    ///
    /// Remote failures never propagate: they become the job's `error`
    /// status with a generic message.
    pub async fn complete(&self, job: DispatchedJob) -> JobOutcome {
        let DispatchedJob {
            job_id,
            file,
            settings,
        } = job;

        let outcome = match self.generator.enhance_image(&file, &settings).await {
            Ok(image) => Ok(image.to_data_url()),
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "Enhancement failed");
                Err(GENERIC_FAILURE_MESSAGE.to_string())
            }
        };
        let failed = outcome.is_err();

        match (self.jobs.finish(job_id, outcome).await, failed) {
            (false, _) => JobOutcome::Discarded,
            (true, false) => {
                tracing::info!(job_id = %job_id, "Enhancement completed");
                JobOutcome::Completed
            }
            (true, true) => JobOutcome::Failed,
        }
    }

    /// Process one job to completion.
    pub async fn process_one(&self, job_id: JobId) -> Result<JobOutcome, CoreError> {
        let dispatched = self.start(job_id).await?;
        Ok(self.complete(dispatched).await)
    }

    // -- batch ----------------------------------------------------------------

    /// Claim the batch flag and snapshot the pending jobs.
    ///
    /// `Conflict` while another batch run holds the flag. The flag is held
    /// until the returned [`BatchRun`] is dropped.
    pub async fn begin_batch(self: &Arc<Self>) -> Result<BatchRun, CoreError> {
        if self
            .batch_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CoreError::Conflict(
                "A batch enhancement run is already in progress".into(),
            ));
        }
        let guard = BatchGuard(Arc::clone(self));
        let snapshot = self.jobs.pending_snapshot().await;
        tracing::info!(jobs = snapshot.len(), "Batch enhancement started");
        Ok(BatchRun {
            guard,
            snapshot,
        })
    }

    /// Run a whole batch and wait for it.
    pub async fn process_all(self: &Arc<Self>) -> Result<BatchReport, CoreError> {
        Ok(self.begin_batch().await?.run().await)
    }
}

/// Releases the batch flag on drop, including on panic or cancellation.
struct BatchGuard(Arc<EnhanceProcessor>);

impl Drop for BatchGuard {
    fn drop(&mut self) {
        self.0.batch_running.store(false, Ordering::SeqCst);
    }
}

/// A claimed batch run over a fixed snapshot of pending jobs.
pub struct BatchRun {
    guard: BatchGuard,
    snapshot: Vec<JobId>,
}

impl std::fmt::Debug for BatchRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRun")
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

impl BatchRun {
    pub fn snapshot(&self) -> &[JobId] {
        &self.snapshot
    }

    /// Process the snapshot in order, one remote call at a time.
    ///
    /// Jobs deleted before their turn, or already processing through a
    /// manual trigger, are skipped. A failure never stops the run.
    pub async fn run(self) -> BatchReport {
        let processor = &self.guard.0;
        let mut report = BatchReport {
            total: self.snapshot.len(),
            ..Default::default()
        };

        for &job_id in &self.snapshot {
            let dispatched = match processor.start(job_id).await {
                Ok(dispatched) => dispatched,
                Err(e) => {
                    tracing::debug!(job_id = %job_id, error = %e, "Skipping job in batch");
                    report.skipped += 1;
                    continue;
                }
            };
            match processor.complete(dispatched).await {
                JobOutcome::Completed => report.completed += 1,
                JobOutcome::Failed => report.failed += 1,
                JobOutcome::Discarded => report.skipped += 1,
            }
        }

        tracing::info!(
            total = report.total,
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            "Batch enhancement finished",
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use kana_core::generation::{
        GeneratedContent, GeneratedImage, Language, Platform, VisualStyle,
    };
    use kana_core::job::JobStatus;

    /// Succeeds unless the file name starts with `fail`.
    struct NameGenerator;

    #[async_trait]
    impl ContentGenerator for NameGenerator {
        async fn generate_caption(
            &self,
            _: &SourceFile,
            _: &str,
            _: Platform,
            _: Language,
        ) -> Result<GeneratedContent, CoreError> {
            Err(CoreError::Remote("unused".into()))
        }

        async fn generate_visual(
            &self,
            _: &[Arc<SourceFile>],
            _: &str,
            _: VisualStyle,
            _: Language,
        ) -> Result<GeneratedImage, CoreError> {
            Err(CoreError::Remote("unused".into()))
        }

        async fn enhance_image(
            &self,
            image: &SourceFile,
            _: &EnhanceSettings,
        ) -> Result<GeneratedImage, CoreError> {
            if image.name.starts_with("fail") {
                return Err(CoreError::Remote("quota exceeded".into()));
            }
            Ok(GeneratedImage {
                mime_type: "image/png".into(),
                bytes: image.bytes.clone(),
            })
        }
    }

    fn processor() -> Arc<EnhanceProcessor> {
        Arc::new(EnhanceProcessor::new(
            Arc::new(JobStore::default()),
            Arc::new(SettingsHandle::default()),
            Arc::new(NameGenerator),
        ))
    }

    fn file(name: &str) -> Arc<SourceFile> {
        SourceFile::new(name, "image/png", vec![7]).shared()
    }

    #[tokio::test]
    async fn process_one_completes_with_data_url() {
        let p = processor();
        let job = p.jobs().create(file("a.png")).await;

        assert_eq!(p.process_one(job.id).await.unwrap(), JobOutcome::Completed);
        let status = p.jobs().get(job.id).await.unwrap().status;
        assert_eq!(status.result_url(), Some("data:image/png;base64,Bw=="));
    }

    #[tokio::test]
    async fn remote_failure_becomes_generic_error() {
        let p = processor();
        let job = p.jobs().create(file("fail.png")).await;

        assert_eq!(p.process_one(job.id).await.unwrap(), JobOutcome::Failed);
        assert_eq!(
            p.jobs().get(job.id).await.unwrap().status,
            JobStatus::Error {
                error: GENERIC_FAILURE_MESSAGE.into()
            }
        );
    }

    #[tokio::test]
    async fn start_rejects_unknown_and_busy_jobs() {
        let p = processor();
        assert_matches!(
            p.start(uuid::Uuid::new_v4()).await,
            Err(CoreError::NotFound { .. })
        );

        let job = p.jobs().create(file("a.png")).await;
        let _dispatched = p.start(job.id).await.unwrap();
        assert_matches!(p.start(job.id).await, Err(CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn batch_failures_do_not_stop_the_run() {
        let p = processor();
        p.jobs().create(file("a.png")).await;
        p.jobs().create(file("fail.png")).await;
        p.jobs().create(file("c.png")).await;

        let report = p.process_all().await.unwrap();
        assert_eq!(
            report,
            BatchReport {
                total: 3,
                completed: 2,
                failed: 1,
                skipped: 0
            }
        );
        assert!(!p.is_batch_running());
    }

    #[tokio::test]
    async fn second_batch_is_rejected_while_first_is_claimed() {
        let p = processor();
        let run = p.begin_batch().await.unwrap();
        assert!(p.is_batch_running());
        assert_matches!(p.begin_batch().await, Err(CoreError::Conflict(_)));

        drop(run);
        assert!(!p.is_batch_running());
        assert!(p.begin_batch().await.is_ok());
    }

    #[tokio::test]
    async fn batch_skips_jobs_already_processing() {
        let p = processor();
        let busy = p.jobs().create(file("a.png")).await;
        p.jobs().create(file("b.png")).await;

        let run = p.begin_batch().await.unwrap();
        let _manual = p.start(busy.id).await.unwrap();

        let report = run.run().await;
        assert_eq!((report.total, report.completed, report.skipped), (2, 1, 1));
    }

    #[tokio::test]
    async fn completed_jobs_are_not_in_the_next_batch() {
        let p = processor();
        p.jobs().create(file("a.png")).await;
        p.process_all().await.unwrap();

        let report = p.process_all().await.unwrap();
        assert_eq!(report.total, 0);
    }
}
