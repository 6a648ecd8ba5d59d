//! Job Record Store: enhancement jobs in upload order plus the selection.
//!
//! Records and selection live behind one `RwLock` so deleting a job and
//! pruning it from the selection is a single step. Completions apply a
//! minimal status patch and only if the record still exists; a result for
//! a deleted job is dropped.

use std::sync::Arc;

use indexmap::IndexMap;
use kana_core::error::CoreError;
use kana_core::job::{EnhancementJob, JobStatus};
use kana_core::selection::SelectionSet;
use kana_core::types::{JobId, SourceFile};
use tokio::sync::RwLock;

use crate::events::{JobEvent, JobEventBus};

const JOB: &str = "Job";

#[derive(Default)]
struct JobTable {
    jobs: IndexMap<JobId, EnhancementJob>,
    selection: SelectionSet,
}

impl JobTable {
    fn get_mut(&mut self, id: &JobId) -> Result<&mut EnhancementJob, CoreError> {
        self.jobs
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found(JOB, id))
    }

    fn ensure_exists(&self, id: &JobId) -> Result<(), CoreError> {
        if self.jobs.contains_key(id) {
            Ok(())
        } else {
            Err(CoreError::not_found(JOB, id))
        }
    }

    /// Selected ids in job order.
    fn selected_ids(&self) -> Vec<JobId> {
        self.jobs
            .keys()
            .filter(|id| self.selection.contains(id))
            .copied()
            .collect()
    }
}

/// Counts of jobs per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct StatusCounts {
    pub idle: usize,
    pub processing: usize,
    pub completed: usize,
    pub error: usize,
}

pub struct JobStore {
    table: RwLock<JobTable>,
    events: Arc<JobEventBus>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new(Arc::new(JobEventBus::default()))
    }
}

impl JobStore {
    pub fn new(events: Arc<JobEventBus>) -> Self {
        Self {
            table: RwLock::new(JobTable::default()),
            events,
        }
    }

    pub fn events(&self) -> &Arc<JobEventBus> {
        &self.events
    }

    // -- records --------------------------------------------------------------

    /// Create an `idle` job for `file`, appended after existing jobs.
    pub async fn create(&self, file: Arc<SourceFile>) -> EnhancementJob {
        let job = EnhancementJob::new(file);
        self.table.write().await.jobs.insert(job.id, job.clone());
        tracing::debug!(job_id = %job.id, file = %job.file_name, "Job created");
        job
    }

    /// Create one job per file, preserving order.
    pub async fn create_many(&self, files: Vec<Arc<SourceFile>>) -> Vec<EnhancementJob> {
        let created: Vec<EnhancementJob> = files.into_iter().map(EnhancementJob::new).collect();
        let mut table = self.table.write().await;
        for job in &created {
            table.jobs.insert(job.id, job.clone());
        }
        tracing::debug!(count = created.len(), "Jobs created");
        created
    }

    /// A new `idle` job sharing the source file of `id`.
    pub async fn duplicate(&self, id: JobId) -> Result<EnhancementJob, CoreError> {
        let mut table = self.table.write().await;
        let copy = table
            .jobs
            .get(&id)
            .ok_or_else(|| CoreError::not_found(JOB, id))?
            .duplicate();
        table.jobs.insert(copy.id, copy.clone());
        tracing::debug!(job_id = %copy.id, source_job_id = %id, "Job duplicated");
        Ok(copy)
    }

    /// Delete a job and evict it from the selection. In-flight calls for it
    /// are not interrupted; their results are discarded on arrival.
    pub async fn remove(&self, id: JobId) -> Result<EnhancementJob, CoreError> {
        let mut table = self.table.write().await;
        let removed = table
            .jobs
            .shift_remove(&id)
            .ok_or_else(|| CoreError::not_found(JOB, id))?;
        table.selection.remove(&id);
        tracing::debug!(job_id = %id, status = removed.status.name(), "Job removed");
        Ok(removed)
    }

    pub async fn get(&self, id: JobId) -> Result<EnhancementJob, CoreError> {
        self.table
            .read()
            .await
            .jobs
            .get(&id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(JOB, id))
    }

    pub async fn contains(&self, id: JobId) -> bool {
        self.table.read().await.jobs.contains_key(&id)
    }

    /// All jobs in upload order.
    pub async fn list(&self) -> Vec<EnhancementJob> {
        self.table.read().await.jobs.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.table.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn status_counts(&self) -> StatusCounts {
        let table = self.table.read().await;
        table
            .jobs
            .values()
            .fold(StatusCounts::default(), |mut counts, job| {
                match job.status {
                    JobStatus::Idle => counts.idle += 1,
                    JobStatus::Processing => counts.processing += 1,
                    JobStatus::Completed { .. } => counts.completed += 1,
                    JobStatus::Error { .. } => counts.error += 1,
                }
                counts
            })
    }

    // -- transitions ----------------------------------------------------------

    /// Ids of `idle` and `error` jobs at this instant, in upload order.
    pub async fn pending_snapshot(&self) -> Vec<JobId> {
        self.table
            .read()
            .await
            .jobs
            .values()
            .filter(|job| job.status.is_pending())
            .map(|job| job.id)
            .collect()
    }

    /// Move a job into `processing` and hand back its source file.
    ///
    /// `Conflict` when the job is already processing.
    pub async fn begin_processing(&self, id: JobId) -> Result<Arc<SourceFile>, CoreError> {
        let file = {
            let mut table = self.table.write().await;
            let job = table.get_mut(&id)?;
            job.begin_processing()?;
            Arc::clone(&job.original_file)
        };
        self.events.publish(JobEvent::new(id, JobStatus::Processing));
        tracing::debug!(job_id = %id, "Job processing");
        Ok(file)
    }

    /// Apply a finished call's outcome.
    ///
    /// Only the status is patched. Returns `false` (and changes nothing)
    /// when the job was deleted while the call was in flight.
    pub async fn finish(&self, id: JobId, outcome: Result<String, String>) -> bool {
        let status = {
            let mut table = self.table.write().await;
            let Some(job) = table.jobs.get_mut(&id) else {
                tracing::debug!(job_id = %id, "Discarding result for deleted job");
                return false;
            };
            match outcome {
                Ok(result_url) => job.complete(result_url),
                Err(error) => job.fail(error),
            }
            job.status.clone()
        };
        tracing::debug!(job_id = %id, status = status.name(), "Job finished");
        self.events.publish(JobEvent::new(id, status));
        true
    }

    // -- selection ------------------------------------------------------------

    /// Selected ids in job order.
    pub async fn selection(&self) -> Vec<JobId> {
        self.table.read().await.selected_ids()
    }

    /// Flip selection of one job; returns whether it is now selected.
    pub async fn toggle_selection(&self, id: JobId) -> Result<bool, CoreError> {
        let mut table = self.table.write().await;
        table.ensure_exists(&id)?;
        Ok(table.selection.toggle(id))
    }

    /// Replace the selection. Every id must name an existing job.
    pub async fn set_selection(&self, ids: Vec<JobId>) -> Result<Vec<JobId>, CoreError> {
        let mut table = self.table.write().await;
        for id in &ids {
            table.ensure_exists(id)?;
        }
        table.selection.replace(ids);
        Ok(table.selected_ids())
    }

    pub async fn select_all(&self) -> Vec<JobId> {
        let mut table = self.table.write().await;
        let ids: Vec<JobId> = table.jobs.keys().copied().collect();
        table.selection.replace(ids.clone());
        ids
    }

    pub async fn clear_selection(&self) {
        self.table.write().await.selection.clear();
    }

    /// Jobs and selection as of one instant, for export planning.
    pub async fn export_snapshot(&self) -> (Vec<EnhancementJob>, SelectionSet) {
        let table = self.table.read().await;
        (
            table.jobs.values().cloned().collect(),
            table.selection.clone(),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
