//! Enhancement job records and their status machine.
//!
//! ```text
//! idle ──► processing ──► completed ─┐
//!              ▲      └─► error ─────┤
//!              └─────────────────────┘  (regenerate / retry)
//! ```
//!
//! There is no terminal state. The result URL and the error message live
//! inside the status variant, so a record can never carry both, and a
//! completed record always carries a result.

use std::sync::Arc;

use serde::Serialize;

use crate::error::CoreError;
use crate::types::{JobId, SourceFile, Timestamp};

/// Message recorded on a job when the remote call fails for any reason.
pub const GENERIC_FAILURE_MESSAGE: &str = "Generation failed";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Idle,
    Processing,
    Completed { result_url: String },
    Error { error: String },
}

impl JobStatus {
    /// Short lowercase name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Completed { .. } => "completed",
            Self::Error { .. } => "error",
        }
    }

    /// Jobs eligible for a batch run: never processed, or failed.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Idle | Self::Error { .. })
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Processing)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    pub fn result_url(&self) -> Option<&str> {
        match self {
            Self::Completed { result_url } => Some(result_url),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error { error } => Some(error),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Job record
// ---------------------------------------------------------------------------

/// One user-submitted image tracked through the enhancement lifecycle.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancementJob {
    pub id: JobId,
    #[serde(skip)]
    pub original_file: Arc<SourceFile>,
    pub file_name: String,
    pub preview_url: String,
    #[serde(flatten)]
    pub status: JobStatus,
    pub created_at: Timestamp,
}

impl EnhancementJob {
    /// Create an `idle` job with a fresh identity for `file`.
    pub fn new(file: Arc<SourceFile>) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            file_name: file.name.clone(),
            preview_url: file.to_data_url(),
            original_file: file,
            status: JobStatus::Idle,
            created_at: chrono::Utc::now(),
        }
    }

    /// A new `idle` job sharing this job's source file.
    pub fn duplicate(&self) -> Self {
        Self::new(Arc::clone(&self.original_file))
    }

    /// Transition into `processing`.
    ///
    /// Rejected while a call for this job is already in flight, which makes
    /// processing exclusive per job.
    pub fn begin_processing(&mut self) -> Result<(), CoreError> {
        if self.status.is_processing() {
            return Err(CoreError::Conflict(format!(
                "Job {} is already processing",
                self.id
            )));
        }
        self.status = JobStatus::Processing;
        Ok(())
    }

    /// Record a successful remote result, replacing any previous one.
    pub fn complete(&mut self, result_url: String) {
        self.status = JobStatus::Completed { result_url };
    }

    /// Record a failure, replacing any previous result.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Error {
            error: error.into(),
        };
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
