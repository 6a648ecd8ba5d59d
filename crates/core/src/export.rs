//! Download planning and archive packaging for enhancement results.
//!
//! Planning is pure: it looks at job records and the selection and decides
//! between nothing, a single PNG, or a folder-grouped ZIP. Fetching and
//! compositing the bytes happens in the caller.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::CoreError;
use crate::job::EnhancementJob;
use crate::selection::SelectionSet;
use crate::types::JobId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// File name of the multi-job archive.
pub const ARCHIVE_FILE_NAME: &str = "kana_enhanced_images.zip";

/// Single top-level folder grouping every archive entry.
pub const ARCHIVE_FOLDER: &str = "kana-enhanced";

pub const PNG_CONTENT_TYPE: &str = "image/png";
pub const ZIP_CONTENT_TYPE: &str = "application/zip";

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// One completed job chosen for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    pub job_id: JobId,
    pub result_url: String,
    /// File name inside the download (or the download itself when single).
    pub file_name: String,
}

/// What a download action should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportPlan {
    /// No completed jobs at all: silently do nothing.
    Nothing,
    Single(ExportTarget),
    Archive(Vec<ExportTarget>),
}

/// Decide what to export.
///
/// Targets are the selected completed jobs; with none, every completed job.
/// Non-completed selected jobs are excluded silently. Order follows `jobs`.
pub fn plan_download(jobs: &[EnhancementJob], selection: &SelectionSet) -> ExportPlan {
    let completed = || jobs.iter().filter(|j| j.status.is_completed());

    let mut targets: Vec<&EnhancementJob> =
        completed().filter(|j| selection.contains(&j.id)).collect();
    if targets.is_empty() {
        targets = completed().collect();
    }

    match targets.as_slice() {
        [] => ExportPlan::Nothing,
        [job] => ExportPlan::Single(ExportTarget {
            job_id: job.id,
            result_url: job.status.result_url().unwrap_or_default().to_string(),
            file_name: single_file_name(&job.id),
        }),
        many => ExportPlan::Archive(
            many.iter()
                .enumerate()
                .map(|(index, job)| ExportTarget {
                    job_id: job.id,
                    result_url: job.status.result_url().unwrap_or_default().to_string(),
                    file_name: archive_entry_name(index, &job.id),
                })
                .collect(),
        ),
    }
}

/// Download name for a single composited result.
pub fn single_file_name(id: &JobId) -> String {
    format!("enhanced-{id}.png")
}

/// Archive entry name; index plus id keeps names unique within one export.
pub fn archive_entry_name(index: usize, id: &JobId) -> String {
    format!("enhanced_{}_{id}.png", index + 1)
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

/// A materialized download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Package `(entry name, bytes)` pairs under `folder/` in a ZIP archive.
///
/// PNG data is already compressed, so entries are stored as-is.
pub fn build_archive(folder: &str, entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>, CoreError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    zip.add_directory(format!("{folder}/"), options)
        .map_err(|e| CoreError::Encode(format!("zip add directory failed: {e}")))?;

    for (name, bytes) in entries {
        let path = format!("{folder}/{name}");
        zip.start_file(path.as_str(), options)
            .map_err(|e| CoreError::Encode(format!("zip start file failed ({path}): {e}")))?;
        zip.write_all(bytes)
            .map_err(|e| CoreError::Encode(format!("zip write failed ({path}): {e}")))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| CoreError::Encode(format!("zip finish failed: {e}")))?;
    Ok(cursor.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
