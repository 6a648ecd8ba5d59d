//! Handlers for the `/enhance` resource: jobs, processing, settings,
//! selection and download.
//!
//! Processing endpoints answer `202 Accepted` once the job has entered
//! `processing`; the remote call continues in a spawned task and its
//! outcome is visible through `GET /enhance/jobs`.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use kana_core::export::ExportArtifact;
use kana_core::settings::{EnhanceSettings, UpdateEnhanceSettings};
use kana_core::types::JobId;
use kana_pipeline::StatusCounts;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::upload::UploadForm;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Settings as exposed over HTTP; the frame itself is never serialized.
#[derive(Debug, Serialize)]
pub struct SettingsView {
    #[serde(flatten)]
    pub settings: EnhanceSettings,
    pub has_frame: bool,
    pub frame_name: Option<String>,
}

impl From<EnhanceSettings> for SettingsView {
    fn from(settings: EnhanceSettings) -> Self {
        Self {
            has_frame: settings.has_frame(),
            frame_name: settings.frame_file.as_ref().map(|f| f.name.clone()),
            settings,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProcessingStatus {
    pub counts: StatusCounts,
    pub batch_running: bool,
}

#[derive(Debug, Serialize)]
pub struct BatchStarted {
    /// Jobs captured by the run, in processing order.
    pub job_ids: Vec<JobId>,
}

#[derive(Debug, Deserialize)]
pub struct SetSelection {
    pub ids: Vec<JobId>,
}

#[derive(Debug, Serialize)]
pub struct SelectionToggled {
    pub id: JobId,
    pub selected: bool,
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

/// GET /api/v1/enhance/jobs
pub async fn list_jobs(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let jobs = state.jobs.list().await;
    Ok(Json(DataResponse { data: jobs }))
}

/// POST /api/v1/enhance/jobs
///
/// Multipart upload; one `idle` job per file part, in upload order.
pub async fn upload_jobs(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let files = UploadForm::read(multipart).await?.into_files();
    if files.is_empty() {
        return Err(AppError::BadRequest("No files uploaded".into()));
    }

    let jobs = state.jobs.create_many(files).await;
    tracing::info!(count = jobs.len(), "Enhancement jobs created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: jobs })))
}

/// DELETE /api/v1/enhance/jobs/{id}
///
/// An in-flight call for the job keeps running; its result is discarded.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<StatusCode> {
    state.jobs.remove(job_id).await?;
    tracing::info!(job_id = %job_id, "Enhancement job deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/enhance/jobs/{id}/duplicate
pub async fn duplicate_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let copy = state.jobs.duplicate(job_id).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: copy })))
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

/// POST /api/v1/enhance/jobs/{id}/process
///
/// Process (or retry, or regenerate) one job. 409 if it is already
/// processing.
pub async fn process_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let dispatched = state.processor.start(job_id).await?;
    let job = state.jobs.get(job_id).await?;

    let processor = Arc::clone(&state.processor);
    tokio::spawn(async move {
        processor.complete(dispatched).await;
    });

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: job })))
}

/// POST /api/v1/enhance/process-all
///
/// Start a batch run over every `idle` or `error` job. 409 while another
/// batch run is in progress.
pub async fn process_all(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let run = state.processor.begin_batch().await?;
    let job_ids = run.snapshot().to_vec();
    tokio::spawn(run.run());

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: BatchStarted { job_ids },
        }),
    ))
}

/// GET /api/v1/enhance/status
pub async fn processing_status(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let status = ProcessingStatus {
        counts: state.jobs.status_counts().await,
        batch_running: state.processor.is_batch_running(),
    };
    Ok(Json(DataResponse { data: status }))
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// GET /api/v1/enhance/settings
pub async fn get_settings(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let settings = state.settings.snapshot().await;
    Ok(Json(DataResponse {
        data: SettingsView::from(settings),
    }))
}

/// PUT /api/v1/enhance/settings
///
/// Partial update. Jobs already dispatched keep the settings they started
/// with.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(input): Json<UpdateEnhanceSettings>,
) -> AppResult<impl IntoResponse> {
    let settings = state.settings.update(input).await?;
    Ok(Json(DataResponse {
        data: SettingsView::from(settings),
    }))
}

/// PUT /api/v1/enhance/settings/frame
///
/// Multipart with a `frame` file part.
pub async fn set_frame(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let frame = UploadForm::read(multipart).await?.require_file("frame")?;
    tracing::info!(file = %frame.name, "Export frame set");
    let settings = state.settings.set_frame(Some(frame)).await;
    Ok(Json(DataResponse {
        data: SettingsView::from(settings),
    }))
}

/// DELETE /api/v1/enhance/settings/frame
pub async fn clear_frame(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let settings = state.settings.set_frame(None).await;
    Ok(Json(DataResponse {
        data: SettingsView::from(settings),
    }))
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// GET /api/v1/enhance/selection
pub async fn get_selection(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.jobs.selection().await,
    }))
}

/// PUT /api/v1/enhance/selection
pub async fn set_selection(
    State(state): State<AppState>,
    Json(input): Json<SetSelection>,
) -> AppResult<impl IntoResponse> {
    let ids = state.jobs.set_selection(input.ids).await?;
    Ok(Json(DataResponse { data: ids }))
}

/// POST /api/v1/enhance/selection/all
pub async fn select_all(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.jobs.select_all().await,
    }))
}

/// POST /api/v1/enhance/selection/{id}/toggle
pub async fn toggle_selection(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let selected = state.jobs.toggle_selection(job_id).await?;
    Ok(Json(DataResponse {
        data: SelectionToggled {
            id: job_id,
            selected,
        },
    }))
}

/// DELETE /api/v1/enhance/selection
pub async fn clear_selection(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.jobs.clear_selection().await;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Download
// ---------------------------------------------------------------------------

/// GET /api/v1/enhance/download
///
/// A PNG for one target, a ZIP for several, `204 No Content` when nothing
/// has completed.
pub async fn download(State(state): State<AppState>) -> AppResult<Response> {
    match state.export.download().await? {
        Some(artifact) => Ok(attachment(artifact)),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Serve an artifact as a file download.
pub(crate) fn attachment(artifact: ExportArtifact) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    (
        [
            (header::CONTENT_TYPE, artifact.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response()
}
