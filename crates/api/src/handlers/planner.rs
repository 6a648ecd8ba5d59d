//! Handlers for the `/planner` resource and per-account planner sync.

use axum::extract::{Multipart, Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use kana_core::account::validate_account_id;
use kana_core::export::ExportArtifact;
use kana_core::generation::{Language, Platform};
use kana_core::grid_render::{GRID_EXPORT_FILE_NAME, JPEG_CONTENT_TYPE};
use kana_core::planner::DropSource;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::handlers::enhance::attachment;
use crate::handlers::upload::UploadForm;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Optional account whose persisted grid should follow a change.
#[derive(Debug, Default, Deserialize)]
pub struct AccountQuery {
    pub account: Option<String>,
}

impl AccountQuery {
    fn validated(&self) -> AppResult<Option<&str>> {
        match self.account.as_deref() {
            Some(account) => {
                validate_account_id(account)?;
                Ok(Some(account))
            }
            None => Ok(None),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReorderInput {
    pub source: usize,
    pub target: usize,
}

#[derive(Debug, Deserialize)]
pub struct HoverInput {
    pub index: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DraftInput {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateCaptionInput {
    pub index: usize,
    #[serde(default)]
    pub platform: Platform,
    #[serde(default)]
    pub language: Language,
}

/// Either an explicit caption for a slot, or neither field to commit the
/// open draft.
#[derive(Debug, Default, Deserialize)]
pub struct SaveCaptionInput {
    pub index: Option<usize>,
    pub text: Option<String>,
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// GET /api/v1/planner
pub async fn get_planner(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.planner.view().await,
    }))
}

/// PUT /api/v1/planner/slots/{index}
///
/// Multipart with a `file` part. The caption is kept.
pub async fn assign_slot(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let file = UploadForm::read(multipart).await?.require_file("file")?;
    let view = state.planner.assign_file(index, file).await?;
    Ok(Json(DataResponse { data: view }))
}

/// DELETE /api/v1/planner/slots/{index}?account={id}
pub async fn remove_slot(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Query(query): Query<AccountQuery>,
) -> AppResult<impl IntoResponse> {
    let view = state.planner.remove_slot(index, query.validated()?).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/planner/reorder
///
/// Swap two slots.
pub async fn reorder(
    State(state): State<AppState>,
    Json(input): Json<ReorderInput>,
) -> AppResult<impl IntoResponse> {
    let view = state.planner.reorder(input.source, input.target).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/planner/reset?account={id}
pub async fn reset(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
) -> AppResult<impl IntoResponse> {
    let view = state.planner.reset(query.validated()?).await?;
    tracing::info!(persisted = query.account.is_some(), "Planner reset");
    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// Drag and drop
// ---------------------------------------------------------------------------

/// POST /api/v1/planner/slots/{index}/drag
pub async fn start_slot_drag(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> AppResult<impl IntoResponse> {
    let view = state.planner.start_slot_drag(index).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/planner/slots/{index}/drop
///
/// With a `file` part the drop is an external file; without one it
/// completes the slot drag.
pub async fn drop_on_slot(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let source = match UploadForm::read(multipart).await?.file("file") {
        Some(file) => DropSource::ExternalFile(file),
        None => DropSource::Slot,
    };
    let view = state.planner.drop_on(index, source).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/planner/drag/external/start
pub async fn start_external_drag(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.planner.start_external_file_drag().await,
    }))
}

/// POST /api/v1/planner/drag/external/end
pub async fn end_external_drag(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.planner.end_external_file_drag().await,
    }))
}

/// PUT /api/v1/planner/hover
pub async fn hover(
    State(state): State<AppState>,
    Json(input): Json<HoverInput>,
) -> AppResult<impl IntoResponse> {
    let view = state.planner.hover(input.index).await?;
    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// Captions
// ---------------------------------------------------------------------------

/// POST /api/v1/planner/slots/{index}/caption/edit
pub async fn edit_caption(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> AppResult<impl IntoResponse> {
    let view = state.planner.edit_caption(index).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/planner/caption/draft
pub async fn set_draft(
    State(state): State<AppState>,
    Json(input): Json<DraftInput>,
) -> AppResult<impl IntoResponse> {
    let view = state.planner.set_draft(input.text).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/planner/caption/generate
///
/// Fills the open draft with a generated caption. Nothing is saved.
pub async fn generate_caption(
    State(state): State<AppState>,
    Json(input): Json<GenerateCaptionInput>,
) -> AppResult<impl IntoResponse> {
    let suggestion = state
        .planner
        .generate_caption(input.index, input.platform, input.language)
        .await?;
    Ok(Json(DataResponse { data: suggestion }))
}

/// POST /api/v1/planner/caption/save
pub async fn save_caption(
    State(state): State<AppState>,
    Json(input): Json<SaveCaptionInput>,
) -> AppResult<impl IntoResponse> {
    let target = match (input.index, input.text) {
        (Some(index), Some(text)) => Some((index, text)),
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest(
                "Provide both 'index' and 'text', or neither to save the open draft".into(),
            ))
        }
    };
    let view = state.planner.save_caption(target).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/planner/caption/close
///
/// Discards the draft.
pub async fn close_caption(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.planner.close_caption_editor().await,
    }))
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// GET /api/v1/planner/export
///
/// The whole grid as one JPEG.
pub async fn export_grid(State(state): State<AppState>) -> AppResult<Response> {
    let bytes = state.planner.rasterize().await?;
    Ok(attachment(ExportArtifact {
        file_name: GRID_EXPORT_FILE_NAME.to_string(),
        content_type: JPEG_CONTENT_TYPE,
        bytes,
    }))
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// POST /api/v1/accounts/{id}/planner/load
pub async fn load_planner(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> AppResult<impl IntoResponse> {
    validate_account_id(&account)?;
    let view = state.planner.load(&account).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/accounts/{id}/planner/save
pub async fn save_planner(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> AppResult<impl IntoResponse> {
    validate_account_id(&account)?;
    let view = state.planner.save(&account).await?;
    Ok(Json(DataResponse { data: view }))
}
