//! Handlers for the standalone `/content` generators.
//!
//! Unlike job processing, remote failures here are returned to the caller
//! directly (`502 REMOTE_ERROR`); there is no record to park them on.

use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use axum::Json;
use kana_core::generation::{Language, Platform, VisualStyle};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::handlers::upload::UploadForm;
use crate::response::DataResponse;
use crate::state::AppState;

/// A generated image, inline.
#[derive(Debug, Serialize)]
pub struct VisualResult {
    pub mime_type: String,
    pub url: String,
}

/// POST /api/v1/content/captions
///
/// Multipart: `image` file, optional `context`, `platform`, `language`.
pub async fn generate_caption(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = UploadForm::read(multipart).await?;
    let image = form.require_file("image")?;
    let platform: Platform = form.choice("platform")?;
    let language: Language = form.choice("language")?;
    let context = form.text("context").unwrap_or_default();

    let content = state
        .generator
        .generate_caption(&image, context, platform, language)
        .await?;
    tracing::info!(platform = platform.label(), ideas = content.video_ideas.len(), "Caption generated");

    Ok(Json(DataResponse { data: content }))
}

/// POST /api/v1/content/visuals
///
/// Multipart: one or more `images` files, optional `context`, `style`,
/// `language`.
pub async fn generate_visual(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = UploadForm::read(multipart).await?;
    let images = form.files_named("images");
    if images.is_empty() {
        return Err(AppError::BadRequest("At least one image is required".into()));
    }
    let style: VisualStyle = form.choice("style")?;
    let language: Language = form.choice("language")?;
    let context = form.text("context").unwrap_or_default();

    let image = state
        .generator
        .generate_visual(&images, context, style, language)
        .await?;
    tracing::info!(style = style.label(), sources = images.len(), "Visual generated");

    Ok(Json(DataResponse {
        data: VisualResult {
            url: image.to_data_url(),
            mime_type: image.mime_type,
        },
    }))
}
