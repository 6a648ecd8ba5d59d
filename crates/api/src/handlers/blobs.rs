//! Serves blobs uploaded through the account and planner endpoints.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::AppResult;
use crate::state::AppState;

/// GET /api/v1/blobs/{*path}
pub async fn get_blob(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> AppResult<Response> {
    let (bytes, content_type) = state.blobs.download(&path).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}
