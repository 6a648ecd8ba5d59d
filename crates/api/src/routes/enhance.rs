//! Route definitions for the `/enhance` resource.

use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::handlers::enhance;
use crate::state::AppState;

/// Routes mounted at `/enhance`.
///
/// ```text
/// GET    /jobs                   -> list_jobs
/// POST   /jobs                   -> upload_jobs (multipart)
/// DELETE /jobs/{id}              -> delete_job
/// POST   /jobs/{id}/duplicate    -> duplicate_job
/// POST   /jobs/{id}/process      -> process_job (202)
/// POST   /process-all            -> process_all (202)
/// GET    /status                 -> processing_status
/// GET    /settings               -> get_settings
/// PUT    /settings               -> update_settings
/// PUT    /settings/frame         -> set_frame (multipart)
/// DELETE /settings/frame         -> clear_frame
/// GET    /selection              -> get_selection
/// PUT    /selection              -> set_selection
/// DELETE /selection              -> clear_selection
/// POST   /selection/all          -> select_all
/// POST   /selection/{id}/toggle  -> toggle_selection
/// GET    /download               -> download (PNG, ZIP or 204)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/jobs", get(enhance::list_jobs).post(enhance::upload_jobs))
        .route("/jobs/{id}", delete(enhance::delete_job))
        .route("/jobs/{id}/duplicate", post(enhance::duplicate_job))
        .route("/jobs/{id}/process", post(enhance::process_job))
        .route("/process-all", post(enhance::process_all))
        .route("/status", get(enhance::processing_status))
        .route(
            "/settings",
            get(enhance::get_settings).put(enhance::update_settings),
        )
        .route(
            "/settings/frame",
            put(enhance::set_frame).delete(enhance::clear_frame),
        )
        .route(
            "/selection",
            get(enhance::get_selection)
                .put(enhance::set_selection)
                .delete(enhance::clear_selection),
        )
        .route("/selection/all", post(enhance::select_all))
        .route("/selection/{id}/toggle", post(enhance::toggle_selection))
        .route("/download", get(enhance::download))
}
