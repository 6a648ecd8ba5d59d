pub mod accounts;
pub mod content;
pub mod enhance;
pub mod health;
pub mod planner;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Request body cap; uploads carry full-resolution photos.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /enhance/jobs                                   list, upload
/// /enhance/jobs/{id}                              delete
/// /enhance/jobs/{id}/duplicate                    duplicate (POST)
/// /enhance/jobs/{id}/process                      process one (POST, 202)
/// /enhance/process-all                            batch run (POST, 202)
/// /enhance/status                                 counts + batch flag
/// /enhance/settings                               get, update
/// /enhance/settings/frame                         set, clear
/// /enhance/selection                              get, replace, clear
/// /enhance/selection/all                          select all (POST)
/// /enhance/selection/{id}/toggle                  toggle (POST)
/// /enhance/download                               PNG, ZIP or 204
///
/// /planner                                        view
/// /planner/slots/{index}                          assign, remove
/// /planner/slots/{index}/drag|drop                slot drag and drop
/// /planner/slots/{index}/caption/edit             open caption editor
/// /planner/reorder                                swap two slots
/// /planner/drag/external/start|end                external file drag
/// /planner/hover                                  live preview
/// /planner/caption/draft|generate|save|close      caption editor
/// /planner/export                                 JPEG raster
/// /planner/reset                                  empty the grid
///
/// /content/captions                               caption + video ideas
/// /content/visuals                                generated post visual
///
/// /accounts/sign-up/validate                      sign-up form check
/// /accounts/{id}                                  get, sync, delete
/// /accounts/{id}/profile                          update profile
/// /accounts/{id}/planner/load|save                persisted grid
///
/// /blobs/{*path}                                  stored blobs
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/enhance", enhance::router())
        .nest("/planner", planner::router())
        .nest("/content", content::router())
        .nest("/accounts", accounts::router())
        .route("/blobs/{*path}", get(handlers::blobs::get_blob))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
