//! Route definitions for the `/planner` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::planner;
use crate::state::AppState;

/// Routes mounted at `/planner`.
///
/// ```text
/// GET    /                            -> get_planner
/// PUT    /slots/{index}               -> assign_slot (multipart)
/// DELETE /slots/{index}?account=      -> remove_slot
/// POST   /slots/{index}/drag          -> start_slot_drag
/// POST   /slots/{index}/drop          -> drop_on_slot (multipart)
/// POST   /slots/{index}/caption/edit  -> edit_caption
/// POST   /reorder                     -> reorder
/// POST   /drag/external/start         -> start_external_drag
/// POST   /drag/external/end           -> end_external_drag
/// PUT    /hover                       -> hover
/// PUT    /caption/draft               -> set_draft
/// POST   /caption/generate            -> generate_caption
/// POST   /caption/save                -> save_caption
/// POST   /caption/close               -> close_caption
/// GET    /export                      -> export_grid (JPEG)
/// POST   /reset?account=              -> reset
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(planner::get_planner))
        .route(
            "/slots/{index}",
            put(planner::assign_slot).delete(planner::remove_slot),
        )
        .route("/slots/{index}/drag", post(planner::start_slot_drag))
        .route("/slots/{index}/drop", post(planner::drop_on_slot))
        .route("/slots/{index}/caption/edit", post(planner::edit_caption))
        .route("/reorder", post(planner::reorder))
        .route("/drag/external/start", post(planner::start_external_drag))
        .route("/drag/external/end", post(planner::end_external_drag))
        .route("/hover", put(planner::hover))
        .route("/caption/draft", put(planner::set_draft))
        .route("/caption/generate", post(planner::generate_caption))
        .route("/caption/save", post(planner::save_caption))
        .route("/caption/close", post(planner::close_caption))
        .route("/export", get(planner::export_grid))
        .route("/reset", post(planner::reset))
}
