//! Route definitions for the `/accounts` resource, including the
//! per-account planner sync endpoints.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{accounts, planner};
use crate::state::AppState;

/// Routes mounted at `/accounts`.
///
/// ```text
/// POST   /sign-up/validate    -> validate_sign_up_form
/// GET    /{id}                -> get_account
/// PUT    /{id}                -> sync_account
/// DELETE /{id}                -> delete_account
/// PATCH  /{id}/profile        -> update_profile (multipart)
/// POST   /{id}/planner/load   -> load_planner
/// POST   /{id}/planner/save   -> save_planner
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sign-up/validate", post(accounts::validate_sign_up_form))
        .route(
            "/{id}",
            get(accounts::get_account)
                .put(accounts::sync_account)
                .delete(accounts::delete_account),
        )
        .route("/{id}/profile", patch(accounts::update_profile))
        .route("/{id}/planner/load", post(planner::load_planner))
        .route("/{id}/planner/save", post(planner::save_planner))
}
