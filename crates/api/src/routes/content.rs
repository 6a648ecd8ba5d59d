use axum::routing::post;
use axum::Router;

use crate::handlers::content;
use crate::state::AppState;

/// Routes mounted at `/content`.
///
/// ```text
/// POST   /captions    -> generate_caption (multipart)
/// POST   /visuals     -> generate_visual (multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/captions", post(content::generate_caption))
        .route("/visuals", post(content::generate_visual))
}
