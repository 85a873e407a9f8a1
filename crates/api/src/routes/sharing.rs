use axum::routing::{get, post};
use axum::Router;

use crate::handlers::sharing;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET  /{uid}/share-agreement   -> get_status
/// PUT  /{uid}/share-agreement   -> sign
/// POST /{uid}/grade-shares      -> request_share
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{uid}/share-agreement",
            get(sharing::get_status).put(sharing::sign),
        )
        .route("/{uid}/grade-shares", post(sharing::request_share))
}
