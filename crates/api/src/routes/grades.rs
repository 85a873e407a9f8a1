use axum::routing::get;
use axum::Router;

use crate::handlers::grades;
use crate::state::AppState;

/// Routes mounted at `/courses`.
///
/// ```text
/// GET /{course_id}/grades    -> list_by_course
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{course_id}/grades", get(grades::list_by_course))
}
