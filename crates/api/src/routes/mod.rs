pub mod grades;
pub mod health;
pub mod sharing;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /courses/{course_id}/grades          shared grades of a course (GET)
/// /users/{uid}/share-agreement         sign status (GET), sign / cancel (PUT)
/// /users/{uid}/grade-shares            request a grade share (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/courses", grades::router())
        .nest("/users", sharing::router())
}
