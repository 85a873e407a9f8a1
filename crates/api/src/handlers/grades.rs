//! Handlers for shared grades.

use axum::extract::{Path, State};
use axum::Json;
use gradeshare_core::types::DbId;
use gradeshare_db::models::grade::Grade;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// A shared grade as exposed to course viewers. Omits the owner.
#[derive(Debug, Serialize)]
pub struct GradeView {
    pub regular: f64,
    #[serde(rename = "final")]
    pub final_score: f64,
    pub total: f64,
    pub year: String,
    pub term: String,
}

impl From<Grade> for GradeView {
    fn from(grade: Grade) -> Self {
        Self {
            regular: grade.regular,
            final_score: grade.final_score,
            total: grade.total,
            year: grade.year,
            term: grade.term,
        }
    }
}

/// GET /api/v1/courses/{course_id}/grades
///
/// Every shared grade of a course; an unknown course yields an empty list.
pub async fn list_by_course(
    State(state): State<AppState>,
    Path(course_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<GradeView>>>> {
    let grades = state.service.get_grades_by_course(course_id).await?;
    Ok(Json(DataResponse {
        data: grades.into_iter().map(GradeView::from).collect(),
    }))
}
