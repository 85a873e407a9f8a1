//! Grade entity model.

use gradeshare_core::types::{DbId, EpochMillis};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `grades` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Grade {
    pub id: DbId,
    pub course_id: DbId,
    pub uid: DbId,
    pub regular: f64,
    #[serde(rename = "final")]
    pub final_score: f64,
    pub total: f64,
    pub year: String,
    pub term: String,
    pub ctime: EpochMillis,
    pub utime: EpochMillis,
}
