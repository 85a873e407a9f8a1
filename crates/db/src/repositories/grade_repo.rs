//! Repository for the `grades` table.

use gradeshare_core::grade::NewGrade;
use gradeshare_core::types::{now_millis, DbId};
use sqlx::PgPool;

use crate::models::grade::Grade;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, course_id, uid, regular, final_score, total, year, term, ctime, utime";

/// Provides data access for shared grades.
pub struct GradeRepo;

impl GradeRepo {
    /// List every shared grade recorded for a course.
    pub async fn list_by_course(pool: &PgPool, course_id: DbId) -> Result<Vec<Grade>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM grades \
             WHERE course_id = $1 \
             ORDER BY year DESC, term DESC, id"
        );
        sqlx::query_as::<_, Grade>(&query)
            .bind(course_id)
            .fetch_all(pool)
            .await
    }

    /// List every grade a user has shared.
    pub async fn list_by_user(pool: &PgPool, uid: DbId) -> Result<Vec<Grade>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM grades \
             WHERE uid = $1 \
             ORDER BY course_id, year, term"
        );
        sqlx::query_as::<_, Grade>(&query)
            .bind(uid)
            .fetch_all(pool)
            .await
    }

    /// Upsert a full grade set in one transaction.
    ///
    /// Rows are matched on `(course_id, uid, year, term)`. A match has its
    /// scores and `utime` replaced; `ctime` is kept. Any failing row rolls
    /// back the whole batch, as does dropping the returned future before it
    /// completes. Returns the number of rows written.
    pub async fn bulk_upsert(pool: &PgPool, grades: &[NewGrade]) -> Result<u64, sqlx::Error> {
        let now = now_millis();
        let mut tx = pool.begin().await?;
        let mut written = 0;

        for grade in grades {
            let result = sqlx::query(
                "INSERT INTO grades \
                    (course_id, uid, regular, final_score, total, year, term, ctime, utime) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
                 ON CONFLICT (course_id, uid, year, term) \
                 DO UPDATE SET regular = EXCLUDED.regular, \
                               final_score = EXCLUDED.final_score, \
                               total = EXCLUDED.total, \
                               utime = EXCLUDED.utime",
            )
            .bind(grade.course_id)
            .bind(grade.uid)
            .bind(grade.regular)
            .bind(grade.final_score)
            .bind(grade.total)
            .bind(&grade.year)
            .bind(&grade.term)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        tracing::debug!(rows = written, "Grade batch upserted");
        Ok(written)
    }
}
