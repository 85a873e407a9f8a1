//! Grade domain values used by the ingestion pipeline.
//!
//! The crawl service hands back [`RawGrade`] entries that name their course
//! by code, name and teacher. The course registry maps each distinct
//! [`CourseKey`] to an internal course id, after which every entry becomes a
//! [`NewGrade`] ready for the bulk upsert.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Separator between the parts of a course identity key.
///
/// ASCII unit separator; never present in course codes, names or teacher
/// names coming from the crawl service.
pub const COURSE_KEY_SEPARATOR: char = '\u{1f}';

/// Required length of a grade's `year` token, e.g. `"2024"`.
pub const YEAR_LEN: usize = 4;

/// Required length of a grade's `term` token, e.g. `"1"`.
pub const TERM_LEN: usize = 1;

/// Build the identity key for a (code, name, teacher) triple.
pub fn course_identity_key(code: &str, name: &str, teacher: &str) -> String {
    let mut key = String::with_capacity(code.len() + name.len() + teacher.len() + 2);
    key.push_str(code);
    key.push(COURSE_KEY_SEPARATOR);
    key.push_str(name);
    key.push(COURSE_KEY_SEPARATOR);
    key.push_str(teacher);
    key
}

/// The (code, name, teacher) triple that identifies a course offering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CourseKey {
    pub code: String,
    pub name: String,
    pub teacher: String,
}

impl CourseKey {
    pub fn identity_key(&self) -> String {
        course_identity_key(&self.code, &self.name, &self.teacher)
    }
}

/// A course as answered by the course registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedCourse {
    pub key: CourseKey,
    pub course_id: DbId,
}

/// One grade entry as returned by the crawl service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGrade {
    pub course_code: String,
    pub course_name: String,
    pub course_teacher: String,
    pub regular: f64,
    pub final_score: f64,
    pub total: f64,
    pub year: String,
    pub term: String,
}

impl RawGrade {
    pub fn course_key(&self) -> CourseKey {
        CourseKey {
            code: self.course_code.clone(),
            name: self.course_name.clone(),
            teacher: self.course_teacher.clone(),
        }
    }

    pub fn identity_key(&self) -> String {
        course_identity_key(&self.course_code, &self.course_name, &self.course_teacher)
    }

    /// Attach the resolved course id and owner, producing a storable grade.
    pub fn into_grade(self, course_id: DbId, uid: DbId) -> NewGrade {
        NewGrade {
            course_id,
            uid,
            regular: self.regular,
            final_score: self.final_score,
            total: self.total,
            year: self.year,
            term: self.term,
        }
    }
}

/// A grade about to be upserted into the `grades` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGrade {
    pub course_id: DbId,
    pub uid: DbId,
    pub regular: f64,
    pub final_score: f64,
    pub total: f64,
    pub year: String,
    pub term: String,
}

impl NewGrade {
    /// Check the period tokens fit the `grades` columns.
    ///
    /// Scores are not range-checked; the crawl service is authoritative.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.year.chars().count() != YEAR_LEN {
            return Err(CoreError::Validation(format!(
                "grade year must be {YEAR_LEN} characters, got {:?}",
                self.year
            )));
        }
        if self.term.chars().count() != TERM_LEN {
            return Err(CoreError::Validation(format!(
                "grade term must be {TERM_LEN} character, got {:?}",
                self.term
            )));
        }
        Ok(())
    }
}
