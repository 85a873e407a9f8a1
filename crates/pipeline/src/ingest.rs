//! Pure steps of the ingestion pipeline: course de-duplication and the
//! join of crawled grades against resolved course ids.

use std::collections::{HashMap, HashSet};

use gradeshare_core::grade::{CourseKey, NewGrade, RawGrade, ResolvedCourse};
use gradeshare_core::types::DbId;

use crate::error::ServiceError;

/// Distinct course keys referenced by `grades`, in first-seen order.
pub fn distinct_course_keys(grades: &[RawGrade]) -> Vec<CourseKey> {
    let mut seen = HashSet::with_capacity(grades.len());
    grades
        .iter()
        .filter(|g| seen.insert(g.identity_key()))
        .map(RawGrade::course_key)
        .collect()
}

/// Index registry answers by course identity key.
pub fn course_id_map(resolved: Vec<ResolvedCourse>) -> HashMap<String, DbId> {
    resolved
        .into_iter()
        .map(|c| (c.key.identity_key(), c.course_id))
        .collect()
}

/// Attach course ids and the owner to every crawled grade.
///
/// Every grade must find its course in `course_ids`; a miss is reported as
/// [`ServiceError::UnresolvedCourse`] instead of dropping the row. Each
/// joined grade is validated before anything is returned.
pub fn join_grades(
    uid: DbId,
    grades: Vec<RawGrade>,
    course_ids: &HashMap<String, DbId>,
) -> Result<Vec<NewGrade>, ServiceError> {
    grades
        .into_iter()
        .map(|raw| {
            let Some(&course_id) = course_ids.get(&raw.identity_key()) else {
                return Err(ServiceError::UnresolvedCourse {
                    code: raw.course_code,
                    name: raw.course_name,
                    teacher: raw.course_teacher,
                });
            };
            let grade = raw.into_grade(course_id, uid);
            grade.validate()?;
            Ok(grade)
        })
        .collect()
}
