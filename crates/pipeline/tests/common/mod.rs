//! In-memory collaborators for driving `GradeService` in tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gradeshare_clients::{ClientError, CourseRegistry, GradeCrawler};
use gradeshare_core::grade::{CourseKey, RawGrade, ResolvedCourse};
use gradeshare_pipeline::GradeService;
use sqlx::PgPool;

/// Crawl service stand-in returning a fixed grade list, or an error.
#[derive(Default)]
pub struct FakeCrawler {
    pub grades: Vec<RawGrade>,
    pub fail_status: Option<u16>,
    pub calls: AtomicUsize,
}

impl FakeCrawler {
    pub fn returning(grades: Vec<RawGrade>) -> Self {
        Self {
            grades,
            ..Default::default()
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GradeCrawler for FakeCrawler {
    async fn fetch_all_grades(
        &self,
        _credential_id: &str,
        _credential_secret: &str,
    ) -> Result<Vec<RawGrade>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_status {
            Some(401) => Err(ClientError::Authentication {
                service: "crawl service",
                status: 401,
            }),
            Some(status) => Err(ClientError::Api {
                service: "crawl service",
                status,
                body: "unavailable".into(),
            }),
            None => Ok(self.grades.clone()),
        }
    }
}

/// Course registry stand-in answering from a fixed id table, in reverse
/// input order, and recording every batch it receives.
#[derive(Default)]
pub struct FakeRegistry {
    pub ids: Vec<(CourseKey, i64)>,
    pub fail: bool,
    pub batches: Mutex<Vec<Vec<CourseKey>>>,
}

impl FakeRegistry {
    pub fn with_ids(ids: Vec<(CourseKey, i64)>) -> Self {
        Self {
            ids,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn batches(&self) -> Vec<Vec<CourseKey>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl CourseRegistry for FakeRegistry {
    async fn resolve_or_create(
        &self,
        courses: &[CourseKey],
    ) -> Result<Vec<ResolvedCourse>, ClientError> {
        self.batches.lock().unwrap().push(courses.to_vec());
        if self.fail {
            return Err(ClientError::Api {
                service: "course registry",
                status: 503,
                body: "down".into(),
            });
        }
        Ok(courses
            .iter()
            .rev()
            .filter_map(|key| {
                self.ids
                    .iter()
                    .find(|(known, _)| known == key)
                    .map(|(known, id)| ResolvedCourse {
                        key: known.clone(),
                        course_id: *id,
                    })
            })
            .collect())
    }
}

pub fn course(code: &str, name: &str, teacher: &str) -> CourseKey {
    CourseKey {
        code: code.into(),
        name: name.into(),
        teacher: teacher.into(),
    }
}

pub fn raw_grade(key: &CourseKey, regular: f64, final_score: f64, total: f64) -> RawGrade {
    RawGrade {
        course_code: key.code.clone(),
        course_name: key.name.clone(),
        course_teacher: key.teacher.clone(),
        regular,
        final_score,
        total,
        year: "2024".into(),
        term: "1".into(),
    }
}

/// The two-course crawl answer used across the pipeline tests.
pub fn two_course_fixture() -> (Vec<RawGrade>, Vec<(CourseKey, i64)>) {
    let intro = course("CS101", "Intro", "Smith");
    let data = course("CS102", "Data", "Jones");
    let grades = vec![
        raw_grade(&intro, 80.0, 90.0, 86.0),
        raw_grade(&data, 70.0, 60.0, 64.0),
    ];
    (grades, vec![(intro, 101), (data, 102)])
}

pub fn service(
    pool: PgPool,
    crawler: Arc<FakeCrawler>,
    registry: Arc<FakeRegistry>,
) -> GradeService {
    GradeService::new(pool, crawler, registry)
}

pub async fn grade_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM grades")
        .fetch_one(pool)
        .await
        .unwrap()
}
