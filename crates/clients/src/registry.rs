//! Client for the course registry service.

use std::time::Duration;

use async_trait::async_trait;
use gradeshare_core::grade::{CourseKey, ResolvedCourse};
use gradeshare_core::types::DbId;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_success, ClientError};

const SERVICE: &str = "course registry";

/// Resolves course identity triples to internal course ids.
#[async_trait]
pub trait CourseRegistry: Send + Sync {
    /// Find the id of every submitted course, creating unknown ones.
    ///
    /// The answer is not guaranteed to follow the input order; callers
    /// match results by key.
    async fn resolve_or_create(
        &self,
        courses: &[CourseKey],
    ) -> Result<Vec<ResolvedCourse>, ClientError>;
}

#[derive(Serialize)]
struct ResolveRequest<'a> {
    courses: Vec<WireCourseRef<'a>>,
}

#[derive(Serialize)]
struct WireCourseRef<'a> {
    course_code: &'a str,
    name: &'a str,
    teacher: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResolveResponse {
    #[serde(default)]
    courses: Vec<WireCourse>,
}

#[derive(Debug, Deserialize)]
struct WireCourse {
    id: DbId,
    course_code: String,
    name: String,
    teacher: String,
}

impl From<WireCourse> for ResolvedCourse {
    fn from(wire: WireCourse) -> Self {
        ResolvedCourse {
            key: CourseKey {
                code: wire.course_code,
                name: wire.name,
                teacher: wire.teacher,
            },
            course_id: wire.id,
        }
    }
}

/// HTTP implementation of [`CourseRegistry`].
///
/// `POST {base_url}/courses/find-or-create` with `{ "courses": [...] }`.
pub struct HttpCourseRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCourseRegistry {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`] (shared connection pool).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CourseRegistry for HttpCourseRegistry {
    async fn resolve_or_create(
        &self,
        courses: &[CourseKey],
    ) -> Result<Vec<ResolvedCourse>, ClientError> {
        let request = ResolveRequest {
            courses: courses
                .iter()
                .map(|c| WireCourseRef {
                    course_code: &c.code,
                    name: &c.name,
                    teacher: &c.teacher,
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/courses/find-or-create", self.base_url))
            .json(&request)
            .send()
            .await?;

        let body: ResolveResponse = ensure_success(SERVICE, response).await?.json().await?;
        Ok(body.courses.into_iter().map(ResolvedCourse::from).collect())
    }
}
