//! Client for the campus grade crawl service.

use std::time::Duration;

use async_trait::async_trait;
use gradeshare_core::grade::RawGrade;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_success, ClientError};

const SERVICE: &str = "crawl service";

/// Fetches a student's complete grade list from the campus system.
#[async_trait]
pub trait GradeCrawler: Send + Sync {
    /// Log in with the student's campus credentials and return every grade.
    async fn fetch_all_grades(
        &self,
        credential_id: &str,
        credential_secret: &str,
    ) -> Result<Vec<RawGrade>, ClientError>;
}

#[derive(Serialize)]
struct FetchGradesRequest<'a> {
    student_id: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct FetchGradesResponse {
    #[serde(default)]
    grades: Vec<WireGrade>,
}

#[derive(Debug, Deserialize)]
struct WireGrade {
    course_code: String,
    course_name: String,
    course_teacher: String,
    regular: f64,
    #[serde(rename = "final")]
    final_score: f64,
    total: f64,
    year: String,
    term: String,
}

impl From<WireGrade> for RawGrade {
    fn from(wire: WireGrade) -> Self {
        RawGrade {
            course_code: wire.course_code,
            course_name: wire.course_name,
            course_teacher: wire.course_teacher,
            regular: wire.regular,
            final_score: wire.final_score,
            total: wire.total,
            year: wire.year,
            term: wire.term,
        }
    }
}

/// HTTP implementation of [`GradeCrawler`].
///
/// `POST {base_url}/grades` with `{ "student_id", "password" }`, answered by
/// `{ "grades": [...] }`.
pub struct HttpGradeCrawler {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGradeCrawler {
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
impl GradeCrawler for HttpGradeCrawler {
    async fn fetch_all_grades(
        &self,
        credential_id: &str,
        credential_secret: &str,
    ) -> Result<Vec<RawGrade>, ClientError> {
        let response = self
            .client
            .post(format!("{}/grades", self.base_url))
            .json(&FetchGradesRequest {
                student_id: credential_id,
                password: credential_secret,
            })
            .send()
            .await?;

        let body: FetchGradesResponse = ensure_success(SERVICE, response).await?.json().await?;
        tracing::debug!(count = body.grades.len(), "Crawl service returned grades");
        Ok(body.grades.into_iter().map(RawGrade::from).collect())
    }
}
