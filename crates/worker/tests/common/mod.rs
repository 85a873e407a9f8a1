//! Fixtures for driving `ShareGradeConsumer` against a real database.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gradeshare_clients::{ClientError, CourseRegistry, GradeCrawler};
use gradeshare_core::grade::{CourseKey, RawGrade, ResolvedCourse};
use gradeshare_db::models::bus::Delivery;
use gradeshare_db::repositories::{BusRepo, ShareAgreementRepo};
use gradeshare_events::{
    Publisher, ShareRequested, Subscription, SHARE_GRADE_TOPIC, UPDATE_SHARED_GRADE_GROUP,
};
use gradeshare_pipeline::GradeService;
use gradeshare_worker::{ConsumerSettings, ShareGradeConsumer};
use sqlx::PgPool;

/// Crawl stand-in: a fixed answer, optionally after a delay.
pub struct StubCrawler {
    pub grades: Vec<RawGrade>,
    pub delay: Option<Duration>,
}

#[async_trait]
impl GradeCrawler for StubCrawler {
    async fn fetch_all_grades(
        &self,
        _credential_id: &str,
        _credential_secret: &str,
    ) -> Result<Vec<RawGrade>, ClientError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.grades.clone())
    }
}

/// Registry stand-in: resolves every course to `101`, or fails with 503.
pub struct StubRegistry {
    pub available: bool,
}

#[async_trait]
impl CourseRegistry for StubRegistry {
    async fn resolve_or_create(
        &self,
        courses: &[CourseKey],
    ) -> Result<Vec<ResolvedCourse>, ClientError> {
        if !self.available {
            return Err(ClientError::Api {
                service: "course registry",
                status: 503,
                body: "down".into(),
            });
        }
        Ok(courses
            .iter()
            .map(|key| ResolvedCourse {
                key: key.clone(),
                course_id: 101,
            })
            .collect())
    }
}

pub fn one_grade() -> Vec<RawGrade> {
    vec![RawGrade {
        course_code: "CS101".into(),
        course_name: "Intro".into(),
        course_teacher: "Smith".into(),
        regular: 80.0,
        final_score: 90.0,
        total: 86.0,
        year: "2024".into(),
        term: "1".into(),
    }]
}

/// Consumer settings for tests: no backoff, short deadline.
pub fn test_settings() -> ConsumerSettings {
    ConsumerSettings {
        deadline: Duration::from_millis(500),
        poll_interval: Duration::from_millis(20),
        max_in_flight: 4,
        max_attempts: 3,
        retry_backoff: Duration::ZERO,
        lease: Duration::from_secs(30),
        ..Default::default()
    }
}

/// Register the consumer group and build a consumer over the stubs.
pub async fn consumer(
    pool: &PgPool,
    crawler: StubCrawler,
    registry: StubRegistry,
    settings: ConsumerSettings,
) -> ShareGradeConsumer {
    let subscription = Subscription::register(
        pool.clone(),
        SHARE_GRADE_TOPIC,
        UPDATE_SHARED_GRADE_GROUP,
        settings.lease,
    )
    .await
    .unwrap();
    let service = GradeService::new(pool.clone(), Arc::new(crawler), Arc::new(registry));
    ShareGradeConsumer::new(subscription, service, settings)
}

pub async fn sign(pool: &PgPool, uid: i64) {
    ShareAgreementRepo::sign(pool, uid, true).await.unwrap();
}

/// Publish a share request and return the message id.
pub async fn request_share(pool: &PgPool, uid: i64) -> i64 {
    Publisher::new(pool.clone())
        .publish(&ShareRequested {
            uid,
            credential_id: "2021212345".into(),
            credential_secret: "secret".into(),
        })
        .await
        .unwrap()
}

/// The `update_shared_grade` delivery of a message.
pub async fn delivery(pool: &PgPool, message_id: i64) -> Delivery {
    BusRepo::list_deliveries_for_message(pool, message_id)
        .await
        .unwrap()
        .into_iter()
        .find(|d| d.consumer_group == UPDATE_SHARED_GRADE_GROUP)
        .unwrap()
}

pub async fn grade_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM grades")
        .fetch_one(pool)
        .await
        .unwrap()
}
