#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use gradeshare_api::config::ServerConfig;
use gradeshare_api::router::build_app_router;
use gradeshare_api::state::AppState;
use gradeshare_clients::{ClientError, CourseRegistry, GradeCrawler};
use gradeshare_core::grade::{CourseKey, RawGrade, ResolvedCourse};
use gradeshare_db::repositories::BusRepo;
use gradeshare_events::{Publisher, SHARE_GRADE_TOPIC, UPDATE_SHARED_GRADE_GROUP};
use gradeshare_pipeline::GradeService;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Collaborators the HTTP handlers must never reach; the API only
/// publishes share requests.
struct Unreachable;

#[async_trait]
impl GradeCrawler for Unreachable {
    async fn fetch_all_grades(
        &self,
        _credential_id: &str,
        _credential_secret: &str,
    ) -> Result<Vec<RawGrade>, ClientError> {
        panic!("the API must not call the crawl service")
    }
}

#[async_trait]
impl CourseRegistry for Unreachable {
    async fn resolve_or_create(
        &self,
        _courses: &[CourseKey],
    ) -> Result<Vec<ResolvedCourse>, ClientError> {
        panic!("the API must not call the course registry")
    }
}

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 30,
        crawl_service_url: "http://crawl.invalid".to_string(),
        course_service_url: "http://courses.invalid".to_string(),
        client_timeout_secs: 1,
        consumer_group: UPDATE_SHARED_GRADE_GROUP.to_string(),
    }
}

/// Build the full application router over `pool`, with the share consumer
/// group subscribed.
pub async fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    BusRepo::register_subscription(&pool, SHARE_GRADE_TOPIC, &config.consumer_group)
        .await
        .unwrap();

    let unreachable = Arc::new(Unreachable);
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        service: GradeService::new(pool.clone(), unreachable.clone(), unreachable),
        publisher: Publisher::new(pool),
    };
    build_app_router(state, &config)
}

pub async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::PUT, uri, body).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::POST, uri, body).await
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
