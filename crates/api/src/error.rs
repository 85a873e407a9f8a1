use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gradeshare_core::error::CoreError;
use gradeshare_events::BusError;
use gradeshare_pipeline::ServiceError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce `{ "error", "code" }` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `gradeshare_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A grade sharing operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Publishing onto the bus failed.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

type Classified = (StatusCode, &'static str, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Service(service) => classify_service_error(service),
            AppError::Bus(BusError::Database(err)) => classify_sqlx_error(err),
            AppError::Bus(BusError::Encode(err)) => {
                tracing::error!(error = %err, "Failed to encode bus event");
                internal()
            }
            AppError::Database(err) => classify_sqlx_error(err),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

fn internal() -> Classified {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

fn classify_core_error(err: &CoreError) -> Classified {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            internal()
        }
    }
}

/// Consent errors keep their own codes; collaborator failures map to 502.
fn classify_service_error(err: &ServiceError) -> Classified {
    match err {
        ServiceError::RepeatSigned => (StatusCode::CONFLICT, "REPEAT_SIGNING", err.to_string()),
        ServiceError::RepeatCancelSigned => (
            StatusCode::CONFLICT,
            "REPEAT_CANCEL_SIGNING",
            err.to_string(),
        ),
        ServiceError::NotSigned => (
            StatusCode::PRECONDITION_FAILED,
            "NOT_SIGNED",
            err.to_string(),
        ),
        ServiceError::Crawl(_)
        | ServiceError::Registry(_)
        | ServiceError::UnresolvedCourse { .. } => {
            tracing::warn!(error = %err, "Collaborator failure");
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", err.to_string())
        }
        ServiceError::Core(core) => classify_core_error(core),
        ServiceError::Database(db) => classify_sqlx_error(db),
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> Classified {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            internal()
        }
    }
}
