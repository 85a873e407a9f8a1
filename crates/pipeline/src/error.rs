use gradeshare_clients::ClientError;
use gradeshare_core::error::CoreError;

/// Errors from [`GradeService`](crate::GradeService) operations.
///
/// The consent and precondition variants are user-facing and stay distinct
/// from collaborator and storage failures so callers can react to them
/// specifically.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Sign requested while the agreement is already signed.
    #[error("grade sharing is already signed")]
    RepeatSigned,

    /// Cancel requested while the agreement is not signed.
    #[error("grade sharing is already cancelled")]
    RepeatCancelSigned,

    /// Grades were requested for a user without an active agreement.
    #[error("grade sharing has not been signed")]
    NotSigned,

    /// The crawl service failed.
    #[error("crawl service failed: {0}")]
    Crawl(#[source] ClientError),

    /// The course registry failed.
    #[error("course registry failed: {0}")]
    Registry(#[source] ClientError),

    /// The course registry answered without an id for a submitted course.
    #[error("course registry returned no id for course {code:?} / {name:?} / {teacher:?}")]
    UnresolvedCourse {
        code: String,
        name: String,
        teacher: String,
    },

    /// A domain-level error, e.g. a malformed grade from the crawl service.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A storage error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    /// Whether running the same request again could succeed.
    ///
    /// Consent, precondition, credential and data-shape errors are
    /// deterministic; other collaborator and storage failures may be
    /// transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Crawl(ClientError::Authentication { .. }) => false,
            ServiceError::RepeatSigned
            | ServiceError::RepeatCancelSigned
            | ServiceError::NotSigned
            | ServiceError::UnresolvedCourse { .. }
            | ServiceError::Core(_) => false,
            ServiceError::Crawl(_) | ServiceError::Registry(_) | ServiceError::Database(_) => true,
        }
    }
}
