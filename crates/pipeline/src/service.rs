//! Grade sharing service.
//!
//! Owns the consent operations and the ingestion pipeline
//! (`share_grades`): consent check, crawl, course resolution, join and a
//! single-transaction bulk upsert. Collaborators are injected through
//! [`GradeService::new`].

use std::sync::Arc;

use gradeshare_clients::{CourseRegistry, GradeCrawler};
use gradeshare_core::types::DbId;
use gradeshare_db::models::grade::Grade;
use gradeshare_db::models::share_agreement::{ShareAgreement, SignOutcome};
use gradeshare_db::repositories::{GradeRepo, ShareAgreementRepo};
use gradeshare_db::DbPool;

use crate::error::ServiceError;
use crate::ingest;

/// What a successful `share_grades` run wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareSummary {
    /// Grades received from the crawl service and upserted.
    pub grades: usize,
    /// Distinct courses those grades belong to.
    pub courses: usize,
}

/// Grade sharing operations.
///
/// Cheap to clone; all state lives behind the pool and the shared clients.
#[derive(Clone)]
pub struct GradeService {
    pool: DbPool,
    crawler: Arc<dyn GradeCrawler>,
    registry: Arc<dyn CourseRegistry>,
}

impl GradeService {
    pub fn new(
        pool: DbPool,
        crawler: Arc<dyn GradeCrawler>,
        registry: Arc<dyn CourseRegistry>,
    ) -> Self {
        Self {
            pool,
            crawler,
            registry,
        }
    }

    /// Every shared grade recorded for a course.
    pub async fn get_grades_by_course(&self, course_id: DbId) -> Result<Vec<Grade>, ServiceError> {
        Ok(GradeRepo::list_by_course(&self.pool, course_id).await?)
    }

    /// Whether the user currently consents to sharing. No agreement means
    /// `false`.
    pub async fn is_signed(&self, uid: DbId) -> Result<bool, ServiceError> {
        Ok(ShareAgreementRepo::is_signed(&self.pool, uid).await?)
    }

    /// Sign (`true`) or cancel (`false`) the user's share agreement.
    ///
    /// Asking for the state the agreement is already in fails with
    /// [`ServiceError::RepeatSigned`] or [`ServiceError::RepeatCancelSigned`].
    pub async fn sign_for_sharing(
        &self,
        uid: DbId,
        wants_to_sign: bool,
    ) -> Result<ShareAgreement, ServiceError> {
        match ShareAgreementRepo::sign(&self.pool, uid, wants_to_sign).await? {
            SignOutcome::Applied(agreement) => {
                tracing::info!(uid, is_signed = agreement.is_signed, "Share agreement updated");
                Ok(agreement)
            }
            SignOutcome::Repeated(_) if wants_to_sign => Err(ServiceError::RepeatSigned),
            SignOutcome::Repeated(_) => Err(ServiceError::RepeatCancelSigned),
        }
    }

    /// Fetch the user's grades from the crawl service and store them.
    ///
    /// Nothing is fetched unless the user has signed. The whole grade set
    /// is written in one transaction, so a failure at any step leaves the
    /// stored grades as they were. No step is retried here.
    pub async fn share_grades(
        &self,
        uid: DbId,
        credential_id: &str,
        credential_secret: &str,
    ) -> Result<ShareSummary, ServiceError> {
        if !self.is_signed(uid).await? {
            return Err(ServiceError::NotSigned);
        }

        let raw = self
            .crawler
            .fetch_all_grades(credential_id, credential_secret)
            .await
            .map_err(ServiceError::Crawl)?;

        let keys = ingest::distinct_course_keys(&raw);
        if keys.is_empty() {
            tracing::info!(uid, "Crawl service returned no grades");
            return Ok(ShareSummary {
                grades: 0,
                courses: 0,
            });
        }

        let resolved = self
            .registry
            .resolve_or_create(&keys)
            .await
            .map_err(ServiceError::Registry)?;
        let course_ids = ingest::course_id_map(resolved);

        let grades = ingest::join_grades(uid, raw, &course_ids)?;
        GradeRepo::bulk_upsert(&self.pool, &grades).await?;

        let summary = ShareSummary {
            grades: grades.len(),
            courses: keys.len(),
        };
        tracing::info!(
            uid,
            grades = summary.grades,
            courses = summary.courses,
            "Shared grades stored"
        );
        Ok(summary)
    }
}
