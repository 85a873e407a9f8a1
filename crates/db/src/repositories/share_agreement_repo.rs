//! Repository for the `share_agreements` table.

use gradeshare_core::consent::SignState;
use gradeshare_core::types::{now_millis, DbId};
use sqlx::PgPool;

use crate::models::share_agreement::{ShareAgreement, SignOutcome};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, uid, is_signed, ctime, utime";

/// Provides data access for per-user grade sharing consent.
pub struct ShareAgreementRepo;

impl ShareAgreementRepo {
    /// Find a user's agreement row, if one was ever created.
    pub async fn find_by_uid(
        pool: &PgPool,
        uid: DbId,
    ) -> Result<Option<ShareAgreement>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM share_agreements WHERE uid = $1");
        sqlx::query_as::<_, ShareAgreement>(&query)
            .bind(uid)
            .fetch_optional(pool)
            .await
    }

    /// Whether the user currently consents to sharing. No row means `false`.
    pub async fn is_signed(pool: &PgPool, uid: DbId) -> Result<bool, sqlx::Error> {
        let flag: Option<bool> =
            sqlx::query_scalar("SELECT is_signed FROM share_agreements WHERE uid = $1")
                .bind(uid)
                .fetch_optional(pool)
                .await?;
        Ok(SignState::from_stored(flag).is_signed())
    }

    /// Apply a sign action inside one transaction.
    ///
    /// An existing row is locked before the state check. Two first-ever
    /// sign actions for the same user can still race on the insert; the
    /// loser surfaces as a unique violation on `uq_share_agreements_uid`.
    pub async fn sign(
        pool: &PgPool,
        uid: DbId,
        wants_to_sign: bool,
    ) -> Result<SignOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let select = format!("SELECT {COLUMNS} FROM share_agreements WHERE uid = $1 FOR UPDATE");
        let existing = sqlx::query_as::<_, ShareAgreement>(&select)
            .bind(uid)
            .fetch_optional(&mut *tx)
            .await?;

        let current = SignState::from_stored(existing.as_ref().map(|a| a.is_signed));
        let target = match current.transition(wants_to_sign) {
            Ok(target) => target,
            Err(repeat) => return Ok(SignOutcome::Repeated(repeat)),
        };

        let now = now_millis();
        let agreement = if existing.is_some() {
            let query = format!(
                "UPDATE share_agreements SET is_signed = $2, utime = $3 \
                 WHERE uid = $1 \
                 RETURNING {COLUMNS}"
            );
            sqlx::query_as::<_, ShareAgreement>(&query)
                .bind(uid)
                .bind(target.is_signed())
                .bind(now)
                .fetch_one(&mut *tx)
                .await?
        } else {
            let query = format!(
                "INSERT INTO share_agreements (uid, is_signed, ctime, utime) \
                 VALUES ($1, $2, $3, $3) \
                 RETURNING {COLUMNS}"
            );
            sqlx::query_as::<_, ShareAgreement>(&query)
                .bind(uid)
                .bind(target.is_signed())
                .bind(now)
                .fetch_one(&mut *tx)
                .await?
        };

        tx.commit().await?;
        Ok(SignOutcome::Applied(agreement))
    }
}
