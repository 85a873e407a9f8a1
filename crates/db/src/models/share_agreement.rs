//! Share agreement entity model.

use gradeshare_core::consent::{RepeatSignOperation, SignState};
use gradeshare_core::types::{DbId, EpochMillis};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `share_agreements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShareAgreement {
    pub id: DbId,
    pub uid: DbId,
    pub is_signed: bool,
    pub ctime: EpochMillis,
    pub utime: EpochMillis,
}

impl ShareAgreement {
    pub fn state(&self) -> SignState {
        SignState::from_stored(Some(self.is_signed))
    }
}

/// Result of a sign action against the `share_agreements` table.
#[derive(Debug, Clone)]
pub enum SignOutcome {
    /// The row was created or its flag flipped.
    Applied(ShareAgreement),
    /// The agreement already was in the requested state; nothing was written.
    Repeated(RepeatSignOperation),
}
