//! The "share requested" event.

use std::fmt;

use gradeshare_core::types::DbId;
use serde::{Deserialize, Serialize};

use crate::BusEvent;

/// Topic carrying [`ShareRequested`] events.
pub const SHARE_GRADE_TOPIC: &str = "share_grade_event";

/// Consumer group of the workers that refresh shared grades.
pub const UPDATE_SHARED_GRADE_GROUP: &str = "update_shared_grade";

/// A user asked for their grades to be fetched and stored.
///
/// Carries the campus credentials the crawl service logs in with. `Debug`
/// redacts the secret so the event can be logged.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRequested {
    pub uid: DbId,
    pub credential_id: String,
    pub credential_secret: String,
}

impl ShareRequested {
    /// Decode an event from a delivery payload.
    pub fn decode(payload: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(payload)
    }
}

impl BusEvent for ShareRequested {
    const TOPIC: &'static str = SHARE_GRADE_TOPIC;

    fn key(&self) -> Option<String> {
        Some(self.uid.to_string())
    }
}

impl fmt::Debug for ShareRequested {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareRequested")
            .field("uid", &self.uid)
            .field("credential_id", &self.credential_id)
            .field("credential_secret", &"<redacted>")
            .finish()
    }
}
