//! Bus message and delivery models.

use gradeshare_core::types::{DbId, EpochMillis};
use serde::Serialize;
use sqlx::FromRow;

/// Lifecycle of a delivery row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Claimed,
    Done,
    Dead,
}

impl DeliveryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Claimed => "claimed",
            DeliveryStatus::Done => "done",
            DeliveryStatus::Dead => "dead",
        }
    }
}

/// A delivery claimed by a consumer, joined with its message.
#[derive(Debug, Clone, FromRow)]
pub struct ClaimedDelivery {
    pub id: DbId,
    pub message_id: DbId,
    pub topic: String,
    pub message_key: Option<String>,
    pub payload: serde_json::Value,
    /// Delivery attempts including this one.
    pub attempts: i32,
}

/// A row from the `bus_deliveries` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Delivery {
    pub id: DbId,
    pub message_id: DbId,
    pub consumer_group: String,
    pub status: String,
    pub attempts: i32,
    pub available_at: EpochMillis,
    pub lease_until: Option<EpochMillis>,
    pub last_error: Option<String>,
    pub ctime: EpochMillis,
    pub utime: EpochMillis,
}
