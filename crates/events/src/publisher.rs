//! Publishing side of the bus.

use gradeshare_core::types::DbId;
use gradeshare_db::repositories::BusRepo;
use gradeshare_db::DbPool;

use crate::error::BusError;
use crate::BusEvent;

/// Publishes events onto the durable bus.
///
/// Cheap to clone; holds only the pool handle.
#[derive(Clone)]
pub struct Publisher {
    pool: DbPool,
}

impl Publisher {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Store `event` on its topic and fan it out to the subscribed groups.
    ///
    /// Returns the message id. Once this returns, delivery no longer depends
    /// on the publisher.
    pub async fn publish<E: BusEvent>(&self, event: &E) -> Result<DbId, BusError> {
        let payload = serde_json::to_value(event)?;
        let key = event.key();
        let (message_id, fanned_out) =
            BusRepo::publish(&self.pool, E::TOPIC, key.as_deref(), &payload).await?;

        if fanned_out == 0 {
            tracing::warn!(
                topic = E::TOPIC,
                message_id,
                "Event published with no subscribed consumer group"
            );
        } else {
            tracing::debug!(topic = E::TOPIC, message_id, fanned_out, "Event published");
        }
        Ok(message_id)
    }
}
