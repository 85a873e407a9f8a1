//! Consuming side of the bus.

use std::time::Duration;

use gradeshare_core::types::now_millis;
use gradeshare_db::models::bus::ClaimedDelivery;
use gradeshare_db::repositories::BusRepo;
use gradeshare_db::DbPool;

use crate::error::BusError;

/// One consumer group's subscription to a topic.
///
/// Every instance of the same group shares the delivery stream; each
/// delivery is held by at most one instance at a time.
#[derive(Clone)]
pub struct Subscription {
    pool: DbPool,
    topic: String,
    consumer_group: String,
    lease: Duration,
}

impl Subscription {
    /// Register `consumer_group` on `topic` and return the subscription.
    ///
    /// `lease` bounds how long a claimed delivery stays invisible to the
    /// rest of the group; it must exceed the handler's own deadline.
    pub async fn register(
        pool: DbPool,
        topic: impl Into<String>,
        consumer_group: impl Into<String>,
        lease: Duration,
    ) -> Result<Self, BusError> {
        let topic = topic.into();
        let consumer_group = consumer_group.into();
        BusRepo::register_subscription(&pool, &topic, &consumer_group).await?;
        tracing::info!(%topic, %consumer_group, "Subscription registered");
        Ok(Self {
            pool,
            topic,
            consumer_group,
            lease,
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn consumer_group(&self) -> &str {
        &self.consumer_group
    }

    /// Claim up to `limit` due deliveries.
    pub async fn claim(&self, limit: usize) -> Result<Vec<ClaimedDelivery>, BusError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let lease_ms = i64::try_from(self.lease.as_millis()).unwrap_or(i64::MAX / 2);
        let claimed =
            BusRepo::claim(&self.pool, &self.topic, &self.consumer_group, limit, lease_ms).await?;
        Ok(claimed)
    }

    /// Mark a delivery processed.
    pub async fn ack(&self, delivery: &ClaimedDelivery) -> Result<(), BusError> {
        let settled = BusRepo::ack(&self.pool, delivery.id, delivery.attempts).await?;
        self.warn_if_lost(delivery, settled);
        Ok(())
    }

    /// Hand a delivery back to the group after `delay`.
    pub async fn retry(
        &self,
        delivery: &ClaimedDelivery,
        delay: Duration,
        error: &str,
    ) -> Result<(), BusError> {
        let delay_ms = i64::try_from(delay.as_millis()).unwrap_or(i64::MAX / 2);
        let available_at = now_millis().saturating_add(delay_ms);
        let settled =
            BusRepo::retry(&self.pool, delivery.id, delivery.attempts, available_at, error)
                .await?;
        self.warn_if_lost(delivery, settled);
        Ok(())
    }

    /// Park a delivery for good; it will not be handed out again.
    pub async fn dead(&self, delivery: &ClaimedDelivery, error: &str) -> Result<(), BusError> {
        let settled = BusRepo::dead(&self.pool, delivery.id, delivery.attempts, error).await?;
        self.warn_if_lost(delivery, settled);
        Ok(())
    }

    fn warn_if_lost(&self, delivery: &ClaimedDelivery, settled: bool) {
        if !settled {
            tracing::warn!(
                delivery_id = delivery.id,
                attempt = delivery.attempts,
                consumer_group = %self.consumer_group,
                "Delivery lease expired before settlement; another consumer owns it now"
            );
        }
    }
}
