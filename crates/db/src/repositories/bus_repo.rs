//! Repository for the `bus_subscriptions`, `bus_messages` and
//! `bus_deliveries` tables.
//!
//! Publishing writes one message plus one pending delivery per consumer
//! group subscribed to the topic. Consumers claim deliveries with
//! `SELECT ... FOR UPDATE SKIP LOCKED`, so several instances of one group
//! never hold the same delivery at once. A claim carries a lease; a
//! delivery whose lease ran out becomes claimable again.

use gradeshare_core::types::{now_millis, DbId, EpochMillis};
use sqlx::PgPool;

use crate::models::bus::{ClaimedDelivery, Delivery, DeliveryStatus};

/// Column list for the `bus_deliveries` table.
const DELIVERY_COLUMNS: &str = "id, message_id, consumer_group, status, attempts, available_at, \
                                lease_until, last_error, ctime, utime";

/// Provides data access for the durable message bus.
pub struct BusRepo;

impl BusRepo {
    /// Subscribe a consumer group to a topic. Idempotent.
    ///
    /// Only messages published after the subscription exists are delivered
    /// to the group.
    pub async fn register_subscription(
        pool: &PgPool,
        topic: &str,
        consumer_group: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO bus_subscriptions (topic, consumer_group, ctime) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (topic, consumer_group) DO NOTHING",
        )
        .bind(topic)
        .bind(consumer_group)
        .bind(now_millis())
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Store a message and fan it out to every subscribed group.
    ///
    /// Returns the message id and the number of deliveries created.
    pub async fn publish(
        pool: &PgPool,
        topic: &str,
        message_key: Option<&str>,
        payload: &serde_json::Value,
    ) -> Result<(DbId, u64), sqlx::Error> {
        let now = now_millis();
        let mut tx = pool.begin().await?;

        let message_id: DbId = sqlx::query_scalar(
            "INSERT INTO bus_messages (topic, message_key, payload, ctime) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(topic)
        .bind(message_key)
        .bind(payload)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let fanned_out = sqlx::query(
            "INSERT INTO bus_deliveries \
                (message_id, consumer_group, status, attempts, available_at, ctime, utime) \
             SELECT $1, consumer_group, 'pending', 0, $3, $3, $3 \
             FROM bus_subscriptions \
             WHERE topic = $2",
        )
        .bind(message_id)
        .bind(topic)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok((message_id, fanned_out))
    }

    /// Atomically claim up to `limit` deliveries for a consumer group.
    ///
    /// Claimable means pending and due, or claimed with an expired lease.
    /// Each claimed delivery has its attempt counter incremented and holds a
    /// lease until `now + lease_ms`. Results are ordered by delivery id.
    pub async fn claim(
        pool: &PgPool,
        topic: &str,
        consumer_group: &str,
        limit: i64,
        lease_ms: i64,
    ) -> Result<Vec<ClaimedDelivery>, sqlx::Error> {
        let now = now_millis();
        let mut claimed = sqlx::query_as::<_, ClaimedDelivery>(
            "UPDATE bus_deliveries d \
             SET status = 'claimed', \
                 attempts = d.attempts + 1, \
                 lease_until = $4, \
                 utime = $3 \
             FROM bus_messages m \
             WHERE m.id = d.message_id \
               AND d.id IN ( \
                 SELECT d2.id FROM bus_deliveries d2 \
                 JOIN bus_messages m2 ON m2.id = d2.message_id \
                 WHERE d2.consumer_group = $2 \
                   AND m2.topic = $1 \
                   AND ((d2.status = 'pending' AND d2.available_at <= $3) \
                     OR (d2.status = 'claimed' AND d2.lease_until < $3)) \
                 ORDER BY d2.id \
                 LIMIT $5 \
                 FOR UPDATE OF d2 SKIP LOCKED \
               ) \
             RETURNING d.id, d.message_id, m.topic, m.message_key, m.payload, d.attempts",
        )
        .bind(topic)
        .bind(consumer_group)
        .bind(now)
        .bind(now + lease_ms)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        claimed.sort_by_key(|d| d.id);
        Ok(claimed)
    }

    /// Mark a claimed delivery as processed.
    ///
    /// `attempt` is the attempt number returned by [`BusRepo::claim`]; it
    /// fences off a consumer whose lease expired and was taken over. Returns
    /// `false` when the claim was lost.
    pub async fn ack(pool: &PgPool, delivery_id: DbId, attempt: i32) -> Result<bool, sqlx::Error> {
        Self::settle(pool, delivery_id, attempt, DeliveryStatus::Done, None, None).await
    }

    /// Return a claimed delivery to the queue, due again at `available_at`.
    pub async fn retry(
        pool: &PgPool,
        delivery_id: DbId,
        attempt: i32,
        available_at: EpochMillis,
        error: &str,
    ) -> Result<bool, sqlx::Error> {
        Self::settle(
            pool,
            delivery_id,
            attempt,
            DeliveryStatus::Pending,
            Some(available_at),
            Some(error),
        )
        .await
    }

    /// Park a claimed delivery permanently.
    pub async fn dead(
        pool: &PgPool,
        delivery_id: DbId,
        attempt: i32,
        error: &str,
    ) -> Result<bool, sqlx::Error> {
        Self::settle(
            pool,
            delivery_id,
            attempt,
            DeliveryStatus::Dead,
            None,
            Some(error),
        )
        .await
    }

    /// Find a single delivery by id.
    pub async fn find_delivery(
        pool: &PgPool,
        delivery_id: DbId,
    ) -> Result<Option<Delivery>, sqlx::Error> {
        let query = format!("SELECT {DELIVERY_COLUMNS} FROM bus_deliveries WHERE id = $1");
        sqlx::query_as::<_, Delivery>(&query)
            .bind(delivery_id)
            .fetch_optional(pool)
            .await
    }

    /// List the deliveries created for a message, one per subscribed group.
    pub async fn list_deliveries_for_message(
        pool: &PgPool,
        message_id: DbId,
    ) -> Result<Vec<Delivery>, sqlx::Error> {
        let query = format!(
            "SELECT {DELIVERY_COLUMNS} FROM bus_deliveries \
             WHERE message_id = $1 \
             ORDER BY consumer_group"
        );
        sqlx::query_as::<_, Delivery>(&query)
            .bind(message_id)
            .fetch_all(pool)
            .await
    }

    /// Count a group's deliveries in the given status.
    pub async fn count_by_status(
        pool: &PgPool,
        consumer_group: &str,
        status: DeliveryStatus,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM bus_deliveries WHERE consumer_group = $1 AND status = $2",
        )
        .bind(consumer_group)
        .bind(status.as_str())
        .fetch_one(pool)
        .await
    }

    // ---- private helpers ----

    /// Move a claimed delivery to its next status, releasing the lease.
    async fn settle(
        pool: &PgPool,
        delivery_id: DbId,
        attempt: i32,
        status: DeliveryStatus,
        available_at: Option<EpochMillis>,
        error: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE bus_deliveries \
             SET status = $2, \
                 available_at = COALESCE($3, available_at), \
                 last_error = COALESCE($4, last_error), \
                 lease_until = NULL, \
                 utime = $5 \
             WHERE id = $1 AND status = 'claimed' AND attempts = $6",
        )
        .bind(delivery_id)
        .bind(status.as_str())
        .bind(available_at)
        .bind(error)
        .bind(now_millis())
        .bind(attempt)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
