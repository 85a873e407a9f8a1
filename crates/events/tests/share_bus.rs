//! Integration tests for publishing and consuming `ShareRequested` events.

use std::time::Duration;

use gradeshare_db::models::bus::DeliveryStatus;
use gradeshare_db::repositories::BusRepo;
use gradeshare_events::{
    Publisher, ShareRequested, Subscription, SHARE_GRADE_TOPIC, UPDATE_SHARED_GRADE_GROUP,
};
use sqlx::PgPool;

const LEASE: Duration = Duration::from_secs(60);

fn request(uid: i64) -> ShareRequested {
    ShareRequested {
        uid,
        credential_id: format!("student-{uid}"),
        credential_secret: "secret".to_string(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_published_event_reaches_subscribed_group(pool: PgPool) {
    let subscription = Subscription::register(
        pool.clone(),
        SHARE_GRADE_TOPIC,
        UPDATE_SHARED_GRADE_GROUP,
        LEASE,
    )
    .await
    .unwrap();
    let publisher = Publisher::new(pool.clone());

    publisher.publish(&request(7)).await.unwrap();

    let deliveries = subscription.claim(10).await.unwrap();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].topic, SHARE_GRADE_TOPIC);
    assert_eq!(deliveries[0].message_key.as_deref(), Some("7"));

    let event = ShareRequested::decode(&deliveries[0].payload).unwrap();
    assert_eq!(event, request(7));

    subscription.ack(&deliveries[0]).await.unwrap();
    let done = BusRepo::count_by_status(&pool, UPDATE_SHARED_GRADE_GROUP, DeliveryStatus::Done)
        .await
        .unwrap();
    assert_eq!(done, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_group_members_split_deliveries(pool: PgPool) {
    let first = Subscription::register(pool.clone(), SHARE_GRADE_TOPIC, "workers", LEASE)
        .await
        .unwrap();
    let second = Subscription::register(pool.clone(), SHARE_GRADE_TOPIC, "workers", LEASE)
        .await
        .unwrap();
    let publisher = Publisher::new(pool.clone());
    for uid in 1..=3 {
        publisher.publish(&request(uid)).await.unwrap();
    }

    let a = first.claim(2).await.unwrap();
    let b = second.claim(10).await.unwrap();

    assert_eq!(a.len(), 2);
    assert_eq!(b.len(), 1);
    assert!(a.iter().all(|d| d.id != b[0].id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_event_before_subscription_is_not_delivered(pool: PgPool) {
    let publisher = Publisher::new(pool.clone());
    publisher.publish(&request(7)).await.unwrap();

    let late = Subscription::register(pool.clone(), SHARE_GRADE_TOPIC, "late_group", LEASE)
        .await
        .unwrap();
    assert!(late.claim(10).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_retry_delays_redelivery(pool: PgPool) {
    let subscription = Subscription::register(pool.clone(), SHARE_GRADE_TOPIC, "workers", LEASE)
        .await
        .unwrap();
    Publisher::new(pool.clone())
        .publish(&request(7))
        .await
        .unwrap();

    let delivery = subscription.claim(1).await.unwrap().remove(0);
    subscription
        .retry(&delivery, Duration::from_secs(3600), "registry unavailable")
        .await
        .unwrap();
    assert!(subscription.claim(1).await.unwrap().is_empty());

    subscription
        .retry(&delivery, Duration::ZERO, "ignored, claim already settled")
        .await
        .unwrap();
    let stored = BusRepo::find_delivery(&pool, delivery.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.last_error.as_deref(), Some("registry unavailable"));
}
