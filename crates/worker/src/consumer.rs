//! Share-request consumer.
//!
//! Polls the `update_shared_grade` group's deliveries every
//! `poll_interval`, runs [`GradeService::share_grades`] for each one under a
//! deadline, and settles the delivery from the outcome:
//!
//! - success: ack
//! - undecodable payload, consent or data-shape failure: dead
//! - collaborator, storage or deadline failure: retry with linear backoff,
//!   dead once `max_attempts` is reached
//!
//! At most `max_in_flight` pipeline runs execute at once. A failure to claim
//! from the bus ends the loop with an error.

use std::sync::Arc;
use std::time::Duration;

use gradeshare_db::models::bus::ClaimedDelivery;
use gradeshare_events::{BusError, ShareRequested, Subscription};
use gradeshare_pipeline::{GradeService, ServiceError, ShareSummary};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ConsumerSettings;

/// Why handling one delivery failed.
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    /// The payload is not a `ShareRequested` event.
    #[error("malformed share request payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// The pipeline did not finish in time.
    #[error("share pipeline exceeded its {}ms deadline", .0.as_millis())]
    DeadlineExceeded(Duration),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl HandleError {
    pub fn is_retryable(&self) -> bool {
        match self {
            HandleError::Decode(_) => false,
            HandleError::DeadlineExceeded(_) => true,
            HandleError::Service(e) => e.is_retryable(),
        }
    }
}

/// How a handled delivery is settled on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    Retry { delay: Duration, error: String },
    Dead { error: String },
}

impl Disposition {
    /// Settlement for the outcome of attempt number `attempt`.
    pub fn for_outcome(
        outcome: &Result<ShareSummary, HandleError>,
        attempt: i32,
        settings: &ConsumerSettings,
    ) -> Self {
        match outcome {
            Ok(_) => Disposition::Ack,
            Err(e) if e.is_retryable() && attempt < settings.max_attempts => {
                let factor = u32::try_from(attempt.max(1)).unwrap_or(1);
                Disposition::Retry {
                    delay: settings.retry_backoff.saturating_mul(factor),
                    error: e.to_string(),
                }
            }
            Err(e) => Disposition::Dead {
                error: e.to_string(),
            },
        }
    }
}

/// Consumer of `ShareRequested` events.
#[derive(Clone)]
pub struct ShareGradeConsumer {
    subscription: Subscription,
    service: GradeService,
    settings: Arc<ConsumerSettings>,
}

impl ShareGradeConsumer {
    pub fn new(
        subscription: Subscription,
        service: GradeService,
        settings: ConsumerSettings,
    ) -> Self {
        Self {
            subscription,
            service,
            settings: Arc::new(settings),
        }
    }

    /// Run the consumer loop until the cancellation token is triggered.
    ///
    /// On cancellation, in-flight runs are awaited (each is bounded by the
    /// deadline) before returning. A bus failure while claiming is returned
    /// as an error after the in-flight runs settle.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), BusError> {
        let mut ticker = tokio::time::interval(self.settings.poll_interval);
        let mut in_flight: JoinSet<()> = JoinSet::new();
        tracing::info!(
            topic = self.subscription.topic(),
            consumer_group = self.subscription.consumer_group(),
            poll_interval_ms = self.settings.poll_interval.as_millis() as u64,
            max_in_flight = self.settings.max_in_flight,
            "Share consumer started",
        );

        let result = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Share consumer shutting down");
                    break Ok(());
                }
                _ = ticker.tick() => {
                    reap(&mut in_flight);
                    let free = self.settings.max_in_flight.saturating_sub(in_flight.len());
                    if free == 0 {
                        continue;
                    }
                    match self.subscription.claim(free).await {
                        Ok(deliveries) => {
                            for delivery in deliveries {
                                let consumer = self.clone();
                                in_flight.spawn(async move { consumer.handle(delivery).await });
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Claiming share deliveries failed");
                            break Err(e);
                        }
                    }
                }
            }
        };

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Share task panicked");
            }
        }
        result
    }

    /// Claim up to `max_in_flight` deliveries and handle them concurrently,
    /// returning once all are settled.
    ///
    /// Returns the number of deliveries handled.
    pub async fn poll_once(&self) -> Result<usize, BusError> {
        let deliveries = self.subscription.claim(self.settings.max_in_flight).await?;
        let count = deliveries.len();

        let mut batch = JoinSet::new();
        for delivery in deliveries {
            let consumer = self.clone();
            batch.spawn(async move { consumer.handle(delivery).await });
        }
        while let Some(joined) = batch.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Share task panicked");
            }
        }
        Ok(count)
    }

    /// Handle and settle one delivery. Settlement failures are logged; the
    /// lease expiry hands the delivery out again.
    async fn handle(&self, delivery: ClaimedDelivery) {
        let span = tracing::info_span!(
            "share_delivery",
            delivery_id = delivery.id,
            message_id = delivery.message_id,
            attempt = delivery.attempts,
        );

        async {
            let outcome = self.process(&delivery.payload).await;
            let disposition = Disposition::for_outcome(&outcome, delivery.attempts, &self.settings);

            let settled = match &disposition {
                Disposition::Ack => {
                    if let Ok(summary) = &outcome {
                        tracing::info!(grades = summary.grades, "Share request completed");
                    }
                    self.subscription.ack(&delivery).await
                }
                Disposition::Retry { delay, error } => {
                    tracing::warn!(
                        error = %error,
                        retry_in_ms = delay.as_millis() as u64,
                        "Share request failed; will retry",
                    );
                    self.subscription.retry(&delivery, *delay, error).await
                }
                Disposition::Dead { error } => {
                    tracing::error!(error = %error, "Share request failed permanently");
                    self.subscription.dead(&delivery, error).await
                }
            };

            if let Err(e) = settled {
                tracing::error!(error = %e, "Failed to settle share delivery");
            }
        }
        .instrument(span)
        .await
    }

    /// Decode the event and run the pipeline under the deadline.
    async fn process(&self, payload: &serde_json::Value) -> Result<ShareSummary, HandleError> {
        let event = ShareRequested::decode(payload).map_err(HandleError::Decode)?;
        tracing::debug!(?event, "Share request received");

        let deadline = self.settings.deadline;
        let summary = tokio::time::timeout(
            deadline,
            self.service.share_grades(
                event.uid,
                &event.credential_id,
                &event.credential_secret,
            ),
        )
        .await
        .map_err(|_| HandleError::DeadlineExceeded(deadline))??;
        Ok(summary)
    }
}

/// Collect finished tasks so `JoinSet::len` counts only running ones.
fn reap(in_flight: &mut JoinSet<()>) {
    while let Some(joined) = in_flight.try_join_next() {
        if let Err(e) = joined {
            tracing::error!(error = %e, "Share task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use gradeshare_clients::ClientError;

    use super::*;

    fn settings() -> ConsumerSettings {
        ConsumerSettings {
            max_attempts: 3,
            retry_backoff: Duration::from_secs(10),
            ..Default::default()
        }
    }

    fn unavailable() -> HandleError {
        HandleError::Service(ServiceError::Registry(ClientError::Api {
            service: "course registry",
            status: 503,
            body: String::new(),
        }))
    }

    #[test]
    fn success_is_acked() {
        let outcome = Ok(ShareSummary {
            grades: 2,
            courses: 2,
        });
        assert_eq!(Disposition::for_outcome(&outcome, 1, &settings()), Disposition::Ack);
    }

    #[test]
    fn transient_failure_backs_off_linearly() {
        let outcome = Err(unavailable());
        assert_matches!(
            Disposition::for_outcome(&outcome, 1, &settings()),
            Disposition::Retry { delay, .. } if delay == Duration::from_secs(10)
        );
        assert_matches!(
            Disposition::for_outcome(&outcome, 2, &settings()),
            Disposition::Retry { delay, .. } if delay == Duration::from_secs(20)
        );
    }

    #[test]
    fn transient_failure_goes_dead_on_last_attempt() {
        let outcome = Err(unavailable());
        assert_matches!(
            Disposition::for_outcome(&outcome, 3, &settings()),
            Disposition::Dead { .. }
        );
    }

    #[test]
    fn deadline_is_retryable() {
        let outcome = Err(HandleError::DeadlineExceeded(Duration::from_secs(10)));
        assert_matches!(
            Disposition::for_outcome(&outcome, 1, &settings()),
            Disposition::Retry { error, .. } if error.contains("10000ms")
        );
    }

    #[test]
    fn deterministic_failures_go_dead_immediately() {
        let not_signed = Err(HandleError::Service(ServiceError::NotSigned));
        assert_matches!(
            Disposition::for_outcome(&not_signed, 1, &settings()),
            Disposition::Dead { .. }
        );

        let bad_credentials = Err(HandleError::Service(ServiceError::Crawl(
            ClientError::Authentication {
                service: "crawl service",
                status: 401,
            },
        )));
        assert_matches!(
            Disposition::for_outcome(&bad_credentials, 1, &settings()),
            Disposition::Dead { .. }
        );

        let malformed = serde_json::from_str::<ShareRequested>("{}").unwrap_err();
        assert_matches!(
            Disposition::for_outcome(&Err(HandleError::Decode(malformed)), 1, &settings()),
            Disposition::Dead { .. }
        );
    }
}
