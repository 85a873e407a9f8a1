use std::str::FromStr;
use std::time::Duration;

use gradeshare_events::UPDATE_SHARED_GRADE_GROUP;

/// Tuning of the share-request consumer loop.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    /// Consumer group shared by every worker instance.
    pub consumer_group: String,
    /// Deadline for one pipeline run (default: 10 s).
    pub deadline: Duration,
    /// How often the bus is polled for new deliveries.
    pub poll_interval: Duration,
    /// Maximum pipeline runs in flight in this process.
    pub max_in_flight: usize,
    /// Attempts per delivery before it is parked as dead.
    pub max_attempts: i32,
    /// Base delay before a failed delivery is retried; grows linearly with
    /// the attempt number.
    pub retry_backoff: Duration,
    /// How long a claimed delivery stays hidden from the rest of the group.
    pub lease: Duration,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            consumer_group: UPDATE_SHARED_GRADE_GROUP.to_string(),
            deadline: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            max_in_flight: 16,
            max_attempts: 3,
            retry_backoff: Duration::from_secs(30),
            lease: Duration::from_secs(60),
        }
    }
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    /// Base URL of the campus grade crawl service.
    pub crawl_service_url: String,
    /// Base URL of the course registry service.
    pub course_service_url: String,
    /// Per-request timeout for both collaborator clients.
    pub client_timeout: Duration,
    pub consumer: ConsumerSettings,
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                  |
    /// |-----------------------------|--------------------------|
    /// | `DATABASE_URL`              | required                 |
    /// | `CRAWL_SERVICE_URL`         | `http://localhost:8081`  |
    /// | `COURSE_SERVICE_URL`        | `http://localhost:8082`  |
    /// | `CLIENT_TIMEOUT_SECS`       | `8`                      |
    /// | `CONSUMER_GROUP`            | `update_shared_grade`    |
    /// | `SHARE_DEADLINE_SECS`       | `10`                     |
    /// | `CONSUMER_POLL_INTERVAL_MS` | `500`                    |
    /// | `CONSUMER_MAX_IN_FLIGHT`    | `16`                     |
    /// | `CONSUMER_MAX_ATTEMPTS`     | `3`                      |
    /// | `CONSUMER_RETRY_BACKOFF_SECS` | `30`                   |
    /// | `CONSUMER_LEASE_SECS`       | `60`                     |
    ///
    /// Panics on a missing `DATABASE_URL` or an unparsable value; a
    /// misconfigured worker should not start.
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let defaults = ConsumerSettings::default();

        let consumer = ConsumerSettings {
            consumer_group: std::env::var("CONSUMER_GROUP").unwrap_or(defaults.consumer_group),
            deadline: Duration::from_secs(env_or("SHARE_DEADLINE_SECS", 10)),
            poll_interval: Duration::from_millis(env_or("CONSUMER_POLL_INTERVAL_MS", 500)),
            max_in_flight: env_or("CONSUMER_MAX_IN_FLIGHT", defaults.max_in_flight),
            max_attempts: env_or("CONSUMER_MAX_ATTEMPTS", defaults.max_attempts),
            retry_backoff: Duration::from_secs(env_or("CONSUMER_RETRY_BACKOFF_SECS", 30)),
            lease: Duration::from_secs(env_or("CONSUMER_LEASE_SECS", 60)),
        };

        Self {
            database_url,
            crawl_service_url: std::env::var("CRAWL_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8081".into()),
            course_service_url: std::env::var("COURSE_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8082".into()),
            client_timeout: Duration::from_secs(env_or("CLIENT_TIMEOUT_SECS", 8)),
            consumer,
        }
    }
}

/// Read and parse an environment variable, falling back to `default` when
/// it is unset.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| {
                panic!("{name} must be a valid {}: {e}", std::any::type_name::<T>())
            }),
        Err(_) => default,
    }
}
