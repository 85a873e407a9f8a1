use gradeshare_events::UPDATE_SHARED_GRADE_GROUP;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Base URL of the campus grade crawl service.
    pub crawl_service_url: String,
    /// Base URL of the course registry service.
    pub course_service_url: String,
    /// Per-request timeout for collaborator clients in seconds (default: `8`).
    pub client_timeout_secs: u64,
    /// Consumer group subscribed to share requests at startup, so requests
    /// accepted before any worker has run are still delivered.
    pub consumer_group: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                  |
    /// |------------------------|--------------------------|
    /// | `HOST`                 | `0.0.0.0`                |
    /// | `PORT`                 | `3000`                   |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                     |
    /// | `CRAWL_SERVICE_URL`    | `http://localhost:8081`  |
    /// | `COURSE_SERVICE_URL`   | `http://localhost:8082`  |
    /// | `CLIENT_TIMEOUT_SECS`  | `8`                      |
    /// | `CONSUMER_GROUP`       | `update_shared_grade`    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let client_timeout_secs: u64 = std::env::var("CLIENT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "8".into())
            .parse()
            .expect("CLIENT_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            request_timeout_secs,
            crawl_service_url: std::env::var("CRAWL_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8081".into()),
            course_service_url: std::env::var("COURSE_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8082".into()),
            client_timeout_secs,
            consumer_group: std::env::var("CONSUMER_GROUP")
                .unwrap_or_else(|_| UPDATE_SHARED_GRADE_GROUP.into()),
        }
    }
}
