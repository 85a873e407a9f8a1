use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gradeshare_api::config::ServerConfig;
use gradeshare_api::router::build_app_router;
use gradeshare_api::state::AppState;
use gradeshare_clients::{HttpCourseRegistry, HttpGradeCrawler};
use gradeshare_db::repositories::BusRepo;
use gradeshare_events::{Publisher, SHARE_GRADE_TOPIC};
use gradeshare_pipeline::GradeService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gradeshare_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = gradeshare_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    gradeshare_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    gradeshare_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Bus ---
    BusRepo::register_subscription(&pool, SHARE_GRADE_TOPIC, &config.consumer_group)
        .await
        .expect("Failed to register share subscription");
    let publisher = Publisher::new(pool.clone());

    // --- Service ---
    let client_timeout = Duration::from_secs(config.client_timeout_secs);
    let crawler = HttpGradeCrawler::new(&config.crawl_service_url, client_timeout)
        .expect("Failed to build crawl service client");
    let registry = HttpCourseRegistry::new(&config.course_service_url, client_timeout)
        .expect("Failed to build course registry client");
    let service = GradeService::new(pool.clone(), Arc::new(crawler), Arc::new(registry));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        service,
        publisher,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
