use std::sync::Arc;

use anyhow::Context;
use gradeshare_clients::{HttpCourseRegistry, HttpGradeCrawler};
use gradeshare_events::{Subscription, SHARE_GRADE_TOPIC};
use gradeshare_pipeline::GradeService;
use gradeshare_worker::{ShareGradeConsumer, WorkerConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gradeshare_worker=debug,gradeshare_pipeline=debug,gradeshare_events=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = WorkerConfig::from_env();
    tracing::info!(
        consumer_group = %config.consumer.consumer_group,
        deadline_ms = config.consumer.deadline.as_millis() as u64,
        max_in_flight = config.consumer.max_in_flight,
        "Loaded worker configuration",
    );

    // --- Database ---
    let pool = gradeshare_db::create_pool(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    gradeshare_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    gradeshare_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    // --- Collaborators ---
    let crawler = HttpGradeCrawler::new(&config.crawl_service_url, config.client_timeout)
        .context("Failed to build crawl service client")?;
    let registry = HttpCourseRegistry::new(&config.course_service_url, config.client_timeout)
        .context("Failed to build course registry client")?;
    let service = GradeService::new(pool.clone(), Arc::new(crawler), Arc::new(registry));

    // --- Consumer ---
    let subscription = Subscription::register(
        pool,
        SHARE_GRADE_TOPIC,
        config.consumer.consumer_group.clone(),
        config.consumer.lease,
    )
    .await
    .context("Failed to register share subscription")?;
    let consumer = ShareGradeConsumer::new(subscription, service, config.consumer);

    let cancel = CancellationToken::new();
    let mut consumer_handle = tokio::spawn(consumer.run(cancel.clone()));

    let joined = tokio::select! {
        joined = &mut consumer_handle => joined,
        () = shutdown_signal() => {
            cancel.cancel();
            consumer_handle.await
        }
    };

    match joined {
        Ok(Ok(())) => {
            tracing::info!("Graceful shutdown complete");
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Share consumer stopped on a bus failure");
            Err(e.into())
        }
        Err(e) => {
            tracing::error!(error = %e, "Share consumer task panicked");
            Err(e.into())
        }
    }
}

/// Wait for SIGINT or SIGTERM.
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
            tracing::info!("Received SIGINT (Ctrl-C), draining in-flight share requests");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, draining in-flight share requests");
        }
    }
}
