use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use users_api::app::app;
use users_api::cli::Cli;
use users_api::config;
use users_api::database::{DatabaseManager, PgUserRepository};
use users_api::handlers::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, APP_ENV, etc.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = cli.apply(config::config().clone());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_log_directive()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting Users API in {:?} mode", config.environment);

    let database = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    database
        .health_check()
        .await
        .context("database did not answer ping")?;

    let state = AppState::new(PgUserRepository::new(database.pool()));
    let router = app(state, &config);

    let listener = tokio::net::TcpListener::bind(&config.api.address)
        .await
        .with_context(|| format!("failed to bind {}", config.api.address))?;

    tracing::info!("Users API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    database.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
