//! Open Membership Core - API Server Binary
//!
//! Starts the HTTP API server for the membership dues ledger.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin membership-api
//!
//! # Run with environment variables
//! API_HOST=0.0.0.0 API_PORT=8080 DATABASE_URL=postgres://... cargo run --bin membership-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_DATABASE_URL` / `DATABASE_URL` - PostgreSQL connection string
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error
//! * `API_AVERAGE_MONTHLY_DUE` - Arrears divisor, e.g. `30.00`
//! * `API_ARREARS_MONTHS_THRESHOLD` - Months of debt before arrears (default: 3)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::Money;
use domain_dues::{ArrearsPolicy, DuesConfig, DuesService, LogNotifier};
use infra_db::{create_pool, DatabaseConfig, PgLedgerStore};
use interface_api::{config::ApiConfig, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "starting Open Membership Core API server"
    );

    let pool = create_pool(DatabaseConfig::new(&config.database_url))
        .await
        .context("database connection failed")?;

    let dues_config = dues_config_from(&config)?;
    let store = Arc::new(PgLedgerStore::new(pool));
    let service = Arc::new(DuesService::new(store, Arc::new(LogNotifier), dues_config));

    // Schema migrations are applied out of band; verify connectivity only
    service
        .health_check()
        .await
        .map_err(|e| anyhow::anyhow!("database ping failed: {e}"))?;
    tracing::info!("database ready");

    let app = create_router(service, config.clone());
    let addr: SocketAddr = config.server_addr().parse()?;

    tracing::info!(%addr, "server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Loads API configuration from environment variables, falling back to
/// individual variables and defaults
fn load_config() -> anyhow::Result<ApiConfig> {
    let config = ApiConfig::from_env().unwrap_or_else(|_| {
        let defaults = ApiConfig::default();
        ApiConfig {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            jwt_secret: std::env::var("API_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_expiration_secs: std::env::var("API_JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.jwt_expiration_secs),
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("API_DATABASE_URL"))
                .unwrap_or(defaults.database_url),
            log_level: std::env::var("API_LOG_LEVEL")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or(defaults.log_level),
            average_monthly_due: std::env::var("API_AVERAGE_MONTHLY_DUE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.average_monthly_due),
            arrears_months_threshold: std::env::var("API_ARREARS_MONTHS_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.arrears_months_threshold),
            lock_timeout_ms: std::env::var("API_LOCK_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.lock_timeout_ms),
        }
    });

    Ok(config)
}

/// Builds the domain service configuration from the API configuration
fn dues_config_from(config: &ApiConfig) -> anyhow::Result<DuesConfig> {
    let average_monthly_due = Money::try_from_decimal(config.average_monthly_due)
        .context("API_AVERAGE_MONTHLY_DUE must be a two-decimal amount")?;

    Ok(DuesConfig {
        arrears: ArrearsPolicy::new(average_monthly_due, config.arrears_months_threshold),
        lock_timeout: Duration::from_millis(config.lock_timeout_ms),
    })
}

/// Initializes the tracing subscriber for structured logging
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM) so in-flight requests
/// can complete before the process exits
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating graceful shutdown");
        }
    }
}
