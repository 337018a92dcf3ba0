//! Keygate Server — Session & Identity Lifecycle Engine
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use keygate_auth::{CredentialVerifier, LogNotifier, TokenService};
use keygate_core::config::AppConfig;
use keygate_core::error::AppError;
use keygate_core::traits::{Clock, Notifier, SystemClock};
use keygate_realtime::RealtimeNotifier;
use keygate_store::Stores;
use keygate_worker::{MaintenanceScheduler, SweepJob};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("KEYGATE_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Keygate v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Validate configuration ───────────────────────────
    config.validate()?;

    // ── Step 2: Initialize stores ────────────────────────────────
    tracing::info!(backend = %config.store.backend, "Initializing stores");
    let stores = Stores::new(&config.store).await?;

    // ── Step 3: Initialize services ──────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier::new());

    let tokens = Arc::new(TokenService::new(
        stores.identities(),
        stores.sessions(),
        Arc::clone(&clock),
        &config.auth,
    ));
    let verifier = Arc::new(CredentialVerifier::new(
        stores.identities(),
        stores.sessions(),
        Arc::clone(&tokens),
        Arc::clone(&notifier),
        Arc::clone(&clock),
        &config.auth,
    ));
    let realtime = Arc::new(RealtimeNotifier::new(Arc::clone(&clock), &config.realtime));

    // ── Step 4: Start expired-session sweep ──────────────────────
    let mut scheduler = MaintenanceScheduler::new().await?;
    scheduler
        .register_sweep(
            SweepJob::new(stores.sessions(), Arc::clone(&clock)),
            std::time::Duration::from_secs(config.session.sweep_interval_seconds),
        )
        .await?;
    scheduler.start().await?;
    tracing::info!(
        interval_seconds = config.session.sweep_interval_seconds,
        "Session sweep scheduled"
    );

    // ── Step 5: Build and start HTTP server ──────────────────────
    let grace_seconds = config.server.shutdown_grace_seconds;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app_state = keygate_api::AppState {
        config: Arc::new(config),
        stores,
        tokens,
        verifier,
        realtime,
        clock,
    };
    let app = keygate_api::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Keygate server listening on {}", addr);

    // ── Step 6: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 7: Stop background jobs ─────────────────────────────
    let stop = tokio::time::timeout(
        std::time::Duration::from_secs(grace_seconds),
        scheduler.shutdown(),
    )
    .await;
    match stop {
        Ok(result) => result?,
        Err(_) => tracing::warn!(grace_seconds, "Scheduler did not stop within the grace window"),
    }

    tracing::info!("Keygate server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
