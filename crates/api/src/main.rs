use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aura_api::config::ServerConfig;
use aura_api::model_store;
use aura_api::router::build_app_router;
use aura_api::state::AppState;
use aura_core::config::MonitorConfig;
use aura_events::EventBus;
use aura_pipeline::{MonitorScheduler, MonitorService};

/// How long to wait for the scheduler to finish its in-flight cycle.
const SCHEDULER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("Configuration error: {0}")]
    Config(aura_core::error::CoreError),

    #[error("Failure model unavailable: {0}")]
    Model(aura_core::error::CoreError),

    #[error("Invalid HOST address '{0}'")]
    Address(String),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Startup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "aura_api=debug,aura_pipeline=info,aura_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Aura API exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StartupError> {
    // --- Configuration ---
    let config = ServerConfig::from_env().map_err(StartupError::Config)?;
    let monitor_config = MonitorConfig::from_env().map_err(StartupError::Config)?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        machines = monitor_config.machines.len(),
        tick_secs = monitor_config.tick_interval.as_secs_f64(),
        "Loaded configuration"
    );

    // --- Failure model (must exist before the first tick) ---
    let model = {
        let path = config.model_path.clone();
        let fleet = monitor_config.machines.clone();
        let seed = monitor_config.simulation_seed;
        tokio::task::spawn_blocking(move || model_store::load_or_train(&path, &fleet, seed))
            .await?
            .map_err(StartupError::Model)?
    };

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    // --- Monitor service + scheduler ---
    let monitor = Arc::new(
        MonitorService::new(&monitor_config, Arc::new(model), Arc::clone(&event_bus))
            .map_err(StartupError::Config)?,
    );
    let scheduler = MonitorScheduler::from_config(Arc::clone(&monitor), &monitor_config);
    let scheduler_cancel = CancellationToken::new();
    let scheduler_handle = tokio::spawn(scheduler.run(scheduler_cancel.clone()));

    // --- App state + router ---
    let shutdown = CancellationToken::new();
    let state = AppState {
        config: Arc::new(config.clone()),
        monitor,
        event_bus,
        shutdown: shutdown.clone(),
    };
    let app = build_app_router(state, &config).map_err(StartupError::Config)?;

    // --- Start server ---
    let ip: std::net::IpAddr = config
        .host
        .parse()
        .map_err(|_| StartupError::Address(config.host.clone()))?;
    let addr = SocketAddr::new(ip, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            // Ends open event streams so their connections can drain.
            shutdown.cancel();
        })
        .await?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    scheduler_cancel.cancel();
    if tokio::time::timeout(SCHEDULER_STOP_TIMEOUT, scheduler_handle)
        .await
        .is_err()
    {
        tracing::warn!("Scheduler did not stop in time");
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, starting graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
