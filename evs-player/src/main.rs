//! EVS Player (evs-player) - Main entry point
//!
//! Runs the switch orchestrator against simulated back-ends and exposes
//! the HTTP control API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use evs_common::time::SystemClock;
use evs_player::api;
use evs_player::config::TomlConfig;
use evs_player::estimator::LoadTimeEstimator;
use evs_player::orchestrator::SwitchOrchestrator;
use evs_player::request;
use evs_player::sim::{LoggingTransitionDriver, SimulatedDriverFactory};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for evs-player
#[derive(Parser, Debug)]
#[command(name = "evs-player")]
#[command(about = "Synchronized dual-surface video player")]
#[command(version)]
struct Args {
    /// Configuration file (also read from EVS_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "EVS_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = evs_common::config::resolve_config_path(args.config.as_deref(), "EVS_CONFIG")
        .context("Failed to resolve configuration file")?;
    let mut config = match &config_path {
        Some(path) => TomlConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => TomlConfig::default(),
    };
    if let Some(port) = args.port {
        config.port = port;
    }

    // Initialize tracing; RUST_LOG wins over the configured level
    let level = config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("evs_player={level},evs_common={level},tower_http=info").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting EVS Player on port {}", config.port);
    match &config_path {
        Some(path) => info!("Configuration: {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }

    let estimator = Arc::new(tokio::sync::Mutex::new(LoadTimeEstimator::from_config(&config)));
    let orchestrator = SwitchOrchestrator::new(
        &config,
        Arc::new(SimulatedDriverFactory::default()),
        Arc::new(LoggingTransitionDriver::new(Duration::from_millis(
            config.transition.frame_interval_ms,
        ))),
        estimator,
        Arc::new(SystemClock),
    );
    orchestrator.initialize().await;

    let (publisher, source) = request::request_channel();
    let request_loop = tokio::spawn(Arc::clone(&orchestrator).run_request_loop(source));

    let ctx = api::AppContext {
        orchestrator: Arc::clone(&orchestrator),
        requests: publisher,
        port: config.port,
    };
    api::run(ctx, shutdown_signal()).await.context("HTTP server failed")?;

    request_loop.abort();
    orchestrator.shutdown().await;

    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
