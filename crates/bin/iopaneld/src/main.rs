//! # iopaneld: iopanel daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Initialise `tracing` from the configured filter
//! - Build the output registry on top of the output driver, driving every
//!   pin to its initial value
//! - Construct the observer hub and the application services around it
//! - Spawn the liveness sweep
//! - Build the axum router, bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use iopanel_adapter_http_axum::state::AppState;
use iopanel_adapter_virtual::VirtualBoard;
use iopanel_app::observer_hub::ObserverHub;
use iopanel_app::registry::OutputRegistry;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Outputs
    let declarations = config.declarations()?;
    let registry = OutputRegistry::new(
        VirtualBoard::new(),
        config.panel.pwm_resolution,
        declarations,
    )
    .context("initialising outputs")?;
    tracing::info!(entities = registry.len(), "output registry ready");

    // Observers
    let hub = Arc::new(ObserverHub::new(config.panel.observer_buffer));
    let state = AppState::new(Arc::new(registry), hub, config.assets.dir.clone());
    let sweeper = state.connections.spawn_sweeper(config.sweep_interval());

    // HTTP
    let app = iopanel_adapter_http_axum::router::build(state);
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, assets = %config.assets.dir.display(), "iopaneld listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    sweeper.abort();
    tracing::info!("iopaneld stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(%err, "unable to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(%err, "unable to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
