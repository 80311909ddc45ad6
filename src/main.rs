//! Application entry point and server initialization
//!
//! This module contains the main function that:
//! - Loads environment configuration
//! - Opens the configured link store
//! - Starts the HTTP server with graceful shutdown support

use std::sync::Arc;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use shortlink::config::{Config, StoreBackend};
use shortlink::database::RedbStore;
use shortlink::route::create_app;
use shortlink::state::AppState;
use shortlink::store::{LinkStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shortlink=debug,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn LinkStore> = match config.store_backend {
        StoreBackend::Redb => Arc::new(
            RedbStore::open(&config.database_url)
                .with_context(|| format!("failed to open database `{}`", config.database_url))?,
        ),
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
    };

    let state = AppState::new(store, config.allocator, config.allocation_timeout)?;
    let app = create_app(state).layer(TraceLayer::new_for_http());

    // Bind to all network interfaces on the specified port
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        backend = ?config.store_backend,
        database = %config.database_url,
        "server listening"
    );

    // Runs until SIGTERM or SIGINT; in-flight requests are allowed to finish
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

/// Resolves on Ctrl+C (SIGINT) or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    // On non-Unix systems (Windows), only handle Ctrl+C
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, stopping server");
}
