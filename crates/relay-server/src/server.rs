//! Server creation and management utilities
//!
//! This module exposes the server logic for use by the relay binary,
//! tests and anything else that wants an in-process relay.

use axum::{
    Router,
    routing::{any, get},
};
use common::config::ServerConfig;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/webhooks/events", get(routes::events))
        .route("/hooks", any(routes::ingest))
        .route("/hooks/{*path}", any(routes::ingest))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Server handle that can be used to shut down the server
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// Base URL of the bound address (useful with port 0)
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Signal the server to shut down gracefully
    pub fn shutdown(self) {
        self.shutdown.cancel();
    }

    /// Shut down and wait until the server task has finished
    pub async fn shutdown_and_wait(self) {
        self.shutdown.cancel();
        let _ = self.task.await;
    }
}

async fn bind(config: &ServerConfig) -> anyhow::Result<(TcpListener, SocketAddr)> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    Ok((listener, local))
}

/// Start the server in a background task, returning a handle for shutdown
pub async fn start_server(config: ServerConfig) -> anyhow::Result<ServerHandle> {
    let (listener, addr) = bind(&config).await?;
    let state = AppState::new();
    let shutdown = state.shutdown_token();
    let app = create_router(state);

    let signal = shutdown.clone();
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                signal.cancelled().await;
                tracing::info!("Received shutdown signal");
            })
            .await
            .ok();
    });

    tracing::info!("Relay started on {}", addr);

    Ok(ServerHandle {
        addr,
        shutdown,
        task,
    })
}

/// Start the server and block until Ctrl-C (for CLI usage)
pub async fn run_server_blocking(config: ServerConfig) -> anyhow::Result<()> {
    let (listener, addr) = bind(&config).await?;
    let state = AppState::new();
    let shutdown = state.shutdown_token();
    let app = create_router(state);

    tracing::info!("Relay running on {}", addr);
    tracing::info!("Send webhooks to http://{}/hooks/<anything>", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received Ctrl-C, shutting down");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
