//! HTTP transport
//!
//! Exposes exactly two routes, `POST /getData` and `POST /setData`. Account
//! management is deliberately absent here; it is only reachable through the
//! local CLI.

mod envelope;
mod handlers;

pub use envelope::{Envelope, CODE_ERROR, CODE_FAIL, CODE_OK, MSG_BAD_LOGIN, MSG_INTERNAL};

use crate::{Config, Result, Vault};
use axum::{extract::DefaultBodyLimit, routing::post, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<Vault>,
}

/// Build the router around an already-open vault
pub fn router(vault: Arc<Vault>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/getData", post(handlers::get_data))
        .route("/setData", post(handlers::set_data))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { vault })
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(vault: Arc<Vault>, config: &Config) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router(vault, config.max_body_bytes))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
