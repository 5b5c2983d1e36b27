//! Control surface.
//!
//! A small axum application exposing the monitor: health and status views,
//! session start/stop, a one-shot check, a side-effect-free preview and the
//! Telegram webhook.

mod error;
mod monitor;
mod webhook;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use chrono::Local;
use serde_json::{Value, json};

pub use error::ApiError;
pub use webhook::Command;

use crate::error::{AppError, Result};
use crate::pipeline::Monitor;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub monitor: Arc<Monitor>,
    /// The only chat allowed to drive the bot
    pub chat_id: String,
}

impl ApiState {
    pub fn new(monitor: Arc<Monitor>, chat_id: impl Into<String>) -> Self {
        Self {
            monitor,
            chat_id: chat_id.into(),
        }
    }
}

/// Build the control-surface router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(monitor::status))
        .route("/monitor/start", post(monitor::start))
        .route("/monitor/stop", post(monitor::stop))
        .route("/check", post(monitor::check))
        .route("/preview", get(monitor::preview))
        .route("/webhook", post(webhook::webhook))
        .with_state(state)
}

/// Serve the control surface until `shutdown` resolves.
pub async fn run(
    state: ApiState,
    listen_address: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let addr: SocketAddr = listen_address.parse().map_err(|e| {
        AppError::config(format!("Invalid listen address '{listen_address}': {e}"))
    })?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Control surface listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health(State(state): State<ApiState>) -> Json<Value> {
    let monitoring = state.monitor.is_active().await;
    let items_count = state.monitor.tracked_count().await;
    Json(json!({
        "status": "healthy",
        "monitoring": monitoring,
        "items_count": items_count,
        "timestamp": Local::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
