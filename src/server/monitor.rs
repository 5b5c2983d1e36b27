//! Handlers for the monitoring session and one-shot checks.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use super::webhook::{STOPPED_TEXT, reply, started_text};
use super::{ApiError, ApiState};
use crate::pipeline::{CycleReport, MonitorStatus, StartOutcome, StopOutcome};

/// Session state, tracked count and the most recent offers.
pub async fn status(State(state): State<ApiState>) -> Json<MonitorStatus> {
    let recent = state.monitor.config().monitor.recent_limit;
    Json(state.monitor.status(recent).await)
}

pub async fn start(State(state): State<ApiState>) -> Json<Value> {
    let outcome = state.monitor.start().await;
    let message = match outcome {
        StartOutcome::Started => {
            reply(&state.monitor, &started_text(state.monitor.config())).await;
            "Monitoring started"
        }
        StartOutcome::AlreadyRunning => "Monitoring is already running",
    };
    Json(json!({ "status": outcome, "message": message }))
}

pub async fn stop(State(state): State<ApiState>) -> Json<Value> {
    let outcome = state.monitor.stop().await;
    let message = match outcome {
        StopOutcome::Stopped => {
            reply(&state.monitor, STOPPED_TEXT).await;
            "Monitoring stopped"
        }
        StopOutcome::NotRunning => "Monitoring was not running",
    };
    Json(json!({ "status": outcome, "message": message }))
}

/// Run one cycle now and return its summary.
pub async fn check(State(state): State<ApiState>) -> Result<Json<CycleReport>, ApiError> {
    Ok(Json(state.monitor.check_now().await?))
}

pub async fn preview(State(state): State<ApiState>) -> Json<Value> {
    let offers = state.monitor.preview().await;
    Json(json!({ "count": offers.len(), "offers": offers }))
}
