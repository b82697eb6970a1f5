//! Emit endpoints used by backend services to push events to connected clients.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::push::PushEvent;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct EmitToUserRequest {
    pub user_id: String,
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub correlation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EmitToSocketRequest {
    pub socket_id: Uuid,
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub correlation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmitResponse {
    pub event_id: Uuid,
    pub delivered: usize,
    pub failed: usize,
    pub timestamp: DateTime<Utc>,
}

/// Emit an event to all sockets of a user
#[tracing::instrument(
    name = "http.emit_to_user",
    skip(state, request),
    fields(user_id = %request.user_id, event = %request.event)
)]
pub async fn emit_to_user(
    State(state): State<AppState>,
    Json(request): Json<EmitToUserRequest>,
) -> Result<Json<EmitResponse>> {
    validate_event_name(&request.event)?;

    let mut event = PushEvent::new(&request.event, request.payload);
    if let Some(correlation_id) = request.correlation_id {
        event = event.with_correlation_id(correlation_id);
    }

    let result = state.dispatcher.emit_to_user(&request.user_id, event).await;

    Ok(Json(EmitResponse {
        event_id: result.event_id,
        delivered: result.delivered,
        failed: result.failed,
        timestamp: Utc::now(),
    }))
}

/// Emit an event to a single socket
#[tracing::instrument(
    name = "http.emit_to_socket",
    skip(state, request),
    fields(socket_id = %request.socket_id, event = %request.event)
)]
pub async fn emit_to_socket(
    State(state): State<AppState>,
    Json(request): Json<EmitToSocketRequest>,
) -> Result<Json<EmitResponse>> {
    validate_event_name(&request.event)?;

    let mut event = PushEvent::new(&request.event, request.payload);
    if let Some(correlation_id) = request.correlation_id {
        event = event.with_correlation_id(correlation_id);
    }

    let result = state
        .dispatcher
        .emit_to_socket(request.socket_id, event)
        .await;

    Ok(Json(EmitResponse {
        event_id: result.event_id,
        delivered: result.delivered,
        failed: result.failed,
        timestamp: Utc::now(),
    }))
}

/// Validate event name
fn validate_event_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 128 {
        return Err(AppError::Validation(format!(
            "Invalid event name length: {}",
            name.len()
        )));
    }

    // Only allow alphanumeric, dash, underscore, and dot
    let valid = name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.');

    if !valid {
        return Err(AppError::Validation(format!("Invalid event name: {}", name)));
    }

    Ok(())
}
