//! Presence endpoint: who is online and over which sockets.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub user_id: String,
    pub online: bool,
    pub socket_count: usize,
    pub sockets: Vec<Uuid>,
}

/// GET /api/v1/presence/{user_id} - check whether a user is connected
#[tracing::instrument(name = "http.presence", skip(state))]
pub async fn user_presence(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<PresenceResponse> {
    let sockets: Vec<Uuid> = state.registry.user_sockets(&user_id).into_iter().collect();

    Json(PresenceResponse {
        online: !sockets.is_empty(),
        socket_count: sockets.len(),
        sockets,
        user_id,
    })
}
