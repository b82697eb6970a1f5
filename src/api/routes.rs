use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::server::{api_key_auth, AppState};

use super::emit::{emit_to_socket, emit_to_user};
use super::health::{health, stats};
use super::metrics::prometheus_metrics;
use super::presence::user_presence;

pub fn api_routes(state: AppState) -> Router<AppState> {
    // Emit endpoints are service-to-service and sit behind the API key
    let emit = Router::new()
        .route("/emit/user", post(emit_to_user))
        .route("/emit/socket", post(emit_to_socket))
        .route_layer(middleware::from_fn_with_state(state, api_key_auth));

    Router::new()
        // Health & Stats
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        .nest(
            "/api/v1",
            Router::new()
                .route("/presence/{user_id}", get(user_presence))
                .merge(emit),
        )
}
