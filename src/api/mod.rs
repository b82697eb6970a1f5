//! API layer - HTTP endpoint handlers organized by domain.

mod emit;
mod health;
mod metrics;
mod presence;
mod routes;

// Re-export all handlers for use in server/app.rs
pub use emit::{emit_to_socket, emit_to_user, EmitResponse, EmitToSocketRequest, EmitToUserRequest};
pub use health::{health, stats};
pub use metrics::prometheus_metrics;
pub use presence::{user_presence, PresenceResponse};
pub use routes::api_routes;
