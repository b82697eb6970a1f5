// Infrastructure layer (shared components)
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;

// Domain layer (business logic)
pub mod push;
pub mod registry;

// Application layer
pub mod api;
pub mod gateway;
pub mod server;
pub mod websocket;

// Supporting modules
pub mod tasks;
