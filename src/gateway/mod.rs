//! Authenticated client for the platform API
//!
//! First-party apps talk to the platform through [`ApiGateway`], which keeps
//! a short-lived access token in a [`TokenCache`] and refreshes it without
//! stampeding the auth endpoints. Hosts that store credentials somewhere
//! other than the platform's auth routes implement [`SessionSource`]:
//!
//! ```no_run
//! use std::sync::Arc;
//! use hirely_realtime_service::gateway::{ApiGateway, GatewayConfig, HttpSessionSource};
//!
//! # async fn example() -> hirely_realtime_service::gateway::Result<()> {
//! let config = GatewayConfig::new("https://api.hirely.io");
//! let source = Arc::new(HttpSessionSource::new(reqwest::Client::new(), &config));
//! source.set_refresh_token("rt-abc123").await;
//!
//! let gateway = ApiGateway::with_session_source(config, source)?;
//! let jobs = gateway.get("/api/v1/jobs").await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod session;
mod token_cache;

pub use client::ApiGateway;
pub use config::GatewayConfig;
pub use error::{GatewayError, Result};
pub use session::{HttpSessionSource, SessionSource};
pub use token_cache::TokenCache;
