//! Error types for the API gateway client

use thiserror::Error;

/// Errors returned by the gateway client
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport-level failure: connect, TLS, timeout, or body decode
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A request body could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The refresh endpoint rejected the refresh credential
    #[error("Refresh failed: {0}")]
    RefreshFailed(String),

    /// Hard refresh was attempted without a refresh credential on hand
    #[error("No refresh credential available")]
    MissingRefreshCredential,
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;
