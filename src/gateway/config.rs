//! Configuration for the API gateway client

use std::time::Duration;

/// Configuration for the platform API gateway
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the platform API (e.g. "https://api.hirely.io")
    pub base_url: String,

    /// Path that returns the current session's access token
    pub session_path: String,

    /// Path that exchanges the refresh credential for a new access token
    pub refresh_path: String,

    /// How long a fetched access token is served from cache before the next
    /// session lookup
    pub token_ttl: Duration,

    /// Per-request timeout covering connect, send, and response body
    pub request_timeout: Duration,

    /// Path prefixes treated as authentication routes. A 401 from these never
    /// triggers the refresh-and-retry protocol, so a broken sign-in page
    /// cannot loop through refresh attempts.
    pub auth_path_prefixes: Vec<String>,
}

impl GatewayConfig {
    /// Create a new configuration with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            session_path: "/api/auth/session".to_string(),
            refresh_path: "/api/auth/refresh".to_string(),
            token_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            auth_path_prefixes: vec!["/auth".to_string(), "/api/auth".to_string()],
        }
    }

    /// Set the session lookup path
    pub fn session_path(mut self, path: impl Into<String>) -> Self {
        self.session_path = path.into();
        self
    }

    /// Set the refresh endpoint path
    pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    /// Set how long access tokens are served from cache
    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replace the set of authentication path prefixes
    pub fn auth_path_prefixes(mut self, prefixes: Vec<String>) -> Self {
        self.auth_path_prefixes = prefixes;
        self
    }

    /// Whether a request path is an authentication route (prefix match)
    pub fn is_auth_path(&self, path: &str) -> bool {
        self.auth_path_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Absolute URL for an API path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
