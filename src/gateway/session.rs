//! Session sources: where access tokens come from

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::config::GatewayConfig;
use super::error::{GatewayError, Result};

/// Backend for session lookups and token refreshes.
///
/// The gateway never talks to the auth endpoints directly; it goes through a
/// `SessionSource` so that hosts with their own credential storage (keychain,
/// test harnesses) can plug in a different implementation.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Fetch the current session's access token. `Ok(None)` means no session
    /// exists and the caller proceeds unauthenticated.
    async fn access_token(&self) -> Result<Option<String>>;

    /// Mint a fresh access token from the long-lived refresh credential.
    async fn hard_refresh(&self) -> Result<String>;

    /// Terminate the session client-side. Invoked after a failed hard
    /// refresh; must be idempotent.
    async fn sign_out(&self);
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    /// Present when the provider rotates the refresh credential on use
    refresh_token: Option<String>,
}

/// Session source backed by the platform's HTTP auth endpoints.
///
/// Holds the long-lived refresh credential behind a lock so that rotation
/// during a hard refresh is race-free.
pub struct HttpSessionSource {
    http: reqwest::Client,
    session_url: String,
    refresh_url: String,
    refresh_token: RwLock<Option<String>>,
}

impl HttpSessionSource {
    pub fn new(http: reqwest::Client, config: &GatewayConfig) -> Self {
        Self {
            http,
            session_url: config.url_for(&config.session_path),
            refresh_url: config.url_for(&config.refresh_path),
            refresh_token: RwLock::new(None),
        }
    }

    /// Install the long-lived refresh credential, e.g. after login
    pub async fn set_refresh_token(&self, token: impl Into<String>) {
        *self.refresh_token.write().await = Some(token.into());
    }
}

#[async_trait]
impl SessionSource for HttpSessionSource {
    async fn access_token(&self) -> Result<Option<String>> {
        let response = self.http.get(&self.session_url).send().await?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "No active session");
            return Ok(None);
        }

        let session: SessionResponse = response.json().await?;
        Ok(session.access_token)
    }

    async fn hard_refresh(&self) -> Result<String> {
        let refresh_token = self
            .refresh_token
            .read()
            .await
            .clone()
            .ok_or(GatewayError::MissingRefreshCredential)?;

        let response = self
            .http
            .post(&self.refresh_url)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::RefreshFailed(format!(
                "refresh endpoint returned {}",
                response.status()
            )));
        }

        let refreshed: RefreshResponse = response.json().await?;

        if let Some(rotated) = refreshed.refresh_token {
            *self.refresh_token.write().await = Some(rotated);
        }

        Ok(refreshed.access_token)
    }

    async fn sign_out(&self) {
        let had_credential = self.refresh_token.write().await.take().is_some();
        if had_credential {
            tracing::info!("Signed out, refresh credential dropped");
        }
    }
}
