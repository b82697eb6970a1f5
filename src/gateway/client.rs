//! Authenticated HTTP client for the platform API

use std::sync::Arc;

use reqwest::{Method, Response, StatusCode};
use serde::Serialize;

use super::config::GatewayConfig;
use super::error::Result;
use super::session::{HttpSessionSource, SessionSource};
use super::token_cache::TokenCache;

/// HTTP client that handles bearer credentials transparently.
///
/// Every request picks up the current access token from the shared cache and
/// attaches it as a `Bearer` header; requests go out unauthenticated when no
/// token is available. A 401 from a non-auth route triggers exactly one hard
/// refresh followed by one retry; if the refresh fails the session is signed
/// out and the original 401 is returned untouched. Auth routes are exempt
/// from the whole protocol.
#[derive(Clone)]
pub struct ApiGateway {
    http: reqwest::Client,
    config: Arc<GatewayConfig>,
    cache: TokenCache,
    session: Arc<dyn SessionSource>,
}

impl ApiGateway {
    /// Build a gateway backed by the platform's HTTP auth endpoints
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let http = Self::build_http(&config)?;
        let session: Arc<dyn SessionSource> =
            Arc::new(HttpSessionSource::new(http.clone(), &config));
        Ok(Self::assemble(config, session, http))
    }

    /// Build a gateway with a custom session source
    pub fn with_session_source(
        config: GatewayConfig,
        session: Arc<dyn SessionSource>,
    ) -> Result<Self> {
        let http = Self::build_http(&config)?;
        Ok(Self::assemble(config, session, http))
    }

    fn build_http(config: &GatewayConfig) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?)
    }

    fn assemble(
        config: GatewayConfig,
        session: Arc<dyn SessionSource>,
        http: reqwest::Client,
    ) -> Self {
        let cache = TokenCache::new(session.clone(), config.token_ttl);
        Self {
            http,
            config: Arc::new(config),
            cache,
            session,
        }
    }

    /// Current access token, if any. The realtime layer uses this so the
    /// WebSocket handshake presents the same credential as HTTP calls.
    pub async fn access_token(&self) -> Option<String> {
        self.cache.token().await
    }

    /// Drop the cached token and fetch a fresh one
    pub async fn force_refresh(&self) -> Option<String> {
        self.cache.force_refresh().await
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.execute(Method::GET, path, None).await
    }

    pub async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let body = serde_json::to_value(body)?;
        self.execute(Method::POST, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.execute(Method::DELETE, path, None).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let url = self.config.url_for(path);

        let token = self.cache.token().await;
        let response = self
            .request(&method, &url, token.as_deref(), body.as_ref())
            .send()
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED || self.config.is_auth_path(path) {
            return Ok(response);
        }

        // One hard refresh, one retry. A second 401 comes back as-is.
        let fresh = match self.cache.hard_refresh().await {
            Some(token) => token,
            None => {
                tracing::warn!(path = %path, "Hard refresh failed, signing out");
                self.session.sign_out().await;
                return Ok(response);
            }
        };

        tracing::debug!(path = %path, "Retrying with refreshed token");
        let retried = self
            .request(&method, &url, Some(&fresh), body.as_ref())
            .send()
            .await?;
        Ok(retried)
    }

    fn request(
        &self,
        method: &Method,
        url: &str,
        token: Option<&str>,
        body: Option<&serde_json::Value>,
    ) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method.clone(), url);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder
    }
}
