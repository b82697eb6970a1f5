//! Access token cache with single-flight refresh
//!
//! Concurrent callers that find the cache empty or expired share one
//! underlying session lookup instead of stampeding the auth endpoints. The
//! same in-flight slot also serializes hard refreshes, so at any moment at
//! most one session lookup or refresh call is on the wire.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::Mutex;

use super::session::SessionSource;

/// Outcome future shared by every caller that joined an in-flight operation.
/// The payload is `Option` rather than `Result` because the outcome has to be
/// `Clone`; failures surface as `None` with the cause logged at the source.
type OutcomeFuture = Shared<BoxFuture<'static, Option<String>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefreshKind {
    /// Plain session lookup
    Lookup,
    /// Refresh-credential exchange after a 401
    Hard,
}

#[derive(Clone)]
struct InFlight {
    kind: RefreshKind,
    outcome: OutcomeFuture,
}

#[derive(Default)]
struct CacheState {
    token: Option<String>,
    expires_at: Option<Instant>,
    in_flight: Option<InFlight>,
}

impl CacheState {
    fn valid_token(&self) -> Option<String> {
        match (&self.token, self.expires_at) {
            (Some(token), Some(expires_at)) if Instant::now() < expires_at => {
                Some(token.clone())
            }
            _ => None,
        }
    }
}

struct CacheInner {
    source: Arc<dyn SessionSource>,
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl CacheInner {
    /// Spawn the underlying call and hand back a shareable outcome. The
    /// spawned task owns the write-back, so the result lands in the cache
    /// even if every waiter is cancelled mid-flight.
    fn begin(self: &Arc<Self>, kind: RefreshKind) -> InFlight {
        let inner = self.clone();
        let task = tokio::spawn(async move {
            let outcome = match kind {
                RefreshKind::Lookup => match inner.source.access_token().await {
                    Ok(token) => token,
                    Err(e) => {
                        tracing::warn!(error = %e, "Session lookup failed");
                        None
                    }
                },
                RefreshKind::Hard => match inner.source.hard_refresh().await {
                    Ok(token) => Some(token),
                    Err(e) => {
                        tracing::warn!(error = %e, "Hard refresh failed");
                        None
                    }
                },
            };

            let mut state = inner.state.lock().await;
            match &outcome {
                Some(token) => {
                    state.token = Some(token.clone());
                    state.expires_at = Some(Instant::now() + inner.ttl);
                }
                None => {
                    state.token = None;
                    state.expires_at = None;
                }
            }
            state.in_flight = None;
            drop(state);

            outcome
        });

        let outcome = async move { task.await.unwrap_or(None) }.boxed().shared();
        InFlight { kind, outcome }
    }
}

enum Wait {
    /// This operation produces our answer
    Join(OutcomeFuture),
    /// Wrong kind of operation in flight; wait it out, then try again
    Drain(OutcomeFuture),
}

/// Cheaply cloneable token cache shared between the gateway and anything
/// else that needs the current credential, such as the realtime handshake.
#[derive(Clone)]
pub struct TokenCache {
    inner: Arc<CacheInner>,
}

impl TokenCache {
    pub fn new(source: Arc<dyn SessionSource>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                source,
                ttl,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    /// Current access token. Serves from cache while the entry is fresh,
    /// otherwise joins or starts a single session lookup. `None` means no
    /// session exists or the lookup failed.
    pub async fn token(&self) -> Option<String> {
        let outcome = {
            let mut state = self.inner.state.lock().await;
            if let Some(token) = state.valid_token() {
                return Some(token);
            }
            match &state.in_flight {
                // Whatever is in flight will produce the freshest token
                Some(op) => op.outcome.clone(),
                None => {
                    let op = self.inner.begin(RefreshKind::Lookup);
                    let outcome = op.outcome.clone();
                    state.in_flight = Some(op);
                    outcome
                }
            }
        };

        outcome.await
    }

    /// Drop the cached entry and fetch a fresh token. Joins any operation
    /// already in flight rather than starting a second one.
    pub async fn force_refresh(&self) -> Option<String> {
        self.clear().await;
        self.token().await
    }

    /// Exchange the refresh credential for a new token. Concurrent hard
    /// refreshes coalesce into one call; a plain lookup already in flight is
    /// allowed to finish first so the two never overlap on the wire.
    pub async fn hard_refresh(&self) -> Option<String> {
        loop {
            let wait = {
                let mut state = self.inner.state.lock().await;
                match &state.in_flight {
                    Some(op) if op.kind == RefreshKind::Hard => Wait::Join(op.outcome.clone()),
                    Some(op) => Wait::Drain(op.outcome.clone()),
                    None => {
                        let op = self.inner.begin(RefreshKind::Hard);
                        let outcome = op.outcome.clone();
                        state.in_flight = Some(op);
                        Wait::Join(outcome)
                    }
                }
            };

            match wait {
                Wait::Join(outcome) => return outcome.await,
                Wait::Drain(outcome) => {
                    let _ = outcome.await;
                }
            }
        }
    }

    /// Forget the cached token. In-flight operations are unaffected.
    pub async fn clear(&self) {
        let mut state = self.inner.state.lock().await;
        state.token = None;
        state.expires_at = None;
    }
}
