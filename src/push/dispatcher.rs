use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::metrics::EmitMetrics;
use crate::registry::{SocketHandle, SocketRegistry};
use crate::websocket::ServerMessage;

use super::types::{DeliveryResult, PushEvent};

/// Maximum number of concurrent message sends
const MAX_CONCURRENT_SENDS: usize = 100;

/// Statistics for the push dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Total events emitted
    pub total_emitted: AtomicU64,
    /// Total successful deliveries (socket count)
    pub total_delivered: AtomicU64,
    /// Total failed deliveries
    pub total_failed: AtomicU64,
    /// Events targeted at a user
    pub user_emits: AtomicU64,
    /// Events targeted at a single socket
    pub socket_emits: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_emitted: self.total_emitted.load(Ordering::Relaxed),
            total_delivered: self.total_delivered.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            user_emits: self.user_emits.load(Ordering::Relaxed),
            socket_emits: self.socket_emits.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_emitted: u64,
    pub total_delivered: u64,
    pub total_failed: u64,
    pub user_emits: u64,
    pub socket_emits: u64,
}

/// Dispatches push events to connected clients
pub struct PushDispatcher {
    registry: Arc<SocketRegistry>,
    stats: DispatcherStats,
}

impl PushDispatcher {
    pub fn new(registry: Arc<SocketRegistry>) -> Self {
        Self {
            registry,
            stats: DispatcherStats::default(),
        }
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Emit an event to a specific user (all their sockets).
    ///
    /// An offline user is not an error: the event is simply dropped and the
    /// result reports zero deliveries.
    #[tracing::instrument(
        name = "dispatcher.emit_to_user",
        skip(self, event),
        fields(event_id = %event.id, event = %event.event)
    )]
    pub async fn emit_to_user(&self, user_id: &str, event: PushEvent) -> DeliveryResult {
        let event_id = event.id;
        let connections = self.registry.user_connections(user_id);
        let message = ServerMessage::Event { event };

        let (delivered, failed) = self.send_to_sockets(&connections, &message).await;

        self.stats.total_emitted.fetch_add(1, Ordering::Relaxed);
        self.stats.total_delivered.fetch_add(delivered as u64, Ordering::Relaxed);
        self.stats.total_failed.fetch_add(failed as u64, Ordering::Relaxed);
        self.stats.user_emits.fetch_add(1, Ordering::Relaxed);

        EmitMetrics::record_user_emit();
        EmitMetrics::record_delivered(delivered as u64);
        EmitMetrics::record_failed(failed as u64);

        tracing::debug!(
            user_id = %user_id,
            event_id = %event_id,
            delivered = delivered,
            failed = failed,
            "Emitted event to user"
        );

        DeliveryResult::new(event_id, delivered, failed)
    }

    /// Emit an event to one specific socket.
    ///
    /// An unknown socket id is treated like an offline user: zero deliveries,
    /// no error.
    #[tracing::instrument(
        name = "dispatcher.emit_to_socket",
        skip(self, event),
        fields(event_id = %event.id, event = %event.event)
    )]
    pub async fn emit_to_socket(&self, socket_id: Uuid, event: PushEvent) -> DeliveryResult {
        let event_id = event.id;
        let message = ServerMessage::Event { event };

        let (delivered, failed) = match self.registry.get(socket_id) {
            Some(handle) => match handle.send(message).await {
                Ok(_) => (1, 0),
                Err(_) => (0, 1),
            },
            None => {
                tracing::debug!(socket_id = %socket_id, "Emit target socket not found");
                (0, 0)
            }
        };

        self.stats.total_emitted.fetch_add(1, Ordering::Relaxed);
        self.stats.total_delivered.fetch_add(delivered as u64, Ordering::Relaxed);
        self.stats.total_failed.fetch_add(failed as u64, Ordering::Relaxed);
        self.stats.socket_emits.fetch_add(1, Ordering::Relaxed);

        EmitMetrics::record_socket_emit();
        EmitMetrics::record_delivered(delivered as u64);
        EmitMetrics::record_failed(failed as u64);

        tracing::debug!(
            socket_id = %socket_id,
            event_id = %event_id,
            delivered = delivered,
            failed = failed,
            "Emitted event to socket"
        );

        DeliveryResult::new(event_id, delivered, failed)
    }

    /// Send a message to a list of sockets concurrently.
    /// Uses bounded parallelism to avoid overwhelming the system.
    async fn send_to_sockets(
        &self,
        sockets: &[Arc<SocketHandle>],
        message: &ServerMessage,
    ) -> (usize, usize) {
        if sockets.is_empty() {
            return (0, 0);
        }

        // For a handful of sockets, sequential sending is cheaper than task churn
        if sockets.len() <= 3 {
            let mut delivered = 0;
            let mut failed = 0;
            for socket in sockets {
                match socket.send(message.clone()).await {
                    Ok(_) => delivered += 1,
                    Err(_) => failed += 1,
                }
            }
            return (delivered, failed);
        }

        // Larger fan-outs run concurrently with bounded parallelism
        let mut futures = FuturesUnordered::new();
        let mut delivered = 0;
        let mut failed = 0;
        let mut pending = 0;

        for socket in sockets {
            let socket = socket.clone();
            let msg = message.clone();
            futures.push(async move { socket.send(msg).await.is_ok() });
            pending += 1;

            while pending >= MAX_CONCURRENT_SENDS {
                if let Some(ok) = futures.next().await {
                    pending -= 1;
                    if ok {
                        delivered += 1;
                    } else {
                        failed += 1;
                    }
                } else {
                    break;
                }
            }
        }

        while let Some(ok) = futures.next().await {
            if ok {
                delivered += 1;
            } else {
                failed += 1;
            }
        }

        (delivered, failed)
    }
}
