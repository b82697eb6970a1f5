use chrono::Utc;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::websocket::ServerMessage;

use super::types::{RegistryStats, SocketHandle};

/// Tracks which users are connected and over which sockets.
///
/// A user may hold several sockets at once (multiple tabs or devices), so the
/// registry maps each user id to the set of socket ids currently open for
/// them. A second map keyed by socket id keeps the reverse direction O(1).
/// The two maps are kept in lockstep by `register` and `unregister`.
pub struct SocketRegistry {
    /// socket_id -> SocketHandle
    sockets: DashMap<Uuid, Arc<SocketHandle>>,
    /// user_id -> Set<socket_id> (supports multiple devices)
    user_index: DashMap<String, HashSet<Uuid>>,
}

impl SocketRegistry {
    pub fn new() -> Self {
        Self {
            sockets: DashMap::new(),
            user_index: DashMap::new(),
        }
    }

    /// Register a new socket for a user, returning its handle.
    ///
    /// Registering the same socket id twice for the same user is a no-op
    /// beyond the first insert.
    pub fn register(&self, user_id: String, sender: mpsc::Sender<ServerMessage>) -> Arc<SocketHandle> {
        let handle = Arc::new(SocketHandle::new(user_id.clone(), sender));
        let socket_id = handle.id;

        self.sockets.insert(socket_id, handle.clone());

        self.user_index
            .entry(user_id)
            .or_default()
            .insert(socket_id);

        tracing::info!(socket_id = %socket_id, user_id = %handle.user_id, "Socket registered");

        handle
    }

    /// Remove one (user, socket) pair. Unknown pairs are a no-op.
    ///
    /// When the user's last socket goes away their index entry is removed
    /// entirely, so `is_online` and `users` never report a user with an
    /// empty socket set.
    pub fn unregister(&self, user_id: &str, socket_id: Uuid) {
        let removed = match self.user_index.get_mut(user_id) {
            Some(mut user_sockets) => user_sockets.remove(&socket_id),
            None => false,
        };

        if !removed {
            return;
        }

        self.user_index.remove_if(user_id, |_, sockets| sockets.is_empty());
        self.sockets.remove(&socket_id);

        tracing::info!(socket_id = %socket_id, user_id = %user_id, "Socket unregistered");
    }

    /// Socket ids currently open for a user. Empty when the user is offline.
    pub fn user_sockets(&self, user_id: &str) -> HashSet<Uuid> {
        self.user_index
            .get(user_id)
            .map(|sockets| sockets.clone())
            .unwrap_or_default()
    }

    /// Live handles for all of a user's sockets.
    pub fn user_connections(&self, user_id: &str) -> Vec<Arc<SocketHandle>> {
        self.user_index
            .get(user_id)
            .map(|socket_ids| {
                socket_ids
                    .iter()
                    .filter_map(|id| self.sockets.get(id).map(|h| h.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether the user has at least one open socket.
    pub fn is_online(&self, user_id: &str) -> bool {
        self.user_index.contains_key(user_id)
    }

    /// Reverse lookup: which user owns this socket?
    pub fn find_user_by_socket(&self, socket_id: Uuid) -> Option<String> {
        self.sockets.get(&socket_id).map(|h| h.user_id.clone())
    }

    /// Get socket handle by ID
    pub fn get(&self, socket_id: Uuid) -> Option<Arc<SocketHandle>> {
        self.sockets.get(&socket_id).map(|h| h.clone())
    }

    /// All users with at least one open socket.
    pub fn users(&self) -> Vec<String> {
        self.user_index.iter().map(|e| e.key().clone()).collect()
    }

    /// Get all socket handles
    pub fn all_sockets(&self) -> Vec<Arc<SocketHandle>> {
        self.sockets.iter().map(|r| r.value().clone()).collect()
    }

    /// Get statistics
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            total_sockets: self.sockets.len(),
            unique_users: self.user_index.len(),
        }
    }

    /// Find sockets that have been inactive for longer than the timeout
    pub fn find_stale_sockets(&self, timeout_secs: u64) -> Vec<Arc<SocketHandle>> {
        let now = Utc::now();
        let timeout = chrono::Duration::seconds(timeout_secs as i64);

        self.sockets
            .iter()
            .filter(|entry| now.signed_duration_since(entry.value().last_activity()) > timeout)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Remove stale sockets and return the count of removed sockets
    pub fn cleanup_stale_sockets(&self, timeout_secs: u64) -> usize {
        let stale = self.find_stale_sockets(timeout_secs);
        let count = stale.len();

        for handle in stale {
            tracing::info!(socket_id = %handle.id, user_id = %handle.user_id, "Removing stale socket due to timeout");
            self.unregister(&handle.user_id, handle.id);
        }

        count
    }
}

impl Default for SocketRegistry {
    fn default() -> Self {
        Self::new()
    }
}
