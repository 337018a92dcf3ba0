//! Connection pool indexed by connection ID and by identity.

use std::sync::Arc;

use dashmap::DashMap;

use keygate_core::types::IdentityId;

use super::handle::{ConnectionHandle, ConnectionId};

/// Thread-safe registry of live connections.
///
/// One identity may hold several connections (tabs, devices), so the
/// identity index maps to a list of handles.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    by_identity: DashMap<IdentityId, Vec<Arc<ConnectionHandle>>>,
}

impl ConnectionPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            by_id: DashMap::new(),
            by_identity: DashMap::new(),
        }
    }

    /// Adds a connection to both indexes.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle.clone());
        self.by_identity
            .entry(handle.identity_id)
            .or_default()
            .push(handle);
    }

    /// Removes a connection from both indexes.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(conn_id)?;
        if let Some(mut connections) = self.by_identity.get_mut(&handle.identity_id) {
            connections.retain(|c| c.id != *conn_id);
            if connections.is_empty() {
                drop(connections);
                self.by_identity.remove(&handle.identity_id);
            }
        }
        Some(handle)
    }

    /// Looks up a connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// All connections held by an identity.
    pub fn for_identity(&self, identity_id: IdentityId) -> Vec<Arc<ConnectionHandle>> {
        self.by_identity
            .get(&identity_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Total live connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Number of distinct connected identities.
    pub fn identity_count(&self) -> usize {
        self.by_identity.len()
    }
}
