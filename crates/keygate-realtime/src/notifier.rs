//! The push engine: connection lifecycle, group fan-out, inbound dispatch.

use std::sync::Arc;

use chrono::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use keygate_core::config::realtime::RealtimeConfig;
use keygate_core::traits::Clock;
use keygate_core::types::{IdentityId, SessionId};

use crate::connection::{ConnectionHandle, ConnectionId, ConnectionPool};
use crate::groups::{GroupRegistry, IDENTITY_GROUP_PREFIX, identity_group};
use crate::limiter::{FixedWindowLimiter, RateDecision};
use crate::message::{ClientEvent, ExpiryReason, ServerEvent};

/// Pushes server events to connected clients.
///
/// An explicitly constructed instance owning its own maps; several
/// isolated instances can coexist in one process. Emission never fails:
/// transport trouble is absorbed and reflected only in the reached
/// count, because a push must not fail the business operation that
/// triggered it.
#[derive(Debug)]
pub struct RealtimeNotifier {
    pool: Arc<ConnectionPool>,
    groups: Arc<GroupRegistry>,
    clock: Arc<dyn Clock>,
    config: RealtimeConfig,
}

impl RealtimeNotifier {
    /// Creates a notifier with no connections.
    pub fn new(clock: Arc<dyn Clock>, config: &RealtimeConfig) -> Self {
        Self {
            pool: Arc::new(ConnectionPool::new()),
            groups: Arc::new(GroupRegistry::new()),
            clock,
            config: config.clone(),
        }
    }

    /// Registers an authenticated connection.
    ///
    /// The connection auto-joins its identity group. Returns the handle
    /// and the receiver half the socket task drains to the wire.
    pub fn register(
        &self,
        identity_id: IdentityId,
        session_id: SessionId,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(self.config.send_buffer);
        let limiter = FixedWindowLimiter::new(
            self.clock.clone(),
            self.config.events_per_minute,
            Duration::minutes(1),
        );
        let handle = Arc::new(ConnectionHandle::new(
            identity_id,
            session_id,
            tx,
            limiter,
            self.clock.now(),
        ));

        self.pool.add(handle.clone());
        self.groups.join(&identity_group(identity_id), handle.id);

        info!(
            conn_id = %handle.id,
            identity_id = %identity_id,
            session_id = %session_id,
            "WebSocket connection registered"
        );

        (handle, rx)
    }

    /// Unregisters a connection and leaves all its groups.
    pub fn unregister(&self, conn_id: &ConnectionId) {
        if let Some(handle) = self.pool.remove(conn_id) {
            handle.mark_dead();
            self.groups.leave_all(*conn_id);
            info!(
                conn_id = %conn_id,
                identity_id = %handle.identity_id,
                "WebSocket connection unregistered"
            );
        }
    }

    /// Processes one raw inbound frame from a client.
    ///
    /// Frames beyond the connection's rate budget are dropped with a
    /// warning; the connection stays open. Unparseable frames are
    /// dropped silently apart from a debug line.
    pub fn handle_inbound(&self, conn_id: &ConnectionId, raw: &str) {
        let Some(handle) = self.pool.get(conn_id) else {
            warn!(conn_id = %conn_id, "Frame from unknown connection");
            return;
        };

        if handle.admit_inbound() == RateDecision::Limited {
            warn!(conn_id = %conn_id, "Inbound rate limit exceeded, dropping frame");
            return;
        }

        let event: ClientEvent = match serde_json::from_str(raw) {
            Ok(event) => event,
            Err(e) => {
                debug!(conn_id = %conn_id, error = %e, "Unparseable frame dropped");
                return;
            }
        };

        match event {
            ClientEvent::Subscribe { group } => {
                // Identity groups are join-by-authentication only.
                if group.starts_with(IDENTITY_GROUP_PREFIX) {
                    debug!(conn_id = %conn_id, "Refused subscription to identity-scoped group");
                    return;
                }
                self.groups.join(&group, handle.id);
                handle.push(ServerEvent::Subscribed { group });
            }
            ClientEvent::Unsubscribe { group } => {
                self.groups.leave(&group, handle.id);
            }
            ClientEvent::Ping => {
                handle.push(ServerEvent::Pong);
            }
        }
    }

    /// Fans an event out to every member of a group.
    ///
    /// Returns the number of connections the event was queued for. Dead
    /// connections and full buffers reduce the count instead of raising
    /// an error.
    pub fn emit(&self, event: &ServerEvent, group: &str) -> usize {
        let mut reached = 0;
        for conn_id in self.groups.members(group) {
            if let Some(handle) = self.pool.get(&conn_id) {
                if handle.push(event.clone()) {
                    reached += 1;
                }
            }
        }
        reached
    }

    /// Tells every connection of an identity that its session expired.
    pub fn emit_session_expired(&self, identity_id: IdentityId, reason: ExpiryReason) -> usize {
        let reached = self.emit(
            &ServerEvent::SessionExpired { reason },
            &identity_group(identity_id),
        );
        info!(identity_id = %identity_id, reason = %reason, reached, "Pushed session_expired");
        reached
    }

    /// Demands an immediate sign-out from every connection of an identity.
    pub fn emit_force_logout(&self, identity_id: IdentityId, reason: ExpiryReason) -> usize {
        let reached = self.emit(
            &ServerEvent::ForceLogout { reason },
            &identity_group(identity_id),
        );
        info!(identity_id = %identity_id, reason = %reason, reached, "Pushed force_logout");
        reached
    }

    /// Reports one-time-code progress to every connection of an identity.
    ///
    /// Verification happens before sign-in on most flows, so reaching
    /// zero connections is the common case and not an error.
    pub fn emit_otp_status(&self, identity_id: IdentityId, status: &str) -> usize {
        let reached = self.emit(
            &ServerEvent::OtpStatus {
                status: status.to_string(),
            },
            &identity_group(identity_id),
        );
        debug!(identity_id = %identity_id, status, reached, "Pushed otp_status");
        reached
    }

    /// Total live connections.
    pub fn connection_count(&self) -> usize {
        self.pool.connection_count()
    }
}
