//! A single WebSocket connection.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use keygate_core::types::{IdentityId, SessionId};

use crate::limiter::{FixedWindowLimiter, RateDecision};
use crate::message::ServerEvent;

/// Unique connection identifier.
pub type ConnectionId = Uuid;

/// Handle to one live WebSocket connection.
///
/// Holds the sender half of the connection's outbound channel plus the
/// identity and session it authenticated as. The socket task owns the
/// receiver half and writes events to the wire.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID.
    pub id: ConnectionId,
    /// Identity this connection authenticated as.
    pub identity_id: IdentityId,
    /// Session backing the access token presented at upgrade.
    pub session_id: SessionId,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    sender: mpsc::Sender<ServerEvent>,
    limiter: FixedWindowLimiter,
    alive: AtomicBool,
}

impl ConnectionHandle {
    pub(crate) fn new(
        identity_id: IdentityId,
        session_id: SessionId,
        sender: mpsc::Sender<ServerEvent>,
        limiter: FixedWindowLimiter,
        connected_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity_id,
            session_id,
            connected_at,
            sender,
            limiter,
            alive: AtomicBool::new(true),
        }
    }

    /// Queues an event for delivery to this connection.
    ///
    /// Never blocks. A full buffer drops the event for this connection
    /// only; a closed receiver marks the connection dead. Returns whether
    /// the event was queued.
    pub fn push(&self, event: ServerEvent) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id = %self.id, "Send buffer full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Counts one inbound frame against this connection's rate budget.
    pub fn admit_inbound(&self) -> RateDecision {
        self.limiter.admit()
    }

    /// Whether the connection is still usable.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Marks the connection unusable. The pool entry is removed by
    /// `unregister` when the socket task exits.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
