//! Cross-tab publish/subscribe messaging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// What a tab tells its siblings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TabPayload {
    /// The sending tab saw user interaction at `at`.
    Activity {
        /// The interaction instant being shared.
        at: DateTime<Utc>,
    },
    /// The sending tab signed out; siblings should follow.
    Logout {
        /// Why, e.g. `inactivity`.
        reason: String,
    },
}

/// One cross-tab message.
///
/// `sent_at` drives the staleness filter on receipt; `tab_id` identifies
/// the sender for diagnostics only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabEnvelope {
    /// Random id of the sending tab.
    pub tab_id: Uuid,
    /// When the message was published.
    pub sent_at: DateTime<Utc>,
    /// The message content.
    pub payload: TabPayload,
}

/// Fire-and-forget pub/sub channel scoped to one origin.
///
/// Delivery is unordered and unacknowledged; the coordinator is built to
/// tolerate lost and late messages. Unlike a browser broadcast channel,
/// the in-memory bus also delivers a tab's messages back to itself;
/// receipt handling is idempotent, so self-delivery is harmless.
pub trait TabChannel: Send + Sync + std::fmt::Debug + 'static {
    /// Publishes to every subscribed tab. Never blocks, never fails.
    fn publish(&self, envelope: TabEnvelope);

    /// Opens a subscription receiving messages published from now on.
    fn subscribe(&self) -> broadcast::Receiver<TabEnvelope>;
}

/// In-process bus over a tokio broadcast channel.
#[derive(Debug, Clone)]
pub struct MemoryTabBus {
    sender: broadcast::Sender<TabEnvelope>,
}

impl MemoryTabBus {
    /// Creates a bus with no subscribers.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self { sender }
    }
}

impl Default for MemoryTabBus {
    fn default() -> Self {
        Self::new()
    }
}

impl TabChannel for MemoryTabBus {
    fn publish(&self, envelope: TabEnvelope) {
        // A send with zero subscribers errors; that is fine here.
        let _ = self.sender.send(envelope);
    }

    fn subscribe(&self) -> broadcast::Receiver<TabEnvelope> {
        self.sender.subscribe()
    }
}
