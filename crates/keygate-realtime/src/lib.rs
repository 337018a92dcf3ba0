//! # keygate-realtime
//!
//! WebSocket push engine for Keygate. Connections authenticate with an
//! access token at upgrade, auto-join their identity group, and may
//! subscribe to resource groups. Emission is fire-and-forget: a push
//! never fails the operation that triggered it.
//!
//! ## Modules
//!
//! - `connection` — per-connection handles and the pool indexing them
//! - `groups` — named fan-out groups with a reverse membership index
//! - `limiter` — fixed-window inbound rate limiting
//! - `message` — serde-tagged wire events
//! - `notifier` — the engine itself

pub mod connection;
pub mod groups;
pub mod limiter;
pub mod message;
pub mod notifier;

pub use connection::{ConnectionHandle, ConnectionId, ConnectionPool};
pub use groups::identity_group;
pub use limiter::{FixedWindowLimiter, RateDecision};
pub use message::{ClientEvent, ExpiryReason, ServerEvent};
pub use notifier::RealtimeNotifier;
