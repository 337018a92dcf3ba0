//! # keygate-client
//!
//! The client-resident half of Keygate session upkeep: detects, across
//! every tab open for one origin, when the human has stopped
//! interacting, and triggers a single coordinated logout.
//!
//! The crate is transport-agnostic at its seams: [`ActivityStore`]
//! abstracts the origin-scoped storage all tabs share, [`TabChannel`]
//! the fire-and-forget message bus between them. In-memory
//! implementations back tests and single-process native clients;
//! browser embeddings supply local storage and a broadcast channel.

pub mod activity;
pub mod channel;
pub mod coordinator;

pub use activity::{ActivityStore, LAST_ACTIVITY_KEY, MemoryActivityStore};
pub use channel::{MemoryTabBus, TabChannel, TabEnvelope, TabPayload};
pub use coordinator::{CoordinatorHooks, InactivityCoordinator, LOGOUT_REASON_INACTIVITY};
