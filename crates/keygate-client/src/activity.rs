//! Shared last-activity storage.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Storage key for the shared last-activity timestamp.
pub const LAST_ACTIVITY_KEY: &str = "keygate:last_activity";

/// Origin-scoped storage every tab can read and write.
///
/// Browser embeddings back this with local storage; the in-memory
/// implementation serves tests and single-process native clients.
pub trait ActivityStore: Send + Sync + std::fmt::Debug + 'static {
    /// The shared last-activity instant, if one was ever recorded.
    fn load_last_activity(&self) -> Option<DateTime<Utc>>;

    /// Overwrites the shared last-activity instant.
    fn store_last_activity(&self, at: DateTime<Utc>);
}

/// Keyed in-memory storage shared by reference.
#[derive(Debug, Default)]
pub struct MemoryActivityStore {
    values: DashMap<String, DateTime<Utc>>,
}

impl MemoryActivityStore {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }
}

impl ActivityStore for MemoryActivityStore {
    fn load_last_activity(&self) -> Option<DateTime<Utc>> {
        self.values.get(LAST_ACTIVITY_KEY).map(|entry| *entry.value())
    }

    fn store_last_activity(&self, at: DateTime<Utc>) {
        self.values.insert(LAST_ACTIVITY_KEY.to_string(), at);
    }
}
