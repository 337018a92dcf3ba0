//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Inbound events allowed per connection per rolling minute. Past the
    /// limit, frames are dropped (the connection stays open).
    #[serde(default = "default_events_per_minute")]
    pub events_per_minute: u32,
    /// Per-connection outbound channel buffer size. A full buffer drops
    /// the message for that connection instead of blocking the emitter.
    #[serde(default = "default_send_buffer")]
    pub send_buffer: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            events_per_minute: default_events_per_minute(),
            send_buffer: default_send_buffer(),
        }
    }
}

fn default_events_per_minute() -> u32 {
    100
}

fn default_send_buffer() -> usize {
    64
}
