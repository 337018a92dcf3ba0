//! Wire-level event definitions for the WebSocket channel.

use serde::{Deserialize, Serialize};

/// Why a session was ended from the server side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryReason {
    /// No user interaction within the inactivity threshold.
    Inactivity,
    /// The access token reached its TTL without renewal.
    TokenExpired,
    /// An operator or security event ended the session.
    Security,
}

impl std::fmt::Display for ExpiryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inactivity => write!(f, "inactivity"),
            Self::TokenExpired => write!(f, "token_expired"),
            Self::Security => write!(f, "security"),
        }
    }
}

/// Events pushed from the server to a connected client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// The client's session expired; the client should sign the user out.
    SessionExpired {
        /// Why the session ended.
        reason: ExpiryReason,
    },
    /// The server demands an immediate sign-out on every device.
    ForceLogout {
        /// Why the logout was forced.
        reason: ExpiryReason,
    },
    /// Progress of an out-of-band code delivery.
    OtpStatus {
        /// Delivery status, e.g. `sent`.
        status: String,
    },
    /// A group subscription was accepted.
    Subscribed {
        /// The group that was joined.
        group: String,
    },
    /// Reply to a client ping.
    Pong,
}

/// Events a client may send to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Join a resource group.
    Subscribe {
        /// Group name, e.g. `resource:abc`.
        group: String,
    },
    /// Leave a resource group.
    Unsubscribe {
        /// Group name.
        group: String,
    },
    /// Keep-alive probe; answered with `pong`.
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_event_wire_shape() {
        let json = serde_json::to_value(ServerEvent::SessionExpired {
            reason: ExpiryReason::Inactivity,
        })
        .unwrap();
        assert_eq!(json["type"], "session_expired");
        assert_eq!(json["reason"], "inactivity");

        let json = serde_json::to_value(ServerEvent::Pong).unwrap();
        assert_eq!(json["type"], "pong");
    }

    #[test]
    fn test_client_event_parses() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"subscribe","group":"resource:7"}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::Subscribe {
                group: "resource:7".to_string()
            }
        );

        let event: ClientEvent = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(event, ClientEvent::Ping);
    }

    #[test]
    fn test_unknown_client_event_rejected() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"type":"shutdown"}"#).is_err());
    }
}
