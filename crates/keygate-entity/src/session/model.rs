//! Session record entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use keygate_core::types::{IdentityId, SessionId};

use super::kind::TokenKind;
use super::platform::Platform;

/// The durable record backing one outstanding opaque token.
///
/// Created at sign-in or rotation, deleted at logout, expiry, rotation,
/// or bulk revocation. A refresh record is single-use: redeeming it
/// removes it and a replacement with a fresh token value takes its place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionRecord {
    /// Unique record identifier (UUID v7, time-ordered).
    pub id: SessionId,
    /// The identity this record belongs to.
    pub identity_id: IdentityId,
    /// SHA-256 hex digest of the opaque token value. The raw value is
    /// returned to the client once and never stored.
    pub token_hash: String,
    /// What the stored token is for.
    pub kind: TokenKind,
    /// Device class the session was opened from.
    pub platform: Platform,
    /// Record validity. True at creation; a record found invalid at
    /// lookup is treated as absent and deleted.
    pub valid: bool,
    /// Absolute expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Last activity timestamp, updated best-effort.
    pub last_active_at: DateTime<Utc>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Whether the record has passed its absolute expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Whether the record may still be redeemed at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.valid && !self.is_expired(now)
    }

    /// Seconds since the last recorded activity at `now`.
    pub fn idle_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_active_at).num_seconds().max(0)
    }
}

/// Data required to create a new session record. The store assigns the
/// id and the created-at instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    /// The identity the record belongs to.
    pub identity_id: IdentityId,
    /// SHA-256 hex digest of the opaque token value.
    pub token_hash: String,
    /// What the stored token is for.
    pub kind: TokenKind,
    /// Device class.
    pub platform: Platform,
    /// Absolute expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Initial activity timestamp (normally the creation instant).
    pub last_active_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(now: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: SessionId::new_v7(),
            identity_id: IdentityId::new(),
            token_hash: "deadbeef".to_string(),
            kind: TokenKind::Refresh,
            platform: Platform::Desktop,
            valid: true,
            expires_at: now + Duration::days(7),
            last_active_at: now,
            created_at: now,
        }
    }

    #[test]
    fn test_live_until_expiry() {
        let now = Utc::now();
        let record = record(now);
        assert!(record.is_live(now));
        assert!(record.is_expired(now + Duration::days(8)));
        assert!(!record.is_live(now + Duration::days(8)));
    }

    #[test]
    fn test_invalidated_record_is_not_live() {
        let now = Utc::now();
        let mut record = record(now);
        record.valid = false;
        assert!(!record.is_live(now));
    }

    #[test]
    fn test_idle_seconds_never_negative() {
        let now = Utc::now();
        let record = record(now);
        assert_eq!(record.idle_seconds(now - Duration::seconds(30)), 0);
        assert_eq!(record.idle_seconds(now + Duration::seconds(30)), 30);
    }
}
