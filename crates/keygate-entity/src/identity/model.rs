//! Identity entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use keygate_core::types::IdentityId;

/// Normalize an email address for uniqueness checks and storage.
///
/// Applied before every lookup and insert so `" Ada@X.com "` and
/// `"ada@x.com"` refer to the same identity.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A registered principal.
///
/// The one-time-code challenge is embedded: at most one challenge is
/// pending per identity, and arming a new one overwrites the old. All
/// challenge fields are cleared together on verification or consumption.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Identity {
    /// Unique identity identifier.
    pub id: IdentityId,
    /// Display name.
    pub name: String,
    /// Normalized (trimmed, lowercased) unique email address.
    pub email: String,
    /// Argon2id password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Whether the email has been confirmed via OTP.
    pub verified: bool,
    /// Set on password reset; access tokens issued before this instant
    /// are rejected as stale.
    pub password_changed_at: Option<DateTime<Utc>>,
    /// Argon2id hash of the pending one-time code, if any.
    #[serde(skip_serializing)]
    pub otp_hash: Option<String>,
    /// When the pending challenge expires.
    pub otp_expires_at: Option<DateTime<Utc>>,
    /// Failed verification attempts against the pending challenge.
    pub otp_attempts: i32,
    /// When the last OTP verification succeeded. Gates password reset.
    pub otp_verified_at: Option<DateTime<Utc>>,
    /// When the identity was created.
    pub created_at: DateTime<Utc>,
    /// When the identity was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Whether a one-time-code challenge is currently pending.
    pub fn has_challenge(&self) -> bool {
        self.otp_hash.is_some()
    }

    /// Whether the pending challenge has passed its expiry at `now`.
    /// Returns `false` when no challenge is pending.
    pub fn challenge_expired(&self, now: DateTime<Utc>) -> bool {
        match self.otp_expires_at {
            Some(expires_at) => expires_at <= now,
            None => false,
        }
    }

    /// Whether a password reset is currently permitted: a successful OTP
    /// verification was recorded within the reset window.
    pub fn reset_ready(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.otp_verified_at {
            Some(verified_at) => now - verified_at <= window,
            None => false,
        }
    }

    /// Whether a token issued at `issued_at` predates the last password
    /// change and must be rejected as stale.
    pub fn is_token_stale(&self, issued_at: DateTime<Utc>) -> bool {
        match self.password_changed_at {
            Some(changed_at) => issued_at < changed_at,
            None => false,
        }
    }
}

/// Data required to create a new identity. The store assigns the id,
/// timestamps, and initial flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIdentity {
    /// Display name.
    pub name: String,
    /// Already-normalized email address.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
}

/// The outward-facing view of an identity, safe to serialize in API
/// responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProjection {
    /// Unique identity identifier.
    pub id: IdentityId,
    /// Display name.
    pub name: String,
    /// Normalized email address.
    pub email: String,
    /// Whether the email has been confirmed.
    pub verified: bool,
}

impl From<&Identity> for IdentityProjection {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id,
            name: identity.name.clone(),
            email: identity.email.clone(),
            verified: identity.verified,
        }
    }
}
