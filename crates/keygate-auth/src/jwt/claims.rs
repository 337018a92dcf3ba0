//! Claims embedded in every signed access token.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use keygate_core::types::{IdentityId, SessionId};

/// Claims payload of an access token.
///
/// The issued-at instant doubles as the staleness reference: tokens
/// whose `iat` predates the identity's last password change are
/// rejected even though their signature and expiry are fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject, the identity ID.
    pub sub: IdentityId,
    /// Session record the token was minted alongside.
    pub sid: SessionId,
    /// Issued-at (seconds since epoch).
    pub iat: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    /// Unique token ID.
    pub jti: Uuid,
    /// Token type marker. Any JWT carrying a different marker fails
    /// deserialization and is rejected as malformed.
    pub token_type: TokenType,
}

/// Type marker claim. Only access tokens are issued as JWTs; refresh
/// tokens are opaque random values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Short-lived bearer token for API requests.
    Access,
}

impl AccessClaims {
    /// The identity this token authenticates.
    pub fn identity_id(&self) -> IdentityId {
        self.sub
    }

    /// The session record the token belongs to.
    pub fn session_id(&self) -> SessionId {
        self.sid
    }

    /// The issued-at instant as a `DateTime<Utc>`.
    pub fn issued_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.iat, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// The expiration instant as a `DateTime<Utc>`.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_serializes_lowercase() {
        let json = serde_json::to_string(&TokenType::Access).unwrap();
        assert_eq!(json, "\"access\"");
    }

    #[test]
    fn test_unknown_token_type_rejected() {
        let result = serde_json::from_str::<TokenType>("\"refresh\"");
        assert!(result.is_err());
    }
}
