//! Access token creation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use keygate_core::config::auth::AuthConfig;
use keygate_core::error::AppError;
use keygate_core::types::{IdentityId, SessionId};

use super::claims::{AccessClaims, TokenType};

/// Creates signed HS256 access tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    /// HMAC secret key for signing.
    encoding_key: EncodingKey,
    /// Access token TTL in seconds.
    access_ttl_seconds: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl_seconds: config.access_ttl_seconds as i64,
        }
    }

    /// Mints an access token for the given identity and session at `now`.
    ///
    /// Returns the token string and its expiry instant.
    pub fn generate_access_token(
        &self,
        identity_id: IdentityId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), AppError> {
        let expires_at = now + Duration::seconds(self.access_ttl_seconds);

        let claims = AccessClaims {
            sub: identity_id,
            sid: session_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4(),
            token_type: TokenType::Access,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))?;

        Ok((token, expires_at))
    }
}
