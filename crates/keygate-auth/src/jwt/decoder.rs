//! Access token validation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use keygate_core::config::auth::AuthConfig;
use keygate_core::error::AppError;

use super::claims::AccessClaims;

/// Clock skew tolerance when checking expiry.
const LEEWAY_SECONDS: i64 = 5;

/// Validates access token signatures and expiry.
///
/// Expiry is checked against the instant passed by the caller, not the
/// wall clock, so the whole token lifecycle runs on one injected clock.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Signature validation settings.
    validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is enforced below against the injected clock; the claim
        // must still be present.
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token at `now`.
    ///
    /// Checks signature, structure, the token type marker, and expiry
    /// with a small leeway for clock skew. All failures surface as
    /// invalid-credentials so callers cannot distinguish a forged token
    /// from an expired one.
    pub fn decode_access_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessClaims, AppError> {
        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AppError::invalid_credentials("Invalid token format")
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AppError::invalid_credentials("Invalid token signature")
                }
                _ => AppError::invalid_credentials(format!("Token validation failed: {e}")),
            })?;

        let claims = token_data.claims;
        if now.timestamp() > claims.exp + LEEWAY_SECONDS {
            return Err(AppError::invalid_credentials("Access token has expired"));
        }

        Ok(claims)
    }
}
