//! The rotating dual-token protocol.
//!
//! Every sign-in yields a pair: a short-lived signed access token and a
//! long-lived opaque refresh token backed by a session record. Redeeming
//! the refresh token atomically retires its record and issues a fresh
//! pair, so each refresh value works exactly once.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use keygate_core::config::auth::AuthConfig;
use keygate_core::error::AppError;
use keygate_core::result::AppResult;
use keygate_core::traits::Clock;
use keygate_core::types::{IdentityId, SessionId};
use keygate_entity::identity::Identity;
use keygate_entity::session::{CreateSession, Platform, SessionRecord, TokenKind};
use keygate_store::{IdentityStore, SessionStore};

use crate::jwt::{AccessClaims, JwtDecoder, JwtEncoder};

/// Generate a cryptographically random opaque token value
/// (32 bytes, base64url-encoded, no padding).
pub fn generate_opaque_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest of an opaque token value.
///
/// This is the only form a refresh token is ever stored in.
pub fn hash_opaque_token(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// A freshly issued token pair.
#[derive(Debug, Clone)]
pub struct IssuedTokens {
    /// Signed access token.
    pub access_token: String,
    /// Access token expiry instant.
    pub access_expires_at: DateTime<Utc>,
    /// Raw opaque refresh token. Handed to the client once; only its
    /// hash survives in the store.
    pub refresh_token: String,
    /// Refresh token expiry instant.
    pub refresh_expires_at: DateTime<Utc>,
    /// The session record backing the refresh token.
    pub session: SessionRecord,
}

/// Verified request identity, produced by access token verification.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The authenticated identity.
    pub identity: Identity,
    /// The verified claims.
    pub claims: AccessClaims,
}

/// Issues, rotates, verifies, and revokes token pairs.
#[derive(Clone)]
pub struct TokenService {
    identities: Arc<dyn IdentityStore>,
    sessions: Arc<dyn SessionStore>,
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    clock: Arc<dyn Clock>,
    refresh_ttl_seconds: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish()
    }
}

impl TokenService {
    /// Creates a new token service with its collaborators.
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        sessions: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            identities,
            sessions,
            encoder: JwtEncoder::new(config),
            decoder: JwtDecoder::new(config),
            clock,
            refresh_ttl_seconds: config.refresh_ttl_seconds as i64,
        }
    }

    /// Issues a fresh token pair for an identity.
    ///
    /// Creates the backing session record, then mints the access token
    /// bound to it via the `sid` claim.
    pub async fn issue(&self, identity: &Identity, platform: Platform) -> AppResult<IssuedTokens> {
        let now = self.clock.now();

        let refresh_token = generate_opaque_token();
        let session = self
            .sessions
            .insert(CreateSession {
                identity_id: identity.id,
                token_hash: hash_opaque_token(&refresh_token),
                kind: TokenKind::Refresh,
                platform,
                expires_at: now + Duration::seconds(self.refresh_ttl_seconds),
                last_active_at: now,
            })
            .await?;

        let (access_token, access_expires_at) =
            self.encoder
                .generate_access_token(identity.id, session.id, now)?;

        info!(
            identity_id = %identity.id,
            session_id = %session.id,
            platform = %session.platform,
            "Issued token pair"
        );

        Ok(IssuedTokens {
            access_token,
            access_expires_at,
            refresh_token,
            refresh_expires_at: session.expires_at,
            session,
        })
    }

    /// Redeems a refresh token, rotating it.
    ///
    /// The presented value's record is atomically removed before any new
    /// tokens are minted, so concurrent redemptions of the same value
    /// race for the record and exactly one wins. The losers, and any
    /// later replay, get an invalid-credentials error.
    pub async fn refresh(&self, presented: &str) -> AppResult<(Identity, IssuedTokens)> {
        let now = self.clock.now();
        let hash = hash_opaque_token(presented);

        // Step 1: Take the record. After this point the old value is
        // dead regardless of how the rest of the flow goes.
        let record = self
            .sessions
            .remove_by_token_hash(&hash)
            .await?
            .ok_or_else(|| AppError::invalid_credentials("Unknown refresh token"))?;

        // Step 2: The take returns expired and invalidated records too;
        // they are consumed but not honored.
        if record.kind != TokenKind::Refresh {
            warn!(
                session_id = %record.id,
                kind = %record.kind,
                "Non-refresh token presented for rotation"
            );
            return Err(AppError::invalid_credentials("Unknown refresh token"));
        }
        if !record.is_live(now) {
            return Err(AppError::invalid_credentials("Refresh token has expired"));
        }

        // Step 3: The identity must still exist.
        let identity = self
            .identities
            .find_by_id(record.identity_id)
            .await?
            .ok_or_else(|| AppError::invalid_credentials("Identity no longer exists"))?;

        // Step 4: Issue the replacement pair on the same platform.
        let tokens = self.issue(&identity, record.platform).await?;

        info!(
            identity_id = %identity.id,
            retired_session = %record.id,
            new_session = %tokens.session.id,
            "Rotated refresh token"
        );

        Ok((identity, tokens))
    }

    /// Verifies an access token and resolves its identity.
    ///
    /// Signature and expiry are checked first, then the identity is
    /// loaded and the token's issued-at instant compared against the
    /// last password change. A token minted before that change is
    /// rejected as stale even though it is cryptographically sound.
    pub async fn verify_access(&self, token: &str) -> AppResult<AuthContext> {
        let now = self.clock.now();
        let claims = self.decoder.decode_access_token(token, now)?;

        let identity = self
            .identities
            .find_by_id(claims.identity_id())
            .await?
            .ok_or_else(|| AppError::invalid_credentials("Identity no longer exists"))?;

        if identity.is_token_stale(claims.issued_at()) {
            return Err(AppError::stale_credential(
                "Access token predates the last password change",
            ));
        }

        Ok(AuthContext { identity, claims })
    }

    /// Revokes every outstanding refresh token for an identity.
    ///
    /// Returns the number of records removed. Outstanding access tokens
    /// are not recalled; they age out within their own TTL.
    pub async fn revoke(&self, identity_id: IdentityId) -> AppResult<u64> {
        let removed = self
            .sessions
            .remove_for_identity(identity_id, Some(TokenKind::Refresh))
            .await?;
        info!(%identity_id, removed, "Revoked all refresh tokens");
        Ok(removed)
    }

    /// Revokes the single session behind a presented refresh token.
    ///
    /// Idempotent: an unknown or already-removed value reports `false`
    /// rather than an error, so logout never fails on a dead cookie.
    pub async fn revoke_one(&self, presented: &str) -> AppResult<bool> {
        let hash = hash_opaque_token(presented);
        match self.sessions.remove_by_token_hash(&hash).await? {
            Some(record) => {
                info!(
                    identity_id = %record.identity_id,
                    session_id = %record.id,
                    "Revoked session"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Revokes a session by its id.
    ///
    /// Used when the caller holds verified access claims but no refresh
    /// cookie; the `sid` claim names the record backing the pair.
    pub async fn revoke_session(&self, session_id: SessionId) -> AppResult<bool> {
        match self.sessions.remove(session_id).await? {
            Some(record) => {
                info!(
                    identity_id = %record.identity_id,
                    session_id = %record.id,
                    "Revoked session"
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Looks up the live session backing a presented refresh token
    /// without consuming it.
    pub async fn peek_session(&self, presented: &str) -> AppResult<Option<SessionRecord>> {
        let hash = hash_opaque_token(presented);
        self.sessions
            .find_by_token_hash(&hash, self.clock.now())
            .await
    }

    /// Best-effort update of a session's last-active instant.
    pub async fn touch_session(&self, session_id: SessionId) -> AppResult<()> {
        self.sessions
            .touch_activity(session_id, self.clock.now())
            .await
    }
}
