//! Store traits implemented by each backend.
//!
//! Time is always passed in by the caller so that expiry behavior is
//! driven by the injected clock, never by the backend's wall clock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use keygate_core::result::AppResult;
use keygate_core::types::{IdentityId, SessionId};
use keygate_entity::identity::{CreateIdentity, Identity};
use keygate_entity::session::{CreateSession, SessionRecord, TokenKind};

/// Storage for identities.
#[async_trait]
pub trait IdentityStore: Send + Sync + std::fmt::Debug + 'static {
    /// Create an identity. Fails with a conflict error when the email is
    /// already bound to any identity, verified or not.
    async fn create(&self, data: CreateIdentity, now: DateTime<Utc>) -> AppResult<Identity>;

    /// Find an identity by id.
    async fn find_by_id(&self, id: IdentityId) -> AppResult<Option<Identity>>;

    /// Find an identity by normalized email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>>;

    /// Persist the mutable fields of an identity (password hash, verified
    /// flag, challenge fields, timestamps). The caller is responsible for
    /// setting `updated_at`.
    async fn update(&self, identity: &Identity) -> AppResult<Identity>;
}

/// Storage for session records.
///
/// Lookup and removal by token hash are atomic point operations; the
/// single-use refresh guarantee rests on [`remove_by_token_hash`]
/// handing the record to exactly one caller.
///
/// [`remove_by_token_hash`]: SessionStore::remove_by_token_hash
#[async_trait]
pub trait SessionStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new record. The store assigns the id; `created_at` is
    /// taken from the given `last_active_at`.
    async fn insert(&self, data: CreateSession) -> AppResult<SessionRecord>;

    /// Look up a record by token hash. A record found expired or
    /// invalidated is deleted immediately and reported as absent.
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SessionRecord>>;

    /// Atomically remove a record by token hash and return it. Exactly
    /// one of any set of concurrent callers observes the record; the
    /// rest observe `None`. The returned record may already be expired;
    /// callers must check before honoring it.
    async fn remove_by_token_hash(&self, token_hash: &str) -> AppResult<Option<SessionRecord>>;

    /// Remove a single record by id and return it. `None` when the
    /// record is already gone.
    async fn remove(&self, session_id: SessionId) -> AppResult<Option<SessionRecord>>;

    /// Remove all records for an identity, optionally scoped to a kind.
    /// Returns the number removed.
    async fn remove_for_identity(
        &self,
        identity_id: IdentityId,
        kind: Option<TokenKind>,
    ) -> AppResult<u64>;

    /// Count records for an identity, optionally scoped to a kind.
    async fn count_for_identity(
        &self,
        identity_id: IdentityId,
        kind: Option<TokenKind>,
    ) -> AppResult<u64>;

    /// Update a record's last-active instant. Missing records are not an
    /// error; the write is best-effort telemetry.
    async fn touch_activity(&self, session_id: SessionId, now: DateTime<Utc>) -> AppResult<()>;

    /// Remove every record past its absolute expiry. Returns the number
    /// removed.
    async fn remove_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}
