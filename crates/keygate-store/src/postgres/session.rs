//! PostgreSQL session record store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use keygate_core::error::{AppError, ErrorKind};
use keygate_core::result::AppResult;
use keygate_core::types::{IdentityId, SessionId};
use keygate_entity::session::{CreateSession, SessionRecord, TokenKind};

use crate::traits::SessionStore;

/// Session store backed by the `session_records` table.
///
/// Single-use redemption relies on `DELETE ... RETURNING` visiting each
/// row exactly once under PostgreSQL's row locking.
#[derive(Debug, Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
}

impl PostgresSessionStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn insert(&self, data: CreateSession) -> AppResult<SessionRecord> {
        sqlx::query_as::<_, SessionRecord>(
            "INSERT INTO session_records \
                 (id, identity_id, token_hash, kind, platform, expires_at, last_active_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING *",
        )
        .bind(SessionId::new_v7())
        .bind(data.identity_id)
        .bind(&data.token_hash)
        .bind(data.kind)
        .bind(data.platform)
        .bind(data.expires_at)
        .bind(data.last_active_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Transient, "Failed to create session record", e)
        })
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SessionRecord>> {
        let record = sqlx::query_as::<_, SessionRecord>(
            "SELECT * FROM session_records WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Transient, "Failed to find session by token", e)
        })?;

        match record {
            Some(record) if record.is_live(now) => Ok(Some(record)),
            Some(record) => {
                sqlx::query("DELETE FROM session_records WHERE id = $1")
                    .bind(record.id)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        AppError::with_source(
                            ErrorKind::Transient,
                            "Failed to delete dead session record",
                            e,
                        )
                    })?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove_by_token_hash(&self, token_hash: &str) -> AppResult<Option<SessionRecord>> {
        sqlx::query_as::<_, SessionRecord>(
            "DELETE FROM session_records WHERE token_hash = $1 RETURNING *",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Transient, "Failed to remove session by token", e)
        })
    }

    async fn remove(&self, session_id: SessionId) -> AppResult<Option<SessionRecord>> {
        sqlx::query_as::<_, SessionRecord>("DELETE FROM session_records WHERE id = $1 RETURNING *")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Transient, "Failed to remove session by id", e)
            })
    }

    async fn remove_for_identity(
        &self,
        identity_id: IdentityId,
        kind: Option<TokenKind>,
    ) -> AppResult<u64> {
        let result = match kind {
            Some(kind) => {
                sqlx::query("DELETE FROM session_records WHERE identity_id = $1 AND kind = $2")
                    .bind(identity_id)
                    .bind(kind)
                    .execute(&self.pool)
                    .await
            }
            None => {
                sqlx::query("DELETE FROM session_records WHERE identity_id = $1")
                    .bind(identity_id)
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(|e| {
            AppError::with_source(ErrorKind::Transient, "Failed to remove identity sessions", e)
        })?;

        Ok(result.rows_affected())
    }

    async fn count_for_identity(
        &self,
        identity_id: IdentityId,
        kind: Option<TokenKind>,
    ) -> AppResult<u64> {
        let count: i64 = match kind {
            Some(kind) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM session_records WHERE identity_id = $1 AND kind = $2",
                )
                .bind(identity_id)
                .bind(kind)
                .fetch_one(&self.pool)
                .await
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM session_records WHERE identity_id = $1")
                    .bind(identity_id)
                    .fetch_one(&self.pool)
                    .await
            }
        }
        .map_err(|e| {
            AppError::with_source(ErrorKind::Transient, "Failed to count identity sessions", e)
        })?;

        Ok(count as u64)
    }

    async fn touch_activity(&self, session_id: SessionId, now: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE session_records SET last_active_at = $2 WHERE id = $1")
            .bind(session_id)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Transient, "Failed to update last activity", e)
            })?;
        Ok(())
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM session_records WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Transient, "Failed to sweep expired sessions", e)
            })?;

        Ok(result.rows_affected())
    }
}
