//! PostgreSQL identity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use keygate_core::error::{AppError, ErrorKind};
use keygate_core::result::AppResult;
use keygate_core::types::IdentityId;
use keygate_entity::identity::{CreateIdentity, Identity};

use crate::traits::IdentityStore;

/// Identity store backed by the `identities` table.
#[derive(Debug, Clone)]
pub struct PostgresIdentityStore {
    pool: PgPool,
}

impl PostgresIdentityStore {
    /// Create a new store over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PostgresIdentityStore {
    async fn create(&self, data: CreateIdentity, now: DateTime<Utc>) -> AppResult<Identity> {
        sqlx::query_as::<_, Identity>(
            "INSERT INTO identities (id, name, email, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $5) \
             RETURNING *",
        )
        .bind(IdentityId::new())
        .bind(&data.name)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("identities_email_key") =>
            {
                AppError::conflict("Email already in use")
            }
            _ => AppError::with_source(ErrorKind::Transient, "Failed to create identity", e),
        })
    }

    async fn find_by_id(&self, id: IdentityId) -> AppResult<Option<Identity>> {
        sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Transient, "Failed to find identity by id", e)
            })
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>> {
        sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Transient, "Failed to find identity by email", e)
            })
    }

    async fn update(&self, identity: &Identity) -> AppResult<Identity> {
        sqlx::query_as::<_, Identity>(
            "UPDATE identities SET name = $2, email = $3, password_hash = $4, verified = $5, \
                                   password_changed_at = $6, otp_hash = $7, otp_expires_at = $8, \
                                   otp_attempts = $9, otp_verified_at = $10, updated_at = $11 \
             WHERE id = $1 RETURNING *",
        )
        .bind(identity.id)
        .bind(&identity.name)
        .bind(&identity.email)
        .bind(&identity.password_hash)
        .bind(identity.verified)
        .bind(identity.password_changed_at)
        .bind(&identity.otp_hash)
        .bind(identity.otp_expires_at)
        .bind(identity.otp_attempts)
        .bind(identity.otp_verified_at)
        .bind(identity.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Transient, "Failed to update identity", e))?
        .ok_or_else(|| AppError::not_found(format!("Identity {} not found", identity.id)))
    }
}
