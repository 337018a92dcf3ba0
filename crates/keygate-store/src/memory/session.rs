//! In-memory session record store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use keygate_core::result::AppResult;
use keygate_core::types::{IdentityId, SessionId};
use keygate_entity::session::{CreateSession, SessionRecord, TokenKind};

use crate::traits::SessionStore;

/// Session store backed by a concurrent in-process map keyed by token
/// hash.
///
/// `DashMap::remove` hands the record to exactly one caller, which is
/// what makes refresh redemption single-use on this backend. Scans for
/// per-identity operations iterate the whole map; record counts stay
/// small enough that an index is not worth its consistency burden.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: DashMap<String, SessionRecord>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn in_scope(record: &SessionRecord, identity_id: IdentityId, kind: Option<TokenKind>) -> bool {
        record.identity_id == identity_id && kind.is_none_or(|k| record.kind == k)
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, data: CreateSession) -> AppResult<SessionRecord> {
        let record = SessionRecord {
            id: SessionId::new_v7(),
            identity_id: data.identity_id,
            token_hash: data.token_hash,
            kind: data.kind,
            platform: data.platform,
            valid: true,
            expires_at: data.expires_at,
            last_active_at: data.last_active_at,
            created_at: data.last_active_at,
        };
        self.records
            .insert(record.token_hash.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_token_hash(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<SessionRecord>> {
        // Clone out of the guard before any removal; removing while the
        // read guard is alive would deadlock on the shard lock.
        let found = self.records.get(token_hash).map(|entry| entry.clone());
        match found {
            Some(record) if record.is_live(now) => Ok(Some(record)),
            Some(_) => {
                self.records.remove(token_hash);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn remove_by_token_hash(&self, token_hash: &str) -> AppResult<Option<SessionRecord>> {
        Ok(self.records.remove(token_hash).map(|(_, record)| record))
    }

    async fn remove(&self, session_id: SessionId) -> AppResult<Option<SessionRecord>> {
        let key = self
            .records
            .iter()
            .find(|entry| entry.value().id == session_id)
            .map(|entry| entry.key().clone());
        match key {
            Some(key) => Ok(self.records.remove(&key).map(|(_, record)| record)),
            None => Ok(None),
        }
    }

    async fn remove_for_identity(
        &self,
        identity_id: IdentityId,
        kind: Option<TokenKind>,
    ) -> AppResult<u64> {
        let keys: Vec<String> = self
            .records
            .iter()
            .filter(|entry| Self::in_scope(entry.value(), identity_id, kind))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0u64;
        for key in keys {
            if self.records.remove(&key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn count_for_identity(
        &self,
        identity_id: IdentityId,
        kind: Option<TokenKind>,
    ) -> AppResult<u64> {
        let count = self
            .records
            .iter()
            .filter(|entry| Self::in_scope(entry.value(), identity_id, kind))
            .count();
        Ok(count as u64)
    }

    async fn touch_activity(&self, session_id: SessionId, now: DateTime<Utc>) -> AppResult<()> {
        if let Some(mut entry) = self
            .records
            .iter_mut()
            .find(|entry| entry.value().id == session_id)
        {
            entry.value_mut().last_active_at = now;
        }
        Ok(())
    }

    async fn remove_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let keys: Vec<String> = self
            .records
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0u64;
        for key in keys {
            if self.records.remove(&key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}
