//! In-memory identity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use keygate_core::error::AppError;
use keygate_core::result::AppResult;
use keygate_core::types::IdentityId;
use keygate_entity::identity::{CreateIdentity, Identity};

use crate::traits::IdentityStore;

/// Identity store backed by concurrent in-process maps.
///
/// The email index shard lock makes create-with-duplicate-check atomic,
/// so two concurrent registrations for the same address cannot both
/// succeed.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    identities: DashMap<IdentityId, Identity>,
    by_email: DashMap<String, IdentityId>,
}

impl MemoryIdentityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn create(&self, data: CreateIdentity, now: DateTime<Utc>) -> AppResult<Identity> {
        match self.by_email.entry(data.email.clone()) {
            Entry::Occupied(_) => Err(AppError::conflict("Email already in use")),
            Entry::Vacant(slot) => {
                let identity = Identity {
                    id: IdentityId::new(),
                    name: data.name,
                    email: data.email,
                    password_hash: data.password_hash,
                    verified: false,
                    password_changed_at: None,
                    otp_hash: None,
                    otp_expires_at: None,
                    otp_attempts: 0,
                    otp_verified_at: None,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(identity.id);
                self.identities.insert(identity.id, identity.clone());
                Ok(identity)
            }
        }
    }

    async fn find_by_id(&self, id: IdentityId) -> AppResult<Option<Identity>> {
        Ok(self.identities.get(&id).map(|entry| entry.clone()))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>> {
        let id = match self.by_email.get(email) {
            Some(entry) => *entry.value(),
            None => return Ok(None),
        };
        Ok(self.identities.get(&id).map(|entry| entry.clone()))
    }

    async fn update(&self, identity: &Identity) -> AppResult<Identity> {
        match self.identities.get_mut(&identity.id) {
            Some(mut entry) => {
                *entry.value_mut() = identity.clone();
                Ok(identity.clone())
            }
            None => Err(AppError::not_found(format!(
                "Identity {} not found",
                identity.id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_data(email: &str) -> CreateIdentity {
        CreateIdentity {
            name: "Ada".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryIdentityStore::new();
        let now = Utc::now();

        let created = store.create(create_data("ada@x.com"), now).await.unwrap();
        assert!(!created.verified);
        assert_eq!(created.otp_attempts, 0);
        assert_eq!(created.created_at, now);

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@x.com");

        let by_email = store.find_by_email("ada@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryIdentityStore::new();
        let now = Utc::now();

        store.create(create_data("ada@x.com"), now).await.unwrap();
        let err = store
            .create(create_data("ada@x.com"), now)
            .await
            .unwrap_err();
        assert_eq!(err.kind, keygate_core::error::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_update_persists_fields() {
        let store = MemoryIdentityStore::new();
        let now = Utc::now();

        let mut identity = store.create(create_data("ada@x.com"), now).await.unwrap();
        identity.verified = true;
        identity.otp_attempts = 3;

        store.update(&identity).await.unwrap();
        let reloaded = store.find_by_id(identity.id).await.unwrap().unwrap();
        assert!(reloaded.verified);
        assert_eq!(reloaded.otp_attempts, 3);
    }

    #[tokio::test]
    async fn test_update_unknown_identity_is_not_found() {
        let store = MemoryIdentityStore::new();
        let now = Utc::now();

        let identity = store.create(create_data("ada@x.com"), now).await.unwrap();
        let mut ghost = identity.clone();
        ghost.id = IdentityId::new();

        let err = store.update(&ghost).await.unwrap_err();
        assert_eq!(err.kind, keygate_core::error::ErrorKind::NotFound);
    }
}
