//! Argon2id hashing and verification.
//!
//! One hasher covers both passwords and one-time codes; both are short
//! secrets verified against a stored salted hash.

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as ArgonHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};

use keygate_core::error::AppError;

/// Hashes and verifies secrets using Argon2id.
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Creates a new hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Hashes a plaintext secret with a random salt.
    pub fn hash(&self, secret: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let hash = argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Hashing failed: {e}")))?;

        Ok(hash.to_string())
    }

    /// Verifies a plaintext secret against a stored hash.
    ///
    /// Returns `Ok(true)` on a match and `Ok(false)` on a mismatch; only
    /// a malformed stored hash is an error.
    pub fn verify(&self, secret: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid stored hash format: {e}")))?;

        let argon2 = Argon2::default();
        match argon2.verify_password(secret.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!("Verification failed: {e}"))),
        }
    }
}
