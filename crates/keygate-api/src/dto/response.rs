//! Response DTOs.
//!
//! Token values never appear in response bodies; they travel only as
//! cookies. Bodies carry the identity projection and expiry instants so
//! clients can schedule their refresh ahead of time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keygate_auth::IssuedTokens;
use keygate_entity::identity::IdentityProjection;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Plain message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body for signin and refresh: who is signed in, and until when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// The authenticated identity.
    pub identity: IdentityProjection,
    /// When the access cookie stops working.
    pub access_expires_at: DateTime<Utc>,
    /// When the refresh cookie stops working.
    pub refresh_expires_at: DateTime<Utc>,
}

impl SessionResponse {
    /// Builds the body for a freshly issued pair.
    pub fn new(identity: IdentityProjection, tokens: &IssuedTokens) -> Self {
        Self {
            identity,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
        }
    }
}

/// Health probe response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}
