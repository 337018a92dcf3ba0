//! Unified application error types for Keygate.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate identity, concurrent modification).
    Conflict,
    /// Credential or token verification failed. Reported to callers with
    /// a generic message so unknown-email and wrong-password are
    /// indistinguishable from the outside.
    InvalidCredentials,
    /// A structurally valid access token was issued before the identity's
    /// last password change.
    StaleCredential,
    /// The caller is authenticated but the operation is not allowed in the
    /// identity's current state (e.g. signing in while unverified).
    Forbidden,
    /// The requested resource was not found.
    NotFound,
    /// The pending one-time-code challenge has passed its expiry.
    OtpExpired,
    /// No one-time-code challenge is pending for the identity.
    OtpNoChallenge,
    /// The supplied one-time code does not match the stored challenge.
    OtpMismatch,
    /// A store or transport backend is temporarily unavailable. The caller
    /// may retry; the core never retries on its own.
    Transient,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A configuration error occurred. Fatal at startup.
    Configuration,
    /// An internal server error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::InvalidCredentials => write!(f, "INVALID_CREDENTIALS"),
            Self::StaleCredential => write!(f, "STALE_CREDENTIAL"),
            Self::Forbidden => write!(f, "FORBIDDEN"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::OtpExpired => write!(f, "OTP_EXPIRED"),
            Self::OtpNoChallenge => write!(f, "OTP_NO_CHALLENGE"),
            Self::OtpMismatch => write!(f, "OTP_MISMATCH"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified application error used throughout Keygate.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create an invalid-credentials error. The message is logged but the
    /// HTTP layer replaces it with generic "please log in again" phrasing.
    pub fn invalid_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidCredentials, message)
    }

    /// Create a stale-credential error (token predates password change).
    pub fn stale_credential(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StaleCredential, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an expired-challenge error.
    pub fn otp_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OtpExpired, message)
    }

    /// Create a no-pending-challenge error.
    pub fn otp_no_challenge(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OtpNoChallenge, message)
    }

    /// Create a code-mismatch error.
    pub fn otp_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OtpMismatch, message)
    }

    /// Create a transient backend error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transient, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
