//! Request DTOs with validation.
//!
//! Validation here covers shape only (formats, lengths); the deeper
//! password-strength and challenge checks live behind the verifier.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Signup request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    /// Display name.
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,
    /// Email address, used as the login identifier.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Plaintext password, hashed before it is stored.
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub password: String,
}

/// Signin request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SigninRequest {
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// One-time-code verification request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    /// Email address the challenge was sent to.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// The six-digit code.
    #[validate(length(equal = 6, message = "Code must be 6 digits"))]
    pub code: String,
}

/// Body for the resend-otp and forgot-password endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmailRequest {
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

/// Password reset request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Replacement password.
    #[validate(length(min = 8, max = 128, message = "Password must be 8 to 128 characters"))]
    pub new_password: String,
}
