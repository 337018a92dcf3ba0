//! Password policy enforcement for new passwords.

use tracing::warn;

use keygate_core::config::auth::AuthConfig;
use keygate_core::error::AppError;

/// zxcvbn score below which an accepted password is logged as weak.
const ADVISORY_SCORE: zxcvbn::Score = zxcvbn::Score::Three;

/// Validates new passwords against the configured policy.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    /// Minimum password length.
    min_length: usize,
}

impl PasswordPolicy {
    /// Creates a new policy from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Validates a candidate password.
    ///
    /// The structural rules are the gate. The entropy estimate is
    /// advisory: a password that clears the structure but scores low
    /// is accepted with a warning, not rejected. The identity's name
    /// and email are fed to the estimator so derived passwords score
    /// poorly.
    pub fn validate(&self, password: &str, user_inputs: &[&str]) -> Result<(), AppError> {
        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }

        if !password.chars().any(|c| c.is_uppercase()) {
            return Err(AppError::validation(
                "Password must contain at least one uppercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_lowercase()) {
            return Err(AppError::validation(
                "Password must contain at least one lowercase letter",
            ));
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::validation(
                "Password must contain at least one digit",
            ));
        }

        let estimate = zxcvbn::zxcvbn(password, user_inputs);
        if estimate.score() < ADVISORY_SCORE {
            warn!(score = ?estimate.score(), "Accepting a low-entropy password");
        }

        Ok(())
    }
}
