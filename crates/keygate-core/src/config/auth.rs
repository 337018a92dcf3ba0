//! Authentication, token, and OTP configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for JWT signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Access token TTL in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_ttl_seconds: u64,
    /// Refresh token TTL in seconds.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_seconds: u64,
    /// One-time-code challenge TTL in seconds.
    #[serde(default = "default_otp_ttl")]
    pub otp_ttl_seconds: u64,
    /// Failed verification attempts before a challenge self-destructs.
    #[serde(default = "default_otp_max_attempts")]
    pub otp_max_attempts: u32,
    /// How long after a successful OTP verification a password reset is
    /// still accepted, in seconds.
    #[serde(default = "default_reset_window")]
    pub reset_window_seconds: u64,
    /// Client-side inactivity threshold in seconds. Must be >= the access
    /// token TTL; validated at startup.
    #[serde(default = "default_inactivity_threshold")]
    pub inactivity_threshold_seconds: u64,
    /// How far before access-token expiry the client renews, in seconds.
    #[serde(default = "default_refresh_buffer")]
    pub refresh_buffer_seconds: u64,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            access_ttl_seconds: default_access_ttl(),
            refresh_ttl_seconds: default_refresh_ttl(),
            otp_ttl_seconds: default_otp_ttl(),
            otp_max_attempts: default_otp_max_attempts(),
            reset_window_seconds: default_reset_window(),
            inactivity_threshold_seconds: default_inactivity_threshold(),
            refresh_buffer_seconds: default_refresh_buffer(),
            password_min_length: default_password_min(),
        }
    }
}

pub(crate) fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_access_ttl() -> u64 {
    900
}

fn default_refresh_ttl() -> u64 {
    604_800
}

fn default_otp_ttl() -> u64 {
    300
}

fn default_otp_max_attempts() -> u32 {
    5
}

fn default_reset_window() -> u64 {
    900
}

fn default_inactivity_threshold() -> u64 {
    1800
}

fn default_refresh_buffer() -> u64 {
    120
}

fn default_password_min() -> usize {
    8
}
