//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every section and field carries a default so a partial file
//! (or none at all) still yields a complete configuration.

pub mod auth;
pub mod cookies;
pub mod logging;
pub mod realtime;
pub mod server;
pub mod session;
pub mod store;

use serde::{Deserialize, Serialize};

use self::auth::AuthConfig;
use self::cookies::CookieConfig;
use self::logging::LoggingConfig;
use self::realtime::RealtimeConfig;
use self::server::ServerConfig;
use self::session::SessionConfig;
use self::store::StoreConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Authentication, token, and OTP settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Identity/session store backend settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Session sweep settings.
    #[serde(default)]
    pub session: SessionConfig,
    /// Real-time WebSocket settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Cookie transport settings.
    #[serde(default)]
    pub cookies: CookieConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `KEYGATE_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("KEYGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Validate cross-field constraints.
    ///
    /// Returns a fatal [`AppError`] for misconfigurations the engine must
    /// not start with, and logs warnings for values that are legal but
    /// suspicious. Call after logging is initialized so the warnings are
    /// visible.
    pub fn validate(&self) -> Result<(), AppError> {
        match self.store.backend.as_str() {
            "memory" | "postgres" => {}
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown store backend '{other}' (expected 'memory' or 'postgres')"
                )));
            }
        }

        if self.store.backend == "postgres" && self.store.postgres.url.is_empty() {
            return Err(AppError::configuration(
                "store.postgres.url is required when store.backend = 'postgres'",
            ));
        }

        // A client inactivity threshold below the access-token TTL would
        // log users out before their token even expires.
        if self.auth.inactivity_threshold_seconds < self.auth.access_ttl_seconds {
            return Err(AppError::configuration(format!(
                "auth.inactivity_threshold_seconds ({}) must be >= auth.access_ttl_seconds ({})",
                self.auth.inactivity_threshold_seconds, self.auth.access_ttl_seconds
            )));
        }

        if self.auth.jwt_secret == auth::default_jwt_secret() {
            tracing::warn!("auth.jwt_secret is still the default value; set a real secret");
        }
        if self.auth.refresh_buffer_seconds < 120 {
            tracing::warn!(
                buffer = self.auth.refresh_buffer_seconds,
                "auth.refresh_buffer_seconds below 120s leaves little room for renewal"
            );
        }
        if self.auth.access_ttl_seconds < 300 {
            tracing::warn!(
                ttl = self.auth.access_ttl_seconds,
                "auth.access_ttl_seconds below 300s causes very frequent refreshes"
            );
        }
        if self.auth.inactivity_threshold_seconds > 3600 {
            tracing::warn!(
                threshold = self.auth.inactivity_threshold_seconds,
                "auth.inactivity_threshold_seconds above one hour weakens idle logout"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_pass_validation() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_inactivity_below_access_ttl_is_fatal() {
        let mut config = AppConfig::default();
        config.auth.access_ttl_seconds = 900;
        config.auth.inactivity_threshold_seconds = 600;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_unknown_backend_is_fatal() {
        let mut config = AppConfig::default();
        config.store.backend = "sled".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_postgres_backend_requires_url() {
        let mut config = AppConfig::default();
        config.store.backend = "postgres".to_string();
        config.store.postgres.url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_equal_to_ttl_is_allowed() {
        let mut config = AppConfig::default();
        config.auth.access_ttl_seconds = 900;
        config.auth.inactivity_threshold_seconds = 900;
        assert!(config.validate().is_ok());
    }
}
