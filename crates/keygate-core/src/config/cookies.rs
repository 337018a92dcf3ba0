//! Cookie transport configuration.

use serde::{Deserialize, Serialize};

/// Settings for the token cookies.
///
/// Both tokens travel as host-only `HttpOnly` cookies; their max-ages
/// follow the token TTLs configured in `[auth]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Set the `Secure` attribute. Required in production-like
    /// environments; off by default for local development over HTTP.
    #[serde(default)]
    pub secure: bool,
    /// `SameSite` attribute: `"strict"` or `"lax"`.
    #[serde(default = "default_same_site")]
    pub same_site: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: false,
            same_site: default_same_site(),
        }
    }
}

fn default_same_site() -> String {
    "strict".to_string()
}
