//! Client platform tag.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse device class a session was opened from, derived from the
/// User-Agent at sign-in. Diagnostic; no behavior branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "platform", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Desktop browser.
    Desktop,
    /// Phone or tablet browser.
    Mobile,
    /// Could not be classified (missing or unrecognized User-Agent).
    Unknown,
}

impl Platform {
    /// Classify a User-Agent header value.
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent else {
            return Self::Unknown;
        };
        let ua = ua.to_lowercase();
        if ua.contains("mobile") || ua.contains("android") || ua.contains("iphone") {
            Self::Mobile
        } else if ua.contains("mozilla") || ua.contains("webkit") || ua.contains("gecko") {
            Self::Desktop
        } else {
            Self::Unknown
        }
    }

    /// Return the platform as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
            Self::Unknown => "unknown",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifies_mobile() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)";
        assert_eq!(Platform::from_user_agent(Some(ua)), Platform::Mobile);
    }

    #[test]
    fn test_classifies_desktop() {
        let ua = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";
        assert_eq!(Platform::from_user_agent(Some(ua)), Platform::Desktop);
    }

    #[test]
    fn test_missing_user_agent_is_unknown() {
        assert_eq!(Platform::from_user_agent(None), Platform::Unknown);
        assert_eq!(Platform::from_user_agent(Some("curl/8.5")), Platform::Unknown);
    }
}
