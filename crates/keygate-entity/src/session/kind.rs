//! Session record kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The role a stored token value plays.
///
/// All kinds share one store; bulk operations may be scoped by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "token_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Backs an outstanding refresh token. Single-use under rotation.
    Refresh,
    /// Backs a password-reset flow.
    Reset,
    /// Backs an email-verification flow.
    Verification,
}

impl TokenKind {
    /// Return the kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::Reset => "reset",
            Self::Verification => "verification",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TokenKind {
    type Err = keygate_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "refresh" => Ok(Self::Refresh),
            "reset" => Ok(Self::Reset),
            "verification" => Ok(Self::Verification),
            _ => Err(keygate_core::AppError::validation(format!(
                "Invalid token kind: '{s}'. Expected one of: refresh, reset, verification"
            ))),
        }
    }
}
