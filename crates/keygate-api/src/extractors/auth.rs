//! `AuthUser` extractor — resolves the access token and injects the
//! verified context.
//!
//! The token is taken from the `Authorization` header first, then the
//! access cookie, so browser clients and API clients share one
//! extractor.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::debug;

use keygate_auth::AuthContext;
use keygate_core::error::AppError;

use crate::cookies::{ACCESS_COOKIE, REFRESH_COOKIE, bearer_token, cookie_value};
use crate::error::ApiError;
use crate::state::AppState;

/// Extracted authenticated identity context available in handlers.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthContext);

impl AuthUser {
    /// Returns the inner `AuthContext`.
    pub fn context(&self) -> &AuthContext {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = AuthContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .or_else(|| cookie_value(&parts.headers, ACCESS_COOKIE))
            .ok_or_else(|| AppError::invalid_credentials("Missing access token"))?;

        let context = state.tokens.verify_access(&token).await?;

        // A refresh cookie riding along marks a session-holding client;
        // record the activity on its session. Failures are absorbed, the
        // write is telemetry and must never fail the request.
        if cookie_value(&parts.headers, REFRESH_COOKIE).is_some() {
            if let Err(err) = state.tokens.touch_session(context.claims.session_id()).await {
                debug!(
                    session_id = %context.claims.session_id(),
                    error = %err,
                    "Failed to record session activity"
                );
            }
        }

        Ok(AuthUser(context))
    }
}
