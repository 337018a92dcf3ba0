//! Auth handlers — signup, signin, OTP flows, token rotation, logout.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::debug;
use validator::Validate;

use keygate_core::error::AppError;
use keygate_entity::identity::IdentityProjection;
use keygate_entity::session::Platform;
use keygate_realtime::ExpiryReason;

use crate::cookies::{self, REFRESH_COOKIE, cookie_value};
use crate::dto::request::{
    EmailRequest, ResetPasswordRequest, SigninRequest, SignupRequest, VerifyOtpRequest,
};
use crate::dto::response::{ApiResponse, MessageResponse, SessionResponse};
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::state::AppState;

fn platform_from(headers: &HeaderMap) -> Platform {
    Platform::from_user_agent(
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok()),
    )
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<IdentityProjection>>), ApiError> {
    req.validate()?;

    let identity = state
        .verifier
        .register(&req.name, &req.email, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(IdentityProjection::from(&identity))),
    ))
}

/// POST /api/auth/signin
pub async fn signin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SigninRequest>,
) -> Result<(HeaderMap, Json<ApiResponse<SessionResponse>>), ApiError> {
    req.validate()?;

    let result = state
        .verifier
        .signin(&req.email, &req.password, platform_from(&headers))
        .await?;

    let cookie_headers = cookies::session_cookies(&result.tokens, &state.config)?;
    let body = SessionResponse::new(result.identity, &result.tokens);
    Ok((cookie_headers, Json(ApiResponse::ok(body))))
}

/// POST /api/auth/verify-otp
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<IdentityProjection>>, ApiError> {
    req.validate()?;

    let identity = state.verifier.verify_otp(&req.email, &req.code).await?;
    state.realtime.emit_otp_status(identity.id, "verified");
    Ok(Json(ApiResponse::ok(IdentityProjection::from(&identity))))
}

/// POST /api/auth/resend-otp
pub async fn resend_otp(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    req.validate()?;

    state.verifier.resend_otp(&req.email).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Verification code sent",
    ))))
}

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<EmailRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    req.validate()?;

    state.verifier.forgot_password(&req.email).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Password reset code sent",
    ))))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    req.validate()?;

    state
        .verifier
        .reset_password(&req.email, &req.new_password)
        .await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new(
        "Password has been reset",
    ))))
}

/// POST /api/auth/refresh-token
///
/// Authenticates with the refresh cookie alone; the access token may
/// already be dead when this is called. Any failure clears both cookies
/// so the browser cannot keep replaying a consumed value.
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Some(presented) = cookie_value(&headers, REFRESH_COOKIE) else {
        return rejected_refresh(
            AppError::invalid_credentials("Missing refresh cookie"),
            &state,
        );
    };

    match state.tokens.refresh(&presented).await {
        Ok((identity, tokens)) => {
            let cookie_headers = cookies::session_cookies(&tokens, &state.config)?;
            let body = SessionResponse::new(IdentityProjection::from(&identity), &tokens);
            Ok((cookie_headers, Json(ApiResponse::ok(body))).into_response())
        }
        Err(err) => rejected_refresh(err, &state),
    }
}

fn rejected_refresh(err: AppError, state: &AppState) -> Result<Response, ApiError> {
    let mut response = ApiError::from(err).into_response();
    response
        .headers_mut()
        .extend(cookies::clear_cookies(&state.config)?);
    Ok(response)
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<ApiResponse<MessageResponse>>), ApiError> {
    // The refresh cookie names the session to revoke; a bearer-only
    // client falls back to the sid claim, which points at the same
    // record for an intact pair.
    match cookie_value(&headers, REFRESH_COOKIE) {
        Some(presented) => {
            state.tokens.revoke_one(&presented).await?;
        }
        None => {
            state.tokens.revoke_session(auth.claims.session_id()).await?;
        }
    }

    let clear_headers = cookies::clear_cookies(&state.config)?;
    Ok((
        clear_headers,
        Json(ApiResponse::ok(MessageResponse::new("Logged out"))),
    ))
}

/// POST /api/auth/notify-inactivity
///
/// Client-side inactivity report. Advisory and always 200 for an
/// authenticated caller: revocation or push failures change nothing
/// about the client's next step, which is to drop to the signin screen.
pub async fn notify_inactivity(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
) -> Json<ApiResponse<MessageResponse>> {
    let revoked = match cookie_value(&headers, REFRESH_COOKIE) {
        Some(presented) => state.tokens.revoke_one(&presented).await,
        None => state.tokens.revoke_session(auth.claims.session_id()).await,
    };
    if let Err(err) = revoked {
        debug!(
            identity_id = %auth.identity.id,
            error = %err,
            "Inactivity revocation failed"
        );
    }

    state
        .realtime
        .emit_session_expired(auth.identity.id, ExpiryReason::Inactivity);

    Json(ApiResponse::ok(MessageResponse::new("Inactivity recorded")))
}

/// GET /api/auth/me
pub async fn me(auth: AuthUser) -> Json<ApiResponse<IdentityProjection>> {
    Json(ApiResponse::ok(IdentityProjection::from(&auth.identity)))
}
