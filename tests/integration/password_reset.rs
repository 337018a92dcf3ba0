//! Integration tests for the password reset flow.

use chrono::Duration;
use http::StatusCode;

use crate::helpers::{self, TestApp};

const EMAIL: &str = "ada@x.com";
const NEW_PASSWORD: &str = "Quartz heron bicycle 77";

async fn forgot(app: &TestApp) {
    let response = app
        .request(
            "POST",
            "/api/auth/forgot-password",
            Some(serde_json::json!({ "email": EMAIL })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "Forgot failed: {:?}", response.body);
}

async fn verify_latest_code(app: &TestApp) {
    let code = app.notifier.last_code_for(EMAIL).unwrap();
    let response = app
        .request(
            "POST",
            "/api/auth/verify-otp",
            Some(serde_json::json!({ "email": EMAIL, "code": code })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "Verify failed: {:?}", response.body);
}

async fn reset(app: &TestApp, new_password: &str) -> helpers::TestResponse {
    app.request(
        "POST",
        "/api/auth/reset-password",
        Some(serde_json::json!({ "email": EMAIL, "new_password": new_password })),
        None,
    )
    .await
}

#[tokio::test]
async fn test_reset_revokes_sessions_and_tokens() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;
    let cookies = app.signin(EMAIL, helpers::PASSWORD).await;
    let access = helpers::cookie_named(&cookies, "access_token").unwrap();

    app.clock.advance(Duration::seconds(30));
    forgot(&app).await;
    verify_latest_code(&app).await;
    let response = reset(&app, NEW_PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);

    // Every refresh record is gone and the old pair is dead.
    assert_eq!(app.refresh_count(EMAIL).await, 0);
    let replay = app
        .request_with_cookies("POST", "/api/auth/refresh-token", None, None, &cookies)
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    // The outstanding access token is stale even though its TTL has not
    // passed.
    let me = app.request("GET", "/api/auth/me", None, Some(&access)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);

    // Old password dead, new one signs in.
    let old = app
        .request(
            "POST",
            "/api/auth/signin",
            Some(serde_json::json!({ "email": EMAIL, "password": helpers::PASSWORD })),
            None,
        )
        .await;
    assert_eq!(old.status, StatusCode::UNAUTHORIZED);
    app.signin(EMAIL, NEW_PASSWORD).await;
}

#[tokio::test]
async fn test_reset_requires_recent_verification() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;

    // Arming the reset challenge wipes the registration-time
    // verification; resetting without verifying the new code is refused.
    forgot(&app).await;
    let response = reset(&app, NEW_PASSWORD).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reset_window_expires() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;

    forgot(&app).await;
    verify_latest_code(&app).await;

    app.clock.advance(Duration::minutes(16));
    let response = reset(&app, NEW_PASSWORD).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reset_code_expires() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;
    forgot(&app).await;
    let code = app.notifier.last_code_for(EMAIL).unwrap();

    app.clock.advance(Duration::minutes(6));
    let response = app
        .request(
            "POST",
            "/api/auth/verify-otp",
            Some(serde_json::json!({ "email": EMAIL, "code": code })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::GONE);
    assert_eq!(response.body["error"].as_str().unwrap(), "OTP_EXPIRED");
}

#[tokio::test]
async fn test_resend_after_verification_rejected() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;

    let response = app
        .request(
            "POST",
            "/api/auth/resend-otp",
            Some(serde_json::json!({ "email": EMAIL })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_forgot_password_unknown_email() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/forgot-password",
            Some(serde_json::json!({ "email": "nobody@x.com" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
