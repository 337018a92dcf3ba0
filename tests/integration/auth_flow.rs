//! Integration tests for registration, sign-in, and the token lifecycle.

use chrono::Duration;
use http::StatusCode;

use keygate_core::types::SessionId;
use keygate_realtime::ServerEvent;

use crate::helpers::{self, TestApp};

const EMAIL: &str = "ada@x.com";

#[tokio::test]
async fn test_signup_starts_unverified() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(serde_json::json!({
                "name": "Ada",
                "email": "Ada@X.com",
                "password": helpers::PASSWORD,
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    let data = &response.body["data"];
    assert_eq!(data["email"].as_str().unwrap(), EMAIL);
    assert!(!data["verified"].as_bool().unwrap());

    // The code went out to the normalized address.
    assert!(app.notifier.last_code_for(EMAIL).is_some());
}

#[tokio::test]
async fn test_signup_duplicate_email_conflict() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;

    let response = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(serde_json::json!({
                "name": "Other Ada",
                "email": EMAIL,
                "password": helpers::PASSWORD,
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"].as_str().unwrap(), "CONFLICT");
}

#[tokio::test]
async fn test_signup_malformed_email_rejected() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(serde_json::json!({
                "name": "Ada",
                "email": "not-an-email",
                "password": helpers::PASSWORD,
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"].as_str().unwrap(), "VALIDATION_ERROR");
    assert!(response.body.get("details").is_some());
}

#[tokio::test]
async fn test_signup_weak_password_rejected() {
    let app = TestApp::new();

    let response = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(serde_json::json!({
                "name": "Ada",
                "email": EMAIL,
                "password": "password123",
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"].as_str().unwrap(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_signup_accepts_structurally_valid_password() {
    let app = TestApp::new();

    // Upper, lower, digit, 11 chars: structurally fine even though the
    // entropy estimator scores it low.
    let response = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(serde_json::json!({
                "name": "Ada",
                "email": EMAIL,
                "password": "Str0ngPass1",
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["email"].as_str().unwrap(), EMAIL);
}

#[tokio::test]
async fn test_verify_otp_wrong_then_right() {
    let app = TestApp::new();
    app.request(
        "POST",
        "/api/auth/signup",
        Some(serde_json::json!({
            "name": "Ada",
            "email": EMAIL,
            "password": helpers::PASSWORD,
        })),
        None,
    )
    .await;
    let code = app.notifier.last_code_for(EMAIL).unwrap();
    let wrong = if code == "111111" { "222222" } else { "111111" };

    let response = app
        .request(
            "POST",
            "/api/auth/verify-otp",
            Some(serde_json::json!({ "email": EMAIL, "code": wrong })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"].as_str().unwrap(), "OTP_MISMATCH");

    let response = app
        .request(
            "POST",
            "/api/auth/verify-otp",
            Some(serde_json::json!({ "email": EMAIL, "code": code })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body["data"]["verified"].as_bool().unwrap());
}

#[tokio::test]
async fn test_verify_otp_pushes_status_to_connected_tabs() {
    let app = TestApp::new();
    app.request(
        "POST",
        "/api/auth/signup",
        Some(serde_json::json!({
            "name": "Ada",
            "email": EMAIL,
            "password": helpers::PASSWORD,
        })),
        None,
    )
    .await;

    let identity = app
        .stores
        .identities()
        .find_by_email(EMAIL)
        .await
        .unwrap()
        .expect("No identity after signup");
    let (_handle, mut rx) = app.realtime.register(identity.id, SessionId::new_v7());

    let code = app.notifier.last_code_for(EMAIL).unwrap();
    let response = app
        .request(
            "POST",
            "/api/auth/verify-otp",
            Some(serde_json::json!({ "email": EMAIL, "code": code })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    assert_eq!(
        rx.recv().await,
        Some(ServerEvent::OtpStatus {
            status: "verified".to_string()
        })
    );
}

#[tokio::test]
async fn test_signin_before_verification_forbidden() {
    let app = TestApp::new();
    app.request(
        "POST",
        "/api/auth/signup",
        Some(serde_json::json!({
            "name": "Ada",
            "email": EMAIL,
            "password": helpers::PASSWORD,
        })),
        None,
    )
    .await;

    let response = app
        .request(
            "POST",
            "/api/auth/signin",
            Some(serde_json::json!({ "email": EMAIL, "password": helpers::PASSWORD })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_signin_sets_cookies_not_body() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;

    let response = app
        .request(
            "POST",
            "/api/auth/signin",
            Some(serde_json::json!({ "email": EMAIL, "password": helpers::PASSWORD })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.cookies.len(), 2);
    for cookie in &response.cookies {
        assert!(cookie.contains("HttpOnly"), "not HttpOnly: {cookie}");
        assert!(cookie.contains("SameSite=Strict"), "wrong SameSite: {cookie}");
    }
    assert!(helpers::cookie_named(&response.cookies, "access_token").is_some());
    assert!(helpers::cookie_named(&response.cookies, "refresh_token").is_some());

    // The body names the identity and the expiry instants, never the
    // token values themselves.
    let data = &response.body["data"];
    assert_eq!(data["identity"]["email"].as_str().unwrap(), EMAIL);
    assert!(data.get("access_expires_at").is_some());
    assert!(data.get("refresh_expires_at").is_some());
    assert!(data.get("access_token").is_none());
    assert!(data.get("refresh_token").is_none());

    assert_eq!(app.refresh_count(EMAIL).await, 1);
}

#[tokio::test]
async fn test_signin_failures_indistinguishable() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;

    let unknown = app
        .request(
            "POST",
            "/api/auth/signin",
            Some(serde_json::json!({ "email": "nobody@x.com", "password": helpers::PASSWORD })),
            None,
        )
        .await;
    let wrong = app
        .request(
            "POST",
            "/api/auth/signin",
            Some(serde_json::json!({ "email": EMAIL, "password": "Wrong passphrase 55" })),
            None,
        )
        .await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.body, wrong.body);
    assert!(unknown.cookies.is_empty());
    assert!(wrong.cookies.is_empty());
}

#[tokio::test]
async fn test_me_with_bearer_token() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;
    let cookies = app.signin(EMAIL, helpers::PASSWORD).await;
    let access = helpers::cookie_named(&cookies, "access_token").unwrap();

    let response = app.request("GET", "/api/auth/me", None, Some(&access)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["email"].as_str().unwrap(), EMAIL);
}

#[tokio::test]
async fn test_me_with_cookies() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;
    let cookies = app.signin(EMAIL, helpers::PASSWORD).await;

    let response = app
        .request_with_cookies("GET", "/api/auth/me", None, None, &cookies)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["email"].as_str().unwrap(), EMAIL);
}

#[tokio::test]
async fn test_me_unauthenticated() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/auth/me", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("GET", "/api/auth/me", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_refresh_rotates_and_retires() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;
    let first = app.signin(EMAIL, helpers::PASSWORD).await;

    app.clock.advance(Duration::minutes(10));
    let response = app
        .request_with_cookies("POST", "/api/auth/refresh-token", None, None, &first)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    let second = response.cookies;
    assert_eq!(second.len(), 2);
    assert_ne!(
        helpers::cookie_named(&first, "refresh_token"),
        helpers::cookie_named(&second, "refresh_token"),
    );
    // Rotation retired the old record and created one replacement.
    assert_eq!(app.refresh_count(EMAIL).await, 1);

    // Replaying the consumed value fails and clears the browser's copy.
    let replay = app
        .request_with_cookies("POST", "/api/auth/refresh-token", None, None, &first)
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replay.cookies.len(), 2);
    for cookie in &replay.cookies {
        assert!(cookie.contains("Max-Age=0"), "not cleared: {cookie}");
    }
    // The live pair is untouched by the replay.
    assert_eq!(app.refresh_count(EMAIL).await, 1);
    let me = app
        .request_with_cookies("GET", "/api/auth/me", None, None, &second)
        .await;
    assert_eq!(me.status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_without_cookie_clears() {
    let app = TestApp::new();

    let response = app
        .request("POST", "/api/auth/refresh-token", None, None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.cookies.len(), 2);
    for cookie in &response.cookies {
        assert!(cookie.contains("Max-Age=0"), "not cleared: {cookie}");
    }
}

#[tokio::test]
async fn test_logout_revokes_refresh() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;
    let cookies = app.signin(EMAIL, helpers::PASSWORD).await;

    let response = app
        .request_with_cookies("POST", "/api/auth/logout", None, None, &cookies)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    for cookie in &response.cookies {
        assert!(cookie.contains("Max-Age=0"), "not cleared: {cookie}");
    }
    assert_eq!(app.refresh_count(EMAIL).await, 0);

    // The refresh value is dead immediately.
    let replay = app
        .request_with_cookies("POST", "/api/auth/refresh-token", None, None, &cookies)
        .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    // The outstanding access token is not recalled; it ages out.
    let access = helpers::cookie_named(&cookies, "access_token").unwrap();
    let me = app.request("GET", "/api/auth/me", None, Some(&access)).await;
    assert_eq!(me.status, StatusCode::OK);

    app.clock.advance(Duration::minutes(16));
    let me = app.request("GET", "/api/auth/me", None, Some(&access)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}
