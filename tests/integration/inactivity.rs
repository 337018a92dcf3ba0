//! Integration tests for inactivity reporting and activity tracking.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Duration;
use http::StatusCode;

use keygate_auth::tokens::hash_opaque_token;
use keygate_client::{CoordinatorHooks, InactivityCoordinator, MemoryActivityStore, MemoryTabBus};
use keygate_core::traits::Clock;
use keygate_realtime::{ExpiryReason, ServerEvent};

use crate::helpers::{self, TestApp};

const EMAIL: &str = "ada@x.com";

#[tokio::test]
async fn test_notify_inactivity_revokes_and_pushes() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;
    let cookies = app.signin(EMAIL, helpers::PASSWORD).await;

    // A live connection for the same identity, as the browser would hold.
    let refresh = helpers::cookie_named(&cookies, "refresh_token").unwrap();
    let record = app
        .stores
        .sessions()
        .find_by_token_hash(&hash_opaque_token(&refresh), app.clock.now())
        .await
        .unwrap()
        .unwrap();
    let (_handle, mut rx) = app.realtime.register(record.identity_id, record.id);

    let response = app
        .request_with_cookies("POST", "/api/auth/notify-inactivity", None, None, &cookies)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.refresh_count(EMAIL).await, 0);

    // Every connection of the identity heard why the session ended.
    let event = rx.try_recv().expect("No push delivered");
    assert_eq!(
        event,
        ServerEvent::SessionExpired {
            reason: ExpiryReason::Inactivity,
        }
    );
}

#[tokio::test]
async fn test_notify_inactivity_requires_auth() {
    let app = TestApp::new();

    let response = app
        .request("POST", "/api/auth/notify-inactivity", None, None)
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authenticated_requests_touch_session() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;
    let cookies = app.signin(EMAIL, helpers::PASSWORD).await;

    let refresh = helpers::cookie_named(&cookies, "refresh_token").unwrap();
    let hash = hash_opaque_token(&refresh);
    let before = app
        .stores
        .sessions()
        .find_by_token_hash(&hash, app.clock.now())
        .await
        .unwrap()
        .unwrap();

    app.clock.advance(Duration::minutes(10));
    let response = app
        .request_with_cookies("GET", "/api/auth/me", None, None, &cookies)
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let after = app
        .stores
        .sessions()
        .find_by_token_hash(&hash, app.clock.now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.last_active_at - before.last_active_at, Duration::minutes(10));
}

/// The client coordinator and the server contract, end to end: the
/// breach fires the notify hook, and the report the hook stands for
/// revokes the session server-side.
#[tokio::test]
async fn test_coordinator_breach_drives_server_logout() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;
    let first = app.signin(EMAIL, helpers::PASSWORD).await;

    let logged_out = Arc::new(AtomicBool::new(false));
    let notify_requested = Arc::new(AtomicBool::new(false));
    let logged_out_hook = logged_out.clone();
    let notify_hook = notify_requested.clone();
    let hooks = CoordinatorHooks::new(move || {
        logged_out_hook.store(true, Ordering::SeqCst);
    })
    .with_server_notify(move || {
        notify_hook.store(true, Ordering::SeqCst);
    });
    let coordinator = InactivityCoordinator::new(
        Arc::new(MemoryActivityStore::new()),
        Arc::new(MemoryTabBus::new()),
        app.clock.clone(),
        Duration::seconds(app.config.auth.inactivity_threshold_seconds as i64),
        hooks,
    );
    coordinator.record_activity();

    // The scheduled refresh keeps the pair alive while the human idles.
    app.clock.advance(Duration::minutes(16));
    let refreshed = app
        .request_with_cookies("POST", "/api/auth/refresh-token", None, None, &first)
        .await;
    assert_eq!(refreshed.status, StatusCode::OK);
    let cookies = refreshed.cookies;

    // Thirty minutes without interaction crosses the threshold.
    app.clock.advance(Duration::minutes(14));
    coordinator.check_threshold();
    assert!(notify_requested.load(Ordering::SeqCst));
    assert!(logged_out.load(Ordering::SeqCst));
    assert!(coordinator.is_stopped());

    // What the notify hook stands for: report the breach over HTTP.
    let response = app
        .request_with_cookies("POST", "/api/auth/notify-inactivity", None, None, &cookies)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.refresh_count(EMAIL).await, 0);
}
