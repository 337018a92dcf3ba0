//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use chrono::Utc;
use http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use keygate_api::{AppState, build_router};
use keygate_auth::{CapturingNotifier, CredentialVerifier, TokenService};
use keygate_core::config::AppConfig;
use keygate_core::traits::clock::ManualClock;
use keygate_entity::session::TokenKind;
use keygate_realtime::RealtimeNotifier;
use keygate_store::Stores;

/// A passphrase strong enough for the password policy.
pub const PASSWORD: &str = "Vivid penguin estuary 42";

/// Test application context over the memory backend.
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Application config (defaults)
    pub config: Arc<AppConfig>,
    /// Direct store access for assertions
    pub stores: Stores,
    /// The injected clock; advance it to cross expiry boundaries
    pub clock: Arc<ManualClock>,
    /// Captures delivered one-time codes
    pub notifier: Arc<CapturingNotifier>,
    /// The push engine; tests can register receivers directly
    pub realtime: Arc<RealtimeNotifier>,
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        let config = Arc::new(AppConfig::default());
        let stores = Stores::in_memory();
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let notifier = Arc::new(CapturingNotifier::new());

        let tokens = Arc::new(TokenService::new(
            stores.identities(),
            stores.sessions(),
            clock.clone(),
            &config.auth,
        ));
        let verifier = Arc::new(CredentialVerifier::new(
            stores.identities(),
            stores.sessions(),
            tokens.clone(),
            notifier.clone(),
            clock.clone(),
            &config.auth,
        ));
        let realtime = Arc::new(RealtimeNotifier::new(clock.clone(), &config.realtime));

        let state = AppState {
            config: config.clone(),
            stores: stores.clone(),
            tokens,
            verifier,
            realtime: realtime.clone(),
            clock: clock.clone(),
        };
        let router = build_router(state);

        Self {
            router,
            config,
            stores,
            clock,
            notifier,
            realtime,
        }
    }

    /// Register an identity and verify it with the delivered code.
    pub async fn signup_verified(&self, name: &str, email: &str, password: &str) {
        let response = self
            .request(
                "POST",
                "/api/auth/signup",
                Some(serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": password,
                })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Signup failed: {:?}",
            response.body
        );

        let code = self
            .notifier
            .last_code_for(email)
            .expect("No verification code delivered");
        let response = self
            .request(
                "POST",
                "/api/auth/verify-otp",
                Some(serde_json::json!({
                    "email": email,
                    "code": code,
                })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "Verification failed: {:?}",
            response.body
        );
    }

    /// Sign in and return the captured `Set-Cookie` values.
    pub async fn signin(&self, email: &str, password: &str) -> Vec<String> {
        let response = self
            .request(
                "POST",
                "/api/auth/signin",
                Some(serde_json::json!({
                    "email": email,
                    "password": password,
                })),
                None,
            )
            .await;
        assert_eq!(
            response.status,
            StatusCode::OK,
            "Signin failed: {:?}",
            response.body
        );
        response.cookies
    }

    /// Refresh-backed session records currently held by `email`.
    pub async fn refresh_count(&self, email: &str) -> u64 {
        let identity = self
            .stores
            .identities()
            .find_by_email(email)
            .await
            .expect("Identity lookup failed")
            .expect("No identity for that email");
        self.stores
            .sessions()
            .count_for_identity(identity.id, Some(TokenKind::Refresh))
            .await
            .expect("Session count failed")
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.request_with_cookies(method, path, body, token, &[]).await
    }

    /// Make an HTTP request carrying the given cookies.
    ///
    /// `cookies` holds `Set-Cookie` values captured from an earlier
    /// response; their name=value pairs are folded into one `Cookie`
    /// header, the way a browser replays them.
    pub async fn request_with_cookies(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
        cookies: &[String],
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        if !cookies.is_empty() {
            req = req.header("Cookie", cookie_header(cookies));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            cookies: set_cookies,
        }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
    /// Captured `Set-Cookie` header values
    pub cookies: Vec<String>,
}

/// Fold `Set-Cookie` values into a `Cookie` request header.
pub fn cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .filter_map(|c| c.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

/// The value of a named cookie among captured `Set-Cookie` values.
pub fn cookie_named(set_cookies: &[String], name: &str) -> Option<String> {
    set_cookies.iter().find_map(|c| {
        let pair = c.split(';').next()?;
        let (cookie_name, value) = pair.split_once('=')?;
        (cookie_name == name).then(|| value.to_string())
    })
}
