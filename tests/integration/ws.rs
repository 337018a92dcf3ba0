//! Integration tests for the WebSocket upgrade and the health probe.

use chrono::Duration;
use http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::helpers::{self, TestApp};

const EMAIL: &str = "ada@x.com";

/// GET with a well-formed WebSocket handshake, optionally carrying
/// cookies. Only the status matters; the upgrade itself never completes.
/// Served over a real socket because `oneshot` cannot carry hyper's
/// `OnUpgrade` extension, which the upgrade extractor requires.
async fn handshake(app: &TestApp, uri: &str, cookie: Option<String>) -> StatusCode {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    let router = app.router.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("Failed to connect");
    let mut req = format!(
        "GET {uri} HTTP/1.1\r\n\
         Host: {addr}\r\n\
         Connection: upgrade\r\n\
         Upgrade: websocket\r\n\
         Sec-WebSocket-Version: 13\r\n\
         Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n"
    );
    if let Some(cookie) = cookie {
        req.push_str(&format!("Cookie: {cookie}\r\n"));
    }
    req.push_str("\r\n");
    stream
        .write_all(req.as_bytes())
        .await
        .expect("Failed to send request");

    let mut buf = [0u8; 1024];
    let n = stream.read(&mut buf).await.expect("Failed to read response");
    let response = String::from_utf8_lossy(&buf[..n]);
    let code = response
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .expect("Malformed status line");

    server.abort();
    StatusCode::from_u16(code).expect("Invalid status code")
}

#[tokio::test]
async fn test_ws_without_handshake_headers() {
    let app = TestApp::new();

    let response = app.request("GET", "/ws", None, None).await;

    assert!(
        response.status == StatusCode::UNAUTHORIZED
            || response.status == StatusCode::BAD_REQUEST
            || response.status == StatusCode::UPGRADE_REQUIRED,
        "Expected 401, 400, or 426, got {}",
        response.status
    );
}

#[tokio::test]
async fn test_ws_requires_token() {
    let app = TestApp::new();

    let status = handshake(&app, "/ws", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_upgrades_with_query_token() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;
    let cookies = app.signin(EMAIL, helpers::PASSWORD).await;
    let access = helpers::cookie_named(&cookies, "access_token").unwrap();

    let status = handshake(&app, &format!("/ws?token={access}"), None).await;

    assert_eq!(status, StatusCode::SWITCHING_PROTOCOLS);
}

#[tokio::test]
async fn test_ws_upgrades_with_cookie() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;
    let cookies = app.signin(EMAIL, helpers::PASSWORD).await;

    let status = handshake(&app, "/ws", Some(helpers::cookie_header(&cookies))).await;

    assert_eq!(status, StatusCode::SWITCHING_PROTOCOLS);
}

#[tokio::test]
async fn test_ws_rejects_expired_token() {
    let app = TestApp::new();
    app.signup_verified("Ada", EMAIL, helpers::PASSWORD).await;
    let cookies = app.signin(EMAIL, helpers::PASSWORD).await;
    let access = helpers::cookie_named(&cookies, "access_token").unwrap();

    app.clock.advance(Duration::minutes(16));
    let status = handshake(&app, &format!("/ws?token={access}"), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["data"]["status"].as_str().unwrap(),
        "ok"
    );
}
