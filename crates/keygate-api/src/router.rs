//! Route definitions for the Keygate HTTP API.
//!
//! REST routes mount under `/api`; the WebSocket upgrade sits at the
//! root. The router receives `AppState` and threads it through every
//! handler via Axum's `State` extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.server.body_limit_bytes as usize;
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    let api_routes = Router::new().merge(auth_routes()).merge(health_routes());

    let ws_routes = Router::new().route("/ws", get(handlers::ws::ws_upgrade));

    Router::new()
        .nest("/api", api_routes)
        .merge(ws_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Auth endpoints: registration, OTP flows, session lifecycle.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/signin", post(handlers::auth::signin))
        .route("/auth/verify-otp", post(handlers::auth::verify_otp))
        .route("/auth/resend-otp", post(handlers::auth::resend_otp))
        .route("/auth/forgot-password", post(handlers::auth::forgot_password))
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        .route("/auth/refresh-token", post(handlers::auth::refresh_token))
        .route("/auth/logout", post(handlers::auth::logout))
        .route(
            "/auth/notify-inactivity",
            post(handlers::auth::notify_inactivity),
        )
        .route("/auth/me", get(handlers::auth::me))
}

/// Liveness probe.
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
