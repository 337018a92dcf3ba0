//! # keygate-api
//!
//! HTTP API layer for Keygate built on Axum.
//!
//! Provides the auth endpoints, cookie credential transport, the
//! WebSocket upgrade, extractors, DTOs, and error mapping.

pub mod cookies;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
