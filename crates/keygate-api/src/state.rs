//! Application state shared across all handlers.

use std::sync::Arc;

use keygate_auth::{CredentialVerifier, TokenService};
use keygate_core::config::AppConfig;
use keygate_core::traits::Clock;
use keygate_realtime::RealtimeNotifier;
use keygate_store::Stores;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Storage backends.
    pub stores: Stores,
    /// Token pair issuance, rotation, and verification.
    pub tokens: Arc<TokenService>,
    /// Credential and one-time-code flows.
    pub verifier: Arc<CredentialVerifier>,
    /// Realtime push fan-out.
    pub realtime: Arc<RealtimeNotifier>,
    /// Time source shared with every collaborator.
    pub clock: Arc<dyn Clock>,
}
