//! CORS layer configuration.

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};

use keygate_core::config::server::CorsConfig;

/// Builds a CORS tower layer from configuration.
///
/// Credentials are only allowed with an explicit origin list; browsers
/// refuse cookie-carrying requests against a wildcard origin.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let mut layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.allowed_origins.iter().any(|o| o == "*") {
        layer = layer.allow_origin(Any);
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer = layer.allow_origin(origins).allow_credentials(true);
    }

    layer.max_age(std::time::Duration::from_secs(config.max_age_seconds))
}
