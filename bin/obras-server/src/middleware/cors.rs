use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;

/// CORS policy: the configured allow-list, or any origin when none is set.
pub fn cors_layer(config: &Config) -> CorsLayer {
    let any_origin = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    let Some(origins_str) = &config.cors_allowed_origins else {
        // Wildcard – suitable for development; set OBRAS_CORS_ORIGINS in production.
        return any_origin;
    };

    // Parse the comma-separated origin list and build a restrictive layer.
    let origins: Vec<axum::http::HeaderValue> = origins_str
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();
    if origins.is_empty() {
        any_origin
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_headers(Any)
            .allow_methods(Any)
    }
}
