use tower_http::cors::{Any, CorsLayer};

/// Demo pages may be served from another origin during development
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
