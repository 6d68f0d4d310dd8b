use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use super::handlers::{health, pages, stream, upload};

/// Headroom for multipart boundaries and part headers around the image
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_routes(state: AppState) -> Router {
    let upload_limit = state.config.upload_max_bytes + MULTIPART_OVERHEAD;

    let mut router = Router::new()
        // Pages
        .route("/", get(pages::index))
        .route("/on_off_reasoning", get(pages::on_off_reasoning))
        .route("/stop_streaming_response", get(pages::stop_streaming_response))
        .route("/upload_image", get(pages::upload_image))

        // API endpoints
        .route(
            "/api/upload-image",
            post(upload::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )

        // Health check
        .route("/health", get(health::health_check));

    // Every configured alias shares the one relay handler
    for path in &state.config.stream_paths {
        router = router.route(path, get(stream::relay_stream));
    }

    router.with_state(state)
}
