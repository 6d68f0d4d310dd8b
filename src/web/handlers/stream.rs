//! Streaming relay endpoint, bound to every configured stream path

use crate::services::relay;
use crate::state::AppState;
use crate::types::{AppError, StreamQuery};
use crate::web::sse::event_stream_response;
use axum::{
    extract::{OriginalUri, Query, State},
    response::Response,
};

pub async fn relay_stream(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<StreamQuery>,
) -> Result<Response, AppError> {
    // Errors from here on are plain JSON responses, no SSE headers yet
    let prepared = relay::prepare(&state.config, &state.blobs, query, uri.path())?;

    tracing::info!("📡 SSE relay opened on {}", uri.path());
    let events = relay::run(prepared, state.upstream.clone());

    Ok(event_stream_response(events))
}
