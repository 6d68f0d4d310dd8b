//! Demo pages

use crate::config::Config;
use crate::state::AppState;
use crate::types::AppError;
use axum::{extract::State, response::Html};

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let html = state.templates.render_home(&state.config.server_url())?;
    Ok(Html(html))
}

pub async fn on_off_reasoning(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render_demo(&state, "on_off_reasoning", "/api/reasoning")
}

pub async fn stop_streaming_response(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render_demo(&state, "stop_streaming_response", "/api/stop-streaming")
}

pub async fn upload_image(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    render_demo(&state, "upload_image", "/api/upload-streaming")
}

fn render_demo(state: &AppState, page_id: &str, preferred: &str) -> Result<Html<String>, AppError> {
    let html = state
        .templates
        .render_demo(page_id, stream_path_for(&state.config, preferred))?;
    Ok(Html(html))
}

/// The page's usual path if it is bound, otherwise the first stream path
fn stream_path_for<'a>(config: &'a Config, preferred: &'a str) -> &'a str {
    config
        .stream_paths
        .iter()
        .find(|p| p.as_str() == preferred)
        .or_else(|| config.stream_paths.first())
        .map(String::as_str)
        .unwrap_or(preferred)
}
