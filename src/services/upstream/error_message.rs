//! Human-readable text for upstream failures
//!
//! Providers put the useful part of an error in different places. The
//! extractors below are tried in order and the first hit wins.

use serde_json::Value;

use super::UpstreamError;

pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred while calling the model.";

type Extractor = fn(&UpstreamError) -> Option<String>;

const EXTRACTORS: &[Extractor] = &[
    nested_error_message,
    top_level_message,
    error_string,
    detail_string,
    plain_text_body,
    status_only,
];

pub fn describe(err: &UpstreamError) -> String {
    EXTRACTORS
        .iter()
        .find_map(|extract| extract(err))
        .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
}

fn api_body(err: &UpstreamError) -> Option<&Value> {
    match err {
        UpstreamError::Api { body, .. } => Some(body),
        _ => None,
    }
}

fn non_empty(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// `{"error": {"message": "..."}}` (OpenAI and most compatible servers)
fn nested_error_message(err: &UpstreamError) -> Option<String> {
    api_body(err)?.pointer("/error/message").and_then(non_empty)
}

/// `{"message": "..."}`
fn top_level_message(err: &UpstreamError) -> Option<String> {
    api_body(err)?.get("message").and_then(non_empty)
}

/// `{"error": "..."}`
fn error_string(err: &UpstreamError) -> Option<String> {
    api_body(err)?.get("error").and_then(non_empty)
}

/// `{"detail": "..."}` (FastAPI based servers)
fn detail_string(err: &UpstreamError) -> Option<String> {
    api_body(err)?.get("detail").and_then(non_empty)
}

/// Short non-JSON bodies are passed through
fn plain_text_body(err: &UpstreamError) -> Option<String> {
    non_empty(api_body(err)?).filter(|text| text.len() <= 300)
}

fn status_only(err: &UpstreamError) -> Option<String> {
    match err {
        UpstreamError::Api {
            status: Some(status),
            ..
        } => Some(format!("The model API responded with status {status}.")),
        _ => None,
    }
}
