//! SSE framing for relay events

use crate::types::RelayEvent;
use axum::{
    http::header::{CACHE_CONTROL, CONNECTION},
    http::HeaderName,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
};
use futures::stream::{Stream, StreamExt};
use std::convert::Infallible;
use std::time::Duration;

const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

/// `event: <name>` followed by a JSON object `data:` line
pub fn to_event(event: &RelayEvent) -> Event {
    Event::default()
        .event(event.event_name())
        .data(event.payload().to_string())
}

/// Wrap relay events in a streaming response with caching and proxy buffering disabled
pub fn event_stream_response<S>(events: S) -> Response
where
    S: Stream<Item = RelayEvent> + Send + 'static,
{
    let stream = events.map(|event| Ok::<_, Infallible>(to_event(&event)));

    let sse = Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)));

    (
        [
            (CACHE_CONTROL, "no-cache, no-transform"),
            (CONNECTION, "keep-alive"),
            (X_ACCEL_BUFFERING, "no"),
        ],
        sse,
    )
        .into_response()
}

/// Split an SSE body into `(event, data)` pairs; comment-only frames are skipped
#[cfg(test)]
pub fn parse_frames(body: &str) -> Vec<(Option<String>, serde_json::Value)> {
    body.split("\n\n")
        .filter_map(|frame| {
            let mut name = None;
            let mut data = None;
            for line in frame.lines() {
                if let Some(rest) = line.strip_prefix("event:") {
                    name = Some(rest.trim().to_string());
                } else if let Some(rest) = line.strip_prefix("data:") {
                    data = Some(rest.trim().to_string());
                }
            }
            let data = data?;
            Some((name, serde_json::from_str(&data).ok()?))
        })
        .collect()
}
