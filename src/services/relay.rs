//! Streaming relay: upstream fragments in, SSE events out
//!
//! A session moves through `Validating -> Composing -> Streaming` and ends in
//! exactly one of `Completed`, `Failed` or `Cancelled`. The first two phases
//! run in [`prepare`] and fail with an [`AppError`] before any SSE header is
//! written. [`run`] drives the streaming phase as a lazy event stream; when the
//! HTTP layer drops that stream (client gone), the pending upstream read is
//! abandoned, the token source is cancelled and the upload is released.

use async_stream::stream;
use futures::stream::Stream;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::blob_store::{BlobLease, BlobStore};
use super::prompt;
use super::upstream::{self, CompletionClient, TokenSource};
use crate::config::{Config, UpstreamSettings};
use crate::types::{AppError, ChatMessage, RelayEvent, RelaySession, StreamQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Validating,
    Composing,
    Streaming,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelayState::Validating => "validating",
            RelayState::Composing => "composing",
            RelayState::Streaming => "streaming",
            RelayState::Completed => "completed",
            RelayState::Failed => "failed",
            RelayState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A session that passed validation and composition, ready to stream
pub struct PreparedRelay {
    pub session: RelaySession,
    settings: UpstreamSettings,
    messages: Vec<ChatMessage>,
    lease: Option<BlobLease>,
}

impl PreparedRelay {
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

/// Validate the request and compose the upstream messages.
///
/// Any referenced upload is leased from here on, so it is deleted even when
/// composition fails.
pub fn prepare(
    config: &Config,
    blobs: &Arc<BlobStore>,
    query: StreamQuery,
    source: &str,
) -> Result<PreparedRelay, AppError> {
    tracing::trace!(state = %RelayState::Validating, source, "Validating relay request");
    let session = RelaySession::from_query(query, source)?;
    let settings = config.upstream_settings()?;
    tracing::debug!(session = %session.id, state = %RelayState::Composing, "Session validated");

    let lease = session.blob_id.as_deref().map(|id| blobs.lease(id));
    let user = prompt::compose(
        blobs,
        &session.prompt,
        session.blob_id.as_deref(),
        config.llm_supports_vision,
    )?;

    let messages = vec![ChatMessage::system(session.system_prompt()), user];

    Ok(PreparedRelay {
        session,
        settings,
        messages,
        lease,
    })
}

/// Stream the session's events. Emits `config`, then `message`s in arrival
/// order, then exactly one of `end` or `error`.
pub fn run(
    prepared: PreparedRelay,
    client: Arc<dyn CompletionClient>,
) -> impl Stream<Item = RelayEvent> + Send + 'static {
    stream! {
        let PreparedRelay { session, settings, messages, lease } = prepared;
        let mut guard = SessionGuard::new(&session, lease);

        yield RelayEvent::Config {
            reasoning_mode: session.reasoning_mode,
            source: session.source.clone(),
        };

        let mut source = match client.open(&settings, messages).await {
            Ok(source) => ActiveSource::new(source),
            Err(err) => {
                tracing::error!(session = %session.id, "Failed to open upstream stream: {}", err);
                guard.finish(RelayState::Failed);
                yield RelayEvent::error(upstream::describe(&err));
                return;
            }
        };

        loop {
            match source.next_fragment().await {
                Some(Ok(text)) => {
                    if text.is_empty() {
                        continue;
                    }
                    guard.fragments += 1;
                    yield RelayEvent::message(text);
                }
                Some(Err(err)) => {
                    tracing::error!(session = %session.id, "Upstream streaming error: {}", err);
                    guard.finish(RelayState::Failed);
                    yield RelayEvent::error(upstream::describe(&err));
                    return;
                }
                None => {
                    guard.finish(RelayState::Completed);
                    yield RelayEvent::End;
                    return;
                }
            }
        }
    }
}

/// Token source that is cancelled on drop unless it ran to completion
struct ActiveSource {
    inner: Box<dyn TokenSource>,
    exhausted: bool,
}

impl ActiveSource {
    fn new(inner: Box<dyn TokenSource>) -> Self {
        Self {
            inner,
            exhausted: false,
        }
    }

    async fn next_fragment(&mut self) -> Option<Result<String, upstream::UpstreamError>> {
        let next = self.inner.next_fragment().await;
        if next.is_none() {
            self.exhausted = true;
        }
        next
    }
}

impl Drop for ActiveSource {
    fn drop(&mut self) {
        if !self.exhausted {
            self.inner.cancel();
        }
    }
}

/// Tracks the terminal state and owns the upload lease for one session.
///
/// Dropped while still `Streaming` means the client went away.
struct SessionGuard {
    id: String,
    state: RelayState,
    fragments: usize,
    started: Instant,
    _lease: Option<BlobLease>,
}

impl SessionGuard {
    fn new(session: &RelaySession, lease: Option<BlobLease>) -> Self {
        tracing::info!(
            session = %session.id,
            source = %session.source,
            reasoning = session.reasoning_mode.as_str(),
            image = ?session.blob_id,
            "Relay session streaming"
        );
        Self {
            id: session.id.clone(),
            state: RelayState::Streaming,
            fragments: 0,
            started: Instant::now(),
            _lease: lease,
        }
    }

    fn finish(&mut self, state: RelayState) {
        self.state = state;
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.state == RelayState::Streaming {
            self.state = RelayState::Cancelled;
            tracing::info!(session = %self.id, "Client disconnected, stopping relay");
        }
        tracing::info!(
            session = %self.id,
            state = %self.state,
            fragments = self.fragments,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Relay session finished"
        );
    }
}
