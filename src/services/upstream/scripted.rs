//! In-process upstream replaying a fixed script, for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use super::{CompletionClient, TokenSource, UpstreamError};
use crate::config::UpstreamSettings;
use crate::types::ChatMessage;

pub enum Step {
    Fragment(&'static str),
    Fail(UpstreamError),
    /// Never resolves, like an upstream that stalls mid-answer
    Hang,
}

pub struct ScriptedSource {
    steps: VecDeque<Step>,
    cancelled: Arc<AtomicBool>,
}

#[async_trait]
impl TokenSource for ScriptedSource {
    async fn next_fragment(&mut self) -> Option<Result<String, UpstreamError>> {
        if self.cancelled.load(Ordering::SeqCst) {
            return None;
        }
        match self.steps.pop_front()? {
            Step::Fragment(text) => Some(Ok(text.to_string())),
            Step::Fail(err) => {
                self.steps.clear();
                Some(Err(err))
            }
            Step::Hang => futures::future::pending().await,
        }
    }

    fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Hands out one scripted source per `open` call and records what it was asked
#[derive(Clone, Default)]
pub struct ScriptedClient {
    script: Arc<Mutex<Option<Vec<Step>>>>,
    open_error: Arc<Mutex<Option<UpstreamError>>>,
    pub cancelled: Arc<AtomicBool>,
    pub opened: Arc<AtomicUsize>,
    pub last_messages: Arc<Mutex<Vec<ChatMessage>>>,
}

impl ScriptedClient {
    pub fn new(steps: Vec<Step>) -> Self {
        let client = Self::default();
        *client.script.lock() = Some(steps);
        client
    }

    pub fn failing_open(err: UpstreamError) -> Self {
        let client = Self::default();
        *client.open_error.lock() = Some(err);
        client
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn open(
        &self,
        _settings: &UpstreamSettings,
        messages: Vec<ChatMessage>,
    ) -> Result<Box<dyn TokenSource>, UpstreamError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        *self.last_messages.lock() = messages;

        if let Some(err) = self.open_error.lock().take() {
            return Err(err);
        }

        let steps = self.script.lock().take().unwrap_or_default();
        Ok(Box::new(ScriptedSource {
            steps: steps.into(),
            cancelled: self.cancelled.clone(),
        }))
    }
}
