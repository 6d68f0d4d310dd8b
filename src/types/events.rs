//! Events written to the browser over SSE

use serde_json::{json, Value};

use super::session::ReasoningMode;

#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// First frame of every stream
    Config {
        reasoning_mode: ReasoningMode,
        source: String,
    },

    /// One upstream text fragment, in arrival order
    Message { text: String },

    /// Upstream finished normally
    End,

    /// Upstream failed; always the last frame
    Error { message: String },
}

impl RelayEvent {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// SSE `event:` name
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Message { .. } => "message",
            Self::End => "end",
            Self::Error { .. } => "error",
        }
    }

    /// SSE `data:` payload. Always a JSON object, `{}` when there is nothing to say.
    pub fn payload(&self) -> Value {
        match self {
            Self::Config {
                reasoning_mode,
                source,
            } => json!({
                "reasoningMode": reasoning_mode.as_str(),
                "source": source,
            }),
            Self::Message { text } => json!({ "text": text }),
            Self::End => json!({}),
            Self::Error { message } => json!({ "message": message }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End | Self::Error { .. })
    }
}
