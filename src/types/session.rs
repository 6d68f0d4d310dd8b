//! Per-request relay session types

use serde::Deserialize;
use uuid::Uuid;

use super::errors::AppError;

const SYSTEM_PROMPT_NO_REASONING: &str = "You are a helpful assistant. Respond directly to the user without revealing your chain-of-thought. Do not generate <think> tags.";
const SYSTEM_PROMPT_REASONING: &str = "You are a helpful assistant. You may think through the task and include your reasoning inside <think>...</think> before the final answer.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReasoningMode {
    #[default]
    On,
    Off,
}

impl ReasoningMode {
    /// Only an explicit `off` disables reasoning
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("off") => Self::Off,
            _ => Self::On,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::On => SYSTEM_PROMPT_REASONING,
            Self::Off => SYSTEM_PROMPT_NO_REASONING,
        }
    }
}

/// Query string of the streaming endpoints
#[derive(Debug, Default, Deserialize)]
pub struct StreamQuery {
    pub prompt: Option<String>,
    pub reasoning: Option<String>,
    #[serde(rename = "imageId")]
    pub image_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RelaySession {
    pub id: String,
    pub prompt: String,
    pub reasoning_mode: ReasoningMode,
    pub blob_id: Option<String>,
    /// Request path the session was opened on, echoed in the `config` event
    pub source: String,
}

impl RelaySession {
    pub fn from_query(query: StreamQuery, source: impl Into<String>) -> Result<Self, AppError> {
        let prompt = query
            .prompt
            .filter(|p| !p.is_empty())
            .ok_or(AppError::MissingPrompt)?;

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            prompt,
            reasoning_mode: ReasoningMode::from_param(query.reasoning.as_deref()),
            blob_id: query.image_id.filter(|id| !id.is_empty()),
            source: source.into(),
        })
    }

    pub fn system_prompt(&self) -> &'static str {
        self.reasoning_mode.system_prompt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(prompt: Option<&str>, reasoning: Option<&str>, image_id: Option<&str>) -> StreamQuery {
        StreamQuery {
            prompt: prompt.map(String::from),
            reasoning: reasoning.map(String::from),
            image_id: image_id.map(String::from),
        }
    }

    #[test]
    fn test_reasoning_defaults_on() {
        assert_eq!(ReasoningMode::from_param(None), ReasoningMode::On);
        assert_eq!(ReasoningMode::from_param(Some("yes")), ReasoningMode::On);
        assert_eq!(ReasoningMode::from_param(Some("off")), ReasoningMode::Off);
        assert_eq!(ReasoningMode::from_param(Some("OFF")), ReasoningMode::Off);
    }

    #[test]
    fn test_system_prompt_follows_mode() {
        assert!(ReasoningMode::On.system_prompt().contains("<think>...</think>"));
        assert!(ReasoningMode::Off.system_prompt().contains("Do not generate <think> tags"));
    }

    #[test]
    fn test_missing_prompt_rejected() {
        assert!(matches!(
            RelaySession::from_query(query(None, None, None), "/api/reasoning"),
            Err(AppError::MissingPrompt)
        ));
        assert!(matches!(
            RelaySession::from_query(query(Some(""), None, None), "/api/reasoning"),
            Err(AppError::MissingPrompt)
        ));
    }

    #[test]
    fn test_whitespace_prompt_is_forwarded() {
        let session =
            RelaySession::from_query(query(Some("   "), None, None), "/api/reasoning").unwrap();
        assert_eq!(session.prompt, "   ");
    }

    #[test]
    fn test_session_from_query() {
        let session = RelaySession::from_query(
            query(Some("hi"), Some("off"), Some("")),
            "/api/stop-streaming",
        )
        .unwrap();
        assert_eq!(session.prompt, "hi");
        assert_eq!(session.reasoning_mode, ReasoningMode::Off);
        assert_eq!(session.blob_id, None);
        assert_eq!(session.source, "/api/stop-streaming");
    }
}
