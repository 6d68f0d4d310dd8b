//! OpenAI compatible chat-completions streaming client

use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::stream::{BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CompletionClient, TokenSource, UpstreamError};
use crate::config::UpstreamSettings;
use crate::types::ChatMessage;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: Option<ChunkDelta>,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    content: Option<String>,
}

#[derive(Clone, Default)]
pub struct OpenAiClient {
    http: reqwest::Client,
}

impl OpenAiClient {
    pub fn new() -> Self {
        Self::default()
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn open(
        &self,
        settings: &UpstreamSettings,
        messages: Vec<ChatMessage>,
    ) -> Result<Box<dyn TokenSource>, UpstreamError> {
        let body = ChatCompletionRequest {
            model: &settings.model,
            messages,
            max_tokens: settings.max_tokens,
            stream: true,
        };

        let response = self
            .http
            .post(completions_url(&settings.base_url))
            .bearer_auth(&settings.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
            return Err(UpstreamError::Api {
                status: Some(status.as_u16()),
                body,
            });
        }

        tracing::debug!(model = %settings.model, "Upstream stream opened");
        Ok(Box::new(OpenAiTokenSource {
            events: Some(response.bytes_stream().eventsource().boxed()),
        }))
    }
}

type EventStream =
    BoxStream<'static, Result<eventsource_stream::Event, EventStreamError<reqwest::Error>>>;

pub struct OpenAiTokenSource {
    /// `None` once finished or cancelled; dropping it closes the connection
    events: Option<EventStream>,
}

#[async_trait]
impl TokenSource for OpenAiTokenSource {
    async fn next_fragment(&mut self) -> Option<Result<String, UpstreamError>> {
        loop {
            let events = self.events.as_mut()?;
            let event = match events.next().await {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    self.events = None;
                    return Some(Err(UpstreamError::Stream(e.to_string())));
                }
                None => {
                    self.events = None;
                    return None;
                }
            };

            let data = event.data.trim();
            if data.is_empty() {
                continue;
            }
            if data == "[DONE]" {
                self.events = None;
                return None;
            }

            let chunk: ChatCompletionChunk = match serde_json::from_str(data) {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.events = None;
                    return Some(Err(UpstreamError::Decode(e)));
                }
            };

            if let Some(error) = chunk.error {
                self.events = None;
                return Some(Err(UpstreamError::Api {
                    status: None,
                    body: serde_json::json!({ "error": error }),
                }));
            }

            let text = chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta)
                .and_then(|delta| delta.content)
                .unwrap_or_default();
            if !text.is_empty() {
                return Some(Ok(text));
            }
        }
    }

    fn cancel(&mut self) {
        if self.events.take().is_some() {
            tracing::debug!("Upstream stream cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::upstream::describe;
    use crate::types::{ChatMessage, MessageContent};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> UpstreamSettings {
        UpstreamSettings {
            api_key: "sk-test".into(),
            base_url: format!("{}/v1/", server.uri()),
            model: "test-model".into(),
            max_tokens: 128,
        }
    }

    fn messages() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("be brief"),
            ChatMessage::user(MessageContent::Text("hi".into())),
        ]
    }

    fn sse_body(frames: &[&str]) -> String {
        frames.iter().map(|f| format!("data: {f}\n\n")).collect()
    }

    async fn collect(mut source: Box<dyn TokenSource>) -> Vec<Result<String, String>> {
        let mut out = Vec::new();
        while let Some(item) = source.next_fragment().await {
            out.push(item.map_err(|e| describe(&e)));
        }
        out
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            completions_url("https://api.example.com/v1/"),
            "https://api.example.com/v1/chat/completions"
        );
        assert_eq!(
            completions_url("https://api.example.com/v1"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_streams_content_deltas() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "max_tokens": 128,
                "stream": true,
                "messages": [
                    { "role": "system", "content": "be brief" },
                    { "role": "user", "content": "hi" }
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body(&[
                        r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
                        r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
                        r#"{"choices":[{"delta":{"content":""}}]}"#,
                        r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
                        r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
                        "[DONE]",
                    ])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let source = OpenAiClient::new()
            .open(&settings(&server), messages())
            .await
            .expect("stream should open");

        assert_eq!(
            collect(source).await,
            vec![Ok("Hel".to_string()), Ok("lo".to_string())]
        );
    }

    #[tokio::test]
    async fn test_error_status_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({ "error": { "message": "Invalid API key" } })),
            )
            .mount(&server)
            .await;

        let err = match OpenAiClient::new().open(&settings(&server), messages()).await {
            Ok(_) => panic!("expected an error"),
            Err(err) => err,
        };

        assert!(matches!(err, UpstreamError::Api { status: Some(401), .. }));
        assert_eq!(describe(&err), "Invalid API key");
    }

    #[tokio::test]
    async fn test_in_stream_error_ends_stream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body(&[
                        r#"{"choices":[{"delta":{"content":"partial"}}]}"#,
                        r#"{"error":{"message":"model overloaded"}}"#,
                        r#"{"choices":[{"delta":{"content":"never"}}]}"#,
                    ])),
            )
            .mount(&server)
            .await;

        let source = OpenAiClient::new()
            .open(&settings(&server), messages())
            .await
            .unwrap();

        assert_eq!(
            collect(source).await,
            vec![Ok("partial".to_string()), Err("model overloaded".to_string())]
        );
    }

    #[tokio::test]
    async fn test_cancel_stops_fragments() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body(&[
                        r#"{"choices":[{"delta":{"content":"one"}}]}"#,
                        r#"{"choices":[{"delta":{"content":"two"}}]}"#,
                    ])),
            )
            .mount(&server)
            .await;

        let mut source = OpenAiClient::new()
            .open(&settings(&server), messages())
            .await
            .unwrap();

        assert_eq!(source.next_fragment().await.unwrap().unwrap(), "one");
        source.cancel();
        source.cancel();
        assert!(source.next_fragment().await.is_none());
    }
}
