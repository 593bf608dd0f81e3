//! OpenAI provider using the Chat Completions API.
//!
//! Sends the image via data URL in the user message content array. The
//! Chat Completions `n` parameter serves multi-completion sampling in a
//! single call.

use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::error::EvalError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// OpenAI provider using Chat Completions API.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
    timeout_ms: u64,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str, timeout_ms: u64) -> Self {
        Self::with_endpoint(
            api_key,
            model,
            "https://api.openai.com/v1/chat/completions",
            timeout_ms,
        )
    }

    /// Create with a custom endpoint (OpenAI-compatible APIs, tests).
    pub fn with_endpoint(api_key: &str, model: &str, endpoint: &str, timeout_ms: u64) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            timeout_ms,
        }
    }

    async fn chat(&self, request: &LlmRequest, n: Option<u32>) -> Result<ChatResponse, EvalError> {
        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            n,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image.data_url(),
                        },
                    },
                    ChatContent::Text {
                        text: request.prompt.clone(),
                    },
                ],
            }],
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EvalError::Timeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    EvalError::Model {
                        message: format!("OpenAI request failed: {e}"),
                        status_code: None,
                    }
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(EvalError::Model {
                message: format!("OpenAI HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        resp.json().await.map_err(|e| EvalError::Model {
            message: format!("Failed to parse OpenAI response: {e}"),
            status_code: None,
        })
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, EvalError> {
        let start = Instant::now();
        let chat_resp = self.chat(request, None).await?;

        let text = chat_resp
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| EvalError::Model {
                message: "OpenAI returned empty choices array".to_string(),
                status_code: None,
            })?;

        Ok(LlmResponse {
            text: text.trim().to_string(),
            model: chat_resp.model,
            tokens_used: chat_resp.usage.map(|u| u.total_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// One API call with `n` choices instead of n round trips.
    async fn generate_many(&self, request: &LlmRequest, n: u32) -> Result<Vec<String>, EvalError> {
        let chat_resp = self.chat(request, Some(n)).await?;

        let completions: Vec<String> = chat_resp
            .choices
            .into_iter()
            .filter_map(|c| c.message.content)
            .map(|text| text.trim().to_string())
            .collect();

        if completions.is_empty() {
            return Err(EvalError::Model {
                message: "OpenAI returned empty choices array".to_string(),
                status_code: None,
            });
        }
        Ok(completions)
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ImageInput;
    use httpmock::prelude::*;
    use serde_json::json;

    fn request() -> LlmRequest {
        LlmRequest::new(
            ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF]),
            "Classify this image.".to_string(),
            64,
            0.2,
        )
    }

    #[tokio::test]
    async fn test_generate() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).json_body(json!({
                "model": "gpt-4o-mini",
                "choices": [{"message": {"content": "sunflower"}}],
                "usage": {"total_tokens": 120}
            }));
        });

        let provider = OpenAiProvider::with_endpoint(
            "test-key",
            "gpt-4o-mini",
            &server.url("/v1/chat/completions"),
            5000,
        );
        let response = provider.generate(&request()).await.unwrap();

        assert_eq!(response.text, "sunflower");
        assert_eq!(response.tokens_used, Some(120));
    }

    #[tokio::test]
    async fn test_generate_many_uses_n_parameter() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .json_body_partial(r#"{"n": 3}"#);
            then.status(200).json_body(json!({
                "model": "gpt-4o-mini",
                "choices": [
                    {"message": {"content": "sunflower"}},
                    {"message": {"content": "daisy"}},
                    {"message": {"content": "sunflower"}}
                ],
                "usage": {"total_tokens": 200}
            }));
        });

        let provider = OpenAiProvider::with_endpoint(
            "test-key",
            "gpt-4o-mini",
            &server.url("/v1/chat/completions"),
            5000,
        );
        let completions = provider.generate_many(&request(), 3).await.unwrap();
        assert_eq!(completions, vec!["sunflower", "daisy", "sunflower"]);
    }

    #[tokio::test]
    async fn test_rate_limit_surfaces_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429).body("rate limited");
        });

        let provider = OpenAiProvider::with_endpoint(
            "test-key",
            "gpt-4o-mini",
            &server.url("/v1/chat/completions"),
            5000,
        );
        let err = provider.generate(&request()).await.unwrap_err();
        match err {
            EvalError::Model { status_code, .. } => assert_eq!(status_code, Some(429)),
            other => panic!("unexpected error: {other}"),
        }
    }
}
