//! Model provider trait and request/response types.
//!
//! Defines the interface that all providers implement, plus the factory
//! that creates the right provider from CLI flags and config.

use crate::config::LlmConfig;
use crate::error::EvalError;
use async_trait::async_trait;
use base64::Engine;
use std::path::Path;
use std::time::Duration;

/// Base64-encoded image ready to send to a model API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Create an `ImageInput` from raw bytes, sniffing the format from the
    /// file header. Unrecognized formats default to JPEG.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let media_type = match image::guess_format(bytes) {
            Ok(format) => format.to_mime_type(),
            Err(_) => {
                tracing::warn!("Could not detect image format, defaulting to image/jpeg");
                "image/jpeg"
            }
        };

        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.to_string(),
        }
    }

    /// Read and encode an image file.
    pub fn from_path(path: &Path) -> Result<Self, EvalError> {
        let bytes = std::fs::read(path).map_err(|e| EvalError::Image {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::from_bytes(&bytes))
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// A request to classify or describe an image.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// The image to classify
    pub image: ImageInput,
    /// Text prompt for the model
    pub prompt: String,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl LlmRequest {
    pub fn new(image: ImageInput, prompt: String, max_tokens: u32, temperature: f32) -> Self {
        Self {
            image,
            prompt,
            max_tokens,
            temperature,
        }
    }
}

/// The response from a model call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Number of tokens used (input + output), if reported
    pub tokens_used: Option<u32>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all model providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn LlmProvider>` for dynamic dispatch).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging (e.g., "anthropic", "ollama").
    fn name(&self) -> &str;

    /// Check whether the provider is configured and reachable.
    async fn is_available(&self) -> bool;

    /// Generate one completion for the given request.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, EvalError>;

    /// Generate `n` independent completions for the same request.
    ///
    /// The default implementation loops over `generate`; providers whose
    /// API supports multiple completions per call override this.
    async fn generate_many(
        &self,
        request: &LlmRequest,
        n: u32,
    ) -> Result<Vec<String>, EvalError> {
        let mut completions = Vec::with_capacity(n as usize);
        for _ in 0..n {
            completions.push(self.generate(request).await?.text);
        }
        Ok(completions)
    }

    /// Per-request timeout for this provider.
    fn timeout(&self) -> Duration;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok()
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Factory that creates the appropriate provider from CLI flags and config.
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create a model provider based on provider name, config, and optional
    /// model override.
    pub fn create(
        provider: &str,
        config: &LlmConfig,
        model_override: Option<&str>,
        timeout_ms: u64,
    ) -> Result<Box<dyn LlmProvider>, EvalError> {
        match provider {
            "ollama" => {
                let cfg = config.ollama.clone().unwrap_or_default();
                let model = model_override
                    .map(String::from)
                    .unwrap_or(cfg.model.clone());
                Ok(Box::new(super::ollama::OllamaProvider::new(
                    &cfg.endpoint,
                    &model,
                    timeout_ms,
                )))
            }
            "openai" => {
                let cfg = config.openai.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| EvalError::Model {
                    message: "OpenAI API key not set. Set OPENAI_API_KEY env var.".to_string(),
                    status_code: None,
                })?;
                let model = model_override
                    .map(String::from)
                    .unwrap_or(cfg.model.clone());
                Ok(Box::new(super::openai::OpenAiProvider::new(
                    &api_key, &model, timeout_ms,
                )))
            }
            "anthropic" => {
                let cfg = config.anthropic.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| EvalError::Model {
                    message: "Anthropic API key not set. Set ANTHROPIC_API_KEY env var."
                        .to_string(),
                    status_code: None,
                })?;
                let model = model_override
                    .map(String::from)
                    .unwrap_or(cfg.model.clone());
                Ok(Box::new(super::anthropic::AnthropicProvider::new(
                    &api_key, &model, timeout_ms,
                )))
            }
            other => Err(EvalError::Model {
                message: format!("Unknown model provider: {other}"),
                status_code: None,
            }),
        }
    }
}
