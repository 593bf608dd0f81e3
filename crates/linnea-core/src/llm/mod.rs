//! Vision model integration.
//!
//! Provides a provider abstraction over multiple model backends (Ollama,
//! OpenAI, Anthropic) plus retry helpers for transient API failures. Each
//! provider takes an image and a prompt and returns generated text; the
//! evaluation loop owns everything else.

pub(crate) mod anthropic;
pub(crate) mod ollama;
pub(crate) mod openai;
pub(crate) mod provider;
pub(crate) mod retry;

pub use provider::{
    resolve_env_var, ImageInput, LlmProvider, LlmProviderFactory, LlmRequest, LlmResponse,
};
pub use retry::{backoff_duration, generate_with_retry, is_retryable};
