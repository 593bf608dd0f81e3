//! Retry utilities for transient model API failures.
//!
//! Provides classification of retryable errors, exponential backoff, and a
//! retry wrapper the evaluation loop uses per sample.

use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use crate::error::EvalError;
use std::time::Duration;
use tracing::warn;

/// Determine whether an evaluation error is worth retrying.
///
/// Retryable errors: timeouts, rate limits (429), server errors (5xx).
/// Non-retryable: auth failures, bad requests, unreadable images.
pub fn is_retryable(error: &EvalError) -> bool {
    match error {
        EvalError::Timeout { .. } => true,
        EvalError::Model {
            status_code,
            message,
        } => {
            // Classify by HTTP status code when available (structured)
            if let Some(code) = status_code {
                return *code == 429 || (500..=599).contains(code);
            }
            // Fallback for non-HTTP errors (e.g., connection refused, DNS failure)
            message.contains("timed out") || message.contains("connect")
        }
        _ => false,
    }
}

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 30 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(30_000))
}

/// Call `generate`, retrying transient failures with exponential backoff.
pub async fn generate_with_retry(
    provider: &dyn LlmProvider,
    request: &LlmRequest,
    max_attempts: u32,
    base_delay_ms: u64,
) -> Result<LlmResponse, EvalError> {
    let mut attempt = 0;
    loop {
        match provider.generate(request).await {
            Ok(response) => return Ok(response),
            Err(error) => {
                if attempt + 1 >= max_attempts || !is_retryable(&error) {
                    return Err(error);
                }
                let delay = backoff_duration(attempt, base_delay_ms);
                warn!(
                    provider = provider.name(),
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Retrying model call"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_timeout_is_retryable() {
        let err = EvalError::Timeout { timeout_ms: 60000 };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = EvalError::Model {
            message: "HTTP 429: rate limit exceeded".to_string(),
            status_code: Some(429),
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_server_error_is_retryable() {
        let err = EvalError::Model {
            message: "HTTP 503: service unavailable".to_string(),
            status_code: Some(503),
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_auth_error_not_retryable() {
        let err = EvalError::Model {
            message: "HTTP 401: unauthorized".to_string(),
            status_code: Some(401),
        };
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_image_error_not_retryable() {
        let err = EvalError::Image {
            path: PathBuf::from("test.jpg"),
            message: "no such file".to_string(),
        };
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_message_with_500_in_body_not_retryable_without_status() {
        let err = EvalError::Model {
            message: "Processed 500 tokens successfully".to_string(),
            status_code: None,
        };
        assert!(!is_retryable(&err));
    }

    #[test]
    fn test_connection_error_retryable_without_status() {
        let err = EvalError::Model {
            message: "connection refused".to_string(),
            status_code: None,
        };
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_backoff_exponential() {
        assert_eq!(backoff_duration(0, 1000), Duration::from_millis(1000));
        assert_eq!(backoff_duration(1, 1000), Duration::from_millis(2000));
        assert_eq!(backoff_duration(2, 1000), Duration::from_millis(4000));
        assert_eq!(backoff_duration(3, 1000), Duration::from_millis(8000));
    }

    #[test]
    fn test_backoff_capped_at_30s() {
        assert_eq!(backoff_duration(10, 1000), Duration::from_millis(30_000));
    }

    use crate::llm::ImageInput;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures_left` calls, then succeeds.
    struct FlakyProvider {
        failures_left: AtomicU32,
        calls: AtomicU32,
        status_code: Option<u16>,
    }

    impl FlakyProvider {
        fn new(failures: u32, status_code: Option<u16>) -> Self {
            Self {
                failures_left: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
                status_code,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn generate(&self, _request: &LlmRequest) -> Result<LlmResponse, EvalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(EvalError::Model {
                    message: "stub failure".to_string(),
                    status_code: self.status_code,
                });
            }
            Ok(LlmResponse {
                text: "a bird".to_string(),
                model: "stub".to_string(),
                tokens_used: None,
                latency_ms: 1,
            })
        }

        fn timeout(&self) -> Duration {
            Duration::from_millis(100)
        }
    }

    fn request() -> LlmRequest {
        let image = ImageInput::from_bytes(&[0x89, 0x50, 0x4E, 0x47]);
        LlmRequest::new(image, "What is in this image?".to_string(), 16, 0.0)
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failures() {
        let provider = FlakyProvider::new(2, Some(503));
        let response = generate_with_retry(&provider, &request(), 3, 1)
            .await
            .unwrap();
        assert_eq!(response.text, "a bird");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_attempts_capped() {
        let provider = FlakyProvider::new(10, Some(503));
        let err = generate_with_retry(&provider, &request(), 2, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, EvalError::Model { .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_on_first_attempt() {
        let provider = FlakyProvider::new(10, Some(401));
        generate_with_retry(&provider, &request(), 3, 1)
            .await
            .unwrap_err();
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
