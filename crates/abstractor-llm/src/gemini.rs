//! Gemini provider implementation
//!
//! The "secondary" extraction backend: slower per call, but with a context
//! window large enough to take most contracts in a single request. Used as
//! the fallback when the primary backend fails.

use crate::{is_quota_marker, BackendError};
use abstractor_domain::ExtractionBackend;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default request timeout (seconds); larger contexts take longer
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Default number of retry attempts for transport errors
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default single-call token threshold (large context window)
pub const DEFAULT_SINGLE_CALL_TOKEN_LIMIT: usize = 250_000;

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE_CHARS: usize = 400_000;

/// Gemini generateContent extraction backend
pub struct GeminiBackend {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
    single_call_token_limit: usize,
    chunk_size_chars: usize,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiBackend {
    /// Create a backend against the default endpoint
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
            single_call_token_limit: DEFAULT_SINGLE_CALL_TOKEN_LIMIT,
            chunk_size_chars: DEFAULT_CHUNK_SIZE_CHARS,
        }
    }

    /// Override the API endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the maximum number of retry attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Override the single-call token threshold
    pub fn with_single_call_limit(mut self, tokens: usize) -> Self {
        self.single_call_token_limit = tokens;
        self
    }

    /// Override the chunk size in characters
    pub fn with_chunk_size(mut self, chars: usize) -> Self {
        self.chunk_size_chars = chars;
        self
    }

    async fn call(&self, prompt: &str) -> Result<String, BackendError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );
        let request_body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig { temperature: 0.0 },
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(&request_body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed: GenerateResponse = response.json().await.map_err(|e| {
                            BackendError::InvalidResponse(format!("Failed to parse response: {}", e))
                        })?;
                        return parsed
                            .candidates
                            .into_iter()
                            .next()
                            .and_then(|c| c.content.parts.into_iter().next())
                            .map(|p| p.text)
                            .ok_or_else(|| {
                                BackendError::InvalidResponse("Empty candidates array".to_string())
                            });
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());

                    // RESOURCE_EXHAUSTED comes back in the error body.
                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                        || is_quota_marker(&error_text)
                    {
                        return Err(BackendError::Quota(error_text));
                    }
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(BackendError::ModelNotAvailable(self.model.clone()));
                    }
                    last_error = Some(BackendError::Communication(format!(
                        "HTTP {}: {}",
                        status, error_text
                    )));
                }
                Err(e) => {
                    last_error = Some(BackendError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // Exponential backoff: 1s, 2s, 4s, ...
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| BackendError::Communication("Max retries exceeded".to_string())))
    }
}

#[async_trait]
impl ExtractionBackend for GeminiBackend {
    type Error = BackendError;

    async fn extract(&self, prompt: &str) -> Result<String, Self::Error> {
        self.call(prompt).await
    }

    fn name(&self) -> &str {
        &self.model
    }

    fn single_call_token_limit(&self) -> usize {
        self.single_call_token_limit
    }

    fn chunk_size_chars(&self) -> usize {
        self.chunk_size_chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_construction() {
        let backend = GeminiBackend::new("test-key", "gemini-2.0-flash");
        assert_eq!(backend.name(), "gemini-2.0-flash");
        assert_eq!(backend.single_call_token_limit(), DEFAULT_SINGLE_CALL_TOKEN_LIMIT);
        assert_eq!(backend.chunk_size_chars(), DEFAULT_CHUNK_SIZE_CHARS);
    }

    #[test]
    fn test_backend_overrides() {
        let backend = GeminiBackend::new("test-key", "gemini-2.0-flash")
            .with_endpoint("http://localhost:9090/v1beta")
            .with_single_call_limit(100_000)
            .with_chunk_size(200_000)
            .with_max_retries(2);
        assert_eq!(backend.endpoint, "http://localhost:9090/v1beta");
        assert_eq!(backend.single_call_token_limit(), 100_000);
        assert_eq!(backend.chunk_size_chars(), 200_000);
        assert_eq!(backend.max_retries, 2);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_communication_error() {
        let backend = GeminiBackend::new("test-key", "gemini-2.0-flash")
            .with_endpoint("http://127.0.0.1:1/v1beta")
            .with_max_retries(1);
        let result = backend.extract("test").await;
        assert!(matches!(result, Err(BackendError::Communication(_))));
    }
}
