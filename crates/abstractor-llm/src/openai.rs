//! OpenAI-compatible provider implementation
//!
//! The "primary" extraction backend: fast and cheap, but with a small
//! context window, so longer contracts are chunked before reaching it.
//! Also hosts the embedding provider used by relevance ranking.
//!
//! # Features
//!
//! - Async HTTP communication via the chat-completions API
//! - Configurable endpoint, model, and size limits
//! - Retry logic with exponential backoff on transport errors
//! - Quota/rate-limit classification (HTTP 429 and body markers)

use crate::{is_quota_marker, BackendError, EmbeddingError};
use abstractor_domain::{EmbeddingProvider, ExtractionBackend};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Default request timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of retry attempts for transport errors
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default single-call token threshold (small context window)
pub const DEFAULT_SINGLE_CALL_TOKEN_LIMIT: usize = 12_000;

/// Default chunk size in characters, leaving prompt headroom
pub const DEFAULT_CHUNK_SIZE_CHARS: usize = 24_000;

/// OpenAI-compatible chat-completions extraction backend
pub struct OpenAiBackend {
    endpoint: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
    single_call_token_limit: usize,
    chunk_size_chars: usize,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OpenAiBackend {
    /// Create a backend against the default endpoint
    ///
    /// # Parameters
    ///
    /// - `api_key`: bearer token for the API
    /// - `model`: model to use (e.g. "gpt-4o-mini")
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

    /// Override the API endpoint (for proxies or compatible servers)
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
        let url = format!("{}/chat/completions", self.endpoint);
        let request_body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.0,
        };

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let parsed: ChatResponse = response.json().await.map_err(|e| {
                            BackendError::InvalidResponse(format!("Failed to parse response: {}", e))
                        })?;
                        return parsed
                            .choices
                            .into_iter()
                            .next()
                            .map(|c| c.message.content)
                            .ok_or_else(|| {
                                BackendError::InvalidResponse("Empty choices array".to_string())
                            });
                    }

                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());

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
impl ExtractionBackend for OpenAiBackend {
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

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Default embedding dimensionality
pub const DEFAULT_EMBEDDING_DIMS: usize = 1536;

/// OpenAI-compatible embedding provider
pub struct OpenAiEmbedder {
    endpoint: String,
    api_key: String,
    model: String,
    dims: usize,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    /// Create an embedder with the default model and endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dims: DEFAULT_EMBEDDING_DIMS,
            client,
        }
    }

    /// Override the API endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the embedding model and its dimensionality
    pub fn with_model(mut self, model: impl Into<String>, dims: usize) -> Self {
        self.model = model.into();
        self.dims = dims;
        self
    }

    async fn call(&self, inputs: Vec<&str>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/embeddings", self.endpoint);
        let request_body = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| EmbeddingError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(EmbeddingError::Communication(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    type Error = EmbeddingError;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        self.call(vec![text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::InvalidResponse("Empty embedding data".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Self::Error> {
        let inputs: Vec<&str> = texts.iter().map(|t| t.as_str()).collect();
        self.call(inputs).await
    }

    fn dims(&self) -> usize {
        self.dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_construction() {
        let backend = OpenAiBackend::new("sk-test", "gpt-4o-mini");
        assert_eq!(backend.name(), "gpt-4o-mini");
        assert_eq!(backend.single_call_token_limit(), DEFAULT_SINGLE_CALL_TOKEN_LIMIT);
        assert_eq!(backend.chunk_size_chars(), DEFAULT_CHUNK_SIZE_CHARS);
    }

    #[test]
    fn test_backend_overrides() {
        let backend = OpenAiBackend::new("sk-test", "gpt-4o-mini")
            .with_endpoint("http://localhost:8080/v1")
            .with_single_call_limit(4_000)
            .with_chunk_size(8_000)
            .with_max_retries(1);
        assert_eq!(backend.endpoint, "http://localhost:8080/v1");
        assert_eq!(backend.single_call_token_limit(), 4_000);
        assert_eq!(backend.chunk_size_chars(), 8_000);
        assert_eq!(backend.max_retries, 1);
    }

    #[test]
    fn test_embedder_construction() {
        let embedder = OpenAiEmbedder::new("sk-test").with_model("custom-embed", 768);
        assert_eq!(embedder.dims(), 768);
        assert_eq!(embedder.model, "custom-embed");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_communication_error() {
        let backend = OpenAiBackend::new("sk-test", "gpt-4o-mini")
            .with_endpoint("http://127.0.0.1:1/v1")
            .with_max_retries(1);
        let result = backend.extract("test").await;
        assert!(matches!(result, Err(BackendError::Communication(_))));
    }
}
