//! Abstractor Backend Layer
//!
//! Pluggable implementations of the extraction and embedding capabilities.
//!
//! # Providers
//!
//! - [`MockBackend`] / [`MockEmbedder`]: deterministic mocks for testing
//! - [`OpenAiBackend`] / [`OpenAiEmbedder`]: OpenAI-compatible HTTP API
//!   (the "primary" extraction backend, small context window)
//! - [`GeminiBackend`]: Gemini HTTP API (the "secondary" extraction
//!   backend, much larger context window)
//!
//! # Examples
//!
//! ```
//! use abstractor_llm::MockBackend;
//! use abstractor_domain::ExtractionBackend;
//!
//! # tokio_test::block_on(async {
//! let backend = MockBackend::new(r#"{"purchase_price": 450000}"#);
//! let result = backend.extract("test prompt").await.unwrap();
//! assert!(result.contains("450000"));
//! # });
//! ```

#![warn(missing_docs)]

pub mod gemini;
pub mod openai;

use abstractor_domain::{BackendFailure, EmbeddingProvider, ExtractionBackend};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use gemini::GeminiBackend;
pub use openai::{OpenAiBackend, OpenAiEmbedder};

/// Errors that can occur during extraction backend calls
#[derive(Error, Debug)]
pub enum BackendError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Quota exhausted or rate limit hit; fallback will not help
    #[error("Quota exceeded: {0}")]
    Quota(String),

    /// Requested model is not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("Backend error: {0}")]
    Other(String),
}

impl BackendFailure for BackendError {
    fn is_quota(&self) -> bool {
        matches!(self, BackendError::Quota(_))
    }
}

/// Errors that can occur during embedding calls
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Generic error
    #[error("Embedding error: {0}")]
    Other(String),
}

/// Whether an error body carries a quota/rate-limit marker.
///
/// Backend-specific marker strings observed in provider error payloads;
/// matched case-insensitively.
pub fn is_quota_marker(message: &str) -> bool {
    let lowered = message.to_lowercase();
    lowered.contains("quota")
        || lowered.contains("rate limit")
        || lowered.contains("resource_exhausted")
        || lowered.contains("too many requests")
}

/// Scripted behavior for one mock rule
#[derive(Debug, Clone)]
enum MockScript {
    Respond(String),
    Fail(String),
    FailQuota(String),
}

/// Mock extraction backend for deterministic testing.
///
/// Returns pre-configured responses without making any network calls.
/// Rules match on prompt substrings (pipeline prompts embed the chunk
/// text, so tests key rules off chunk content).
///
/// # Examples
///
/// ```
/// use abstractor_llm::MockBackend;
/// use abstractor_domain::ExtractionBackend;
///
/// # tokio_test::block_on(async {
/// let mut backend = MockBackend::new("{}");
/// backend.add_rule("earnest", r#"{"earnest_money": 5000}"#);
/// let out = backend.extract("... the earnest money is ...").await.unwrap();
/// assert!(out.contains("5000"));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    name: String,
    default_response: String,
    rules: Arc<Mutex<Vec<(String, MockScript)>>>,
    call_count: Arc<Mutex<usize>>,
    single_call_token_limit: usize,
    chunk_size_chars: usize,
}

impl MockBackend {
    /// Create a mock with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            name: "mock".to_string(),
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            single_call_token_limit: 2_000,
            chunk_size_chars: 4_000,
        }
    }

    /// Set the name reported in results
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the single-call token threshold
    pub fn with_single_call_limit(mut self, tokens: usize) -> Self {
        self.single_call_token_limit = tokens;
        self
    }

    /// Set the chunk size in characters
    pub fn with_chunk_size(mut self, chars: usize) -> Self {
        self.chunk_size_chars = chars;
        self
    }

    /// Respond with `response` to any prompt containing `needle`
    pub fn add_rule(&mut self, needle: impl Into<String>, response: impl Into<String>) {
        self.rules
            .lock()
            .unwrap()
            .push((needle.into(), MockScript::Respond(response.into())));
    }

    /// Fail any prompt containing `needle` with a generic error
    pub fn add_error_rule(&mut self, needle: impl Into<String>, message: impl Into<String>) {
        self.rules
            .lock()
            .unwrap()
            .push((needle.into(), MockScript::Fail(message.into())));
    }

    /// Fail every call with a generic error
    pub fn fail_all(message: impl Into<String>) -> Self {
        let backend = Self::new("");
        backend
            .rules
            .lock()
            .unwrap()
            .push((String::new(), MockScript::Fail(message.into())));
        backend
    }

    /// Fail every call with a quota error
    pub fn fail_all_with_quota(message: impl Into<String>) -> Self {
        let backend = Self::new("");
        backend
            .rules
            .lock()
            .unwrap()
            .push((String::new(), MockScript::FailQuota(message.into())));
        backend
    }

    /// Number of times `extract` was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl ExtractionBackend for MockBackend {
    type Error = BackendError;

    async fn extract(&self, prompt: &str) -> Result<String, Self::Error> {
        *self.call_count.lock().unwrap() += 1;

        let rules = self.rules.lock().unwrap();
        for (needle, script) in rules.iter() {
            if prompt.contains(needle.as_str()) {
                return match script {
                    MockScript::Respond(r) => Ok(r.clone()),
                    MockScript::Fail(m) => Err(BackendError::Other(m.clone())),
                    MockScript::FailQuota(m) => Err(BackendError::Quota(m.clone())),
                };
            }
        }

        Ok(self.default_response.clone())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn single_call_token_limit(&self) -> usize {
        self.single_call_token_limit
    }

    fn chunk_size_chars(&self) -> usize {
        self.chunk_size_chars
    }
}

/// Mock embedding provider for deterministic testing.
///
/// Rules map prompt substrings to fixed vectors; unmatched texts get a
/// default unit vector on the last axis. Failure can be scheduled after a
/// number of successful calls to exercise batch-failure handling.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dims: usize,
    rules: Arc<Mutex<Vec<(String, Vec<f32>)>>>,
    fail_after: Option<usize>,
    call_count: Arc<Mutex<usize>>,
}

impl MockEmbedder {
    /// Create an embedder producing `dims`-dimensional vectors
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            rules: Arc::new(Mutex::new(Vec::new())),
            fail_after: None,
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Return `vector` for any text containing `needle`
    pub fn add_rule(&mut self, needle: impl Into<String>, vector: Vec<f32>) {
        self.rules.lock().unwrap().push((needle.into(), vector));
    }

    /// Fail every call after `calls` successful ones
    pub fn fail_after(mut self, calls: usize) -> Self {
        self.fail_after = Some(calls);
        self
    }

    /// Number of times `embed` was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    type Error = EmbeddingError;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        if let Some(limit) = self.fail_after {
            if count > limit {
                return Err(EmbeddingError::Other("mock embedder failure".to_string()));
            }
        }

        let rules = self.rules.lock().unwrap();
        for (needle, vector) in rules.iter() {
            if text.contains(needle.as_str()) {
                return Ok(vector.clone());
            }
        }

        let mut vector = vec![0.0; self.dims];
        if let Some(last) = vector.last_mut() {
            *last = 1.0;
        }
        Ok(vector)
    }

    fn dims(&self) -> usize {
        self.dims
    }
}
