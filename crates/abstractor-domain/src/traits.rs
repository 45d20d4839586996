//! Trait definitions for external capabilities
//!
//! These traits define the boundaries between the pipeline logic and the
//! network infrastructure. Concrete implementations live in other crates;
//! the pipeline only depends on the capability shape: "extract structured
//! data from text, given a prompt" and "embed text into a fixed-size
//! vector".

use async_trait::async_trait;

/// Error contract for extraction backends.
///
/// The orchestrator's fallback policy needs one classification from every
/// backend error: whether it signals a quota or rate-limit condition.
/// Quota errors are surfaced immediately instead of triggering fallback,
/// since retrying on another backend would not resolve them.
pub trait BackendFailure: std::fmt::Display + Send + Sync {
    /// True when the error signals quota exhaustion or rate limiting
    fn is_quota(&self) -> bool;
}

/// A structured-extraction capability.
///
/// Two interchangeable backends exist by convention: a "primary" with a
/// small context window and a "secondary" with a much larger one. The
/// orchestrator consults the descriptor methods instead of hard-coding
/// backend identity.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Error type for extraction calls
    type Error: BackendFailure;

    /// Issue one extraction request and return the raw text response
    async fn extract(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Identifier recorded in results (e.g. model name)
    fn name(&self) -> &str;

    /// Estimated-token threshold below which one call covers the document
    fn single_call_token_limit(&self) -> usize;

    /// Maximum chunk size in characters when the document must be split.
    ///
    /// Always smaller than the backend's hard limit, leaving headroom for
    /// the prompt preamble.
    fn chunk_size_chars(&self) -> usize;
}

/// A fixed-dimension text-embedding capability
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Error type for embedding calls
    type Error: std::fmt::Display + Send + Sync;

    /// Embed one text into a fixed-size vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error>;

    /// Embed a batch of texts, preserving input order.
    ///
    /// The default implementation issues sequential single-text calls and
    /// fails the whole batch on the first error.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, Self::Error> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Embedding vector dimensionality
    fn dims(&self) -> usize;
}
