//! Request and result types for the extraction pipeline

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request to extract structured data from a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRequest {
    /// Raw document text (already OCR'd/converted upstream)
    pub text: String,

    /// Which registered schema to extract against
    pub schema_id: String,
}

/// How the document was sent to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStrategy {
    /// Document fit in one backend call
    Single,
    /// Document was split into per-chunk calls
    Chunked {
        /// Number of chunks dispatched
        chunks: usize,
    },
}

/// Per-request metadata attached to every result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Unique, time-ordered request identifier
    pub request_id: String,

    /// Schema the extraction ran against
    pub schema_id: String,

    /// Dispatch strategy chosen by the size check
    pub strategy: CallStrategy,

    /// Chunk calls that failed or produced unparseable output
    pub chunk_failures: usize,

    /// Wall-clock time spent on the request
    pub elapsed_ms: u64,
}

/// The outcome of a successful extraction request.
///
/// `confidence` is derived from `data` against the schema's required
/// fields; it must be recomputed if the record changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Merged structured record
    pub data: Value,

    /// Percentage of required fields completed, in `[0, 100]`
    pub confidence: u8,

    /// Name of the backend that produced the record; suffixed with
    /// `+parse-fallback` when the record is a schema default
    pub backend_used: String,

    /// Per-request metadata
    pub metadata: ExtractionMetadata,
}
