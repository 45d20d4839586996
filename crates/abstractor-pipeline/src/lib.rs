//! Abstractor Pipeline
//!
//! Turns long, unstructured real-estate contracts into schema-conformant
//! structured records.
//!
//! # Overview
//!
//! The pipeline holds two interchangeable extraction backends: a fast
//! primary with a small context window and a slower secondary with a much
//! larger one. A size check decides whether the document fits in one call;
//! oversized documents are split into overlapping chunks, each chunk is
//! extracted independently, and the partial records are merged in chunk
//! order. Backend output that resists parsing degrades to a schema default
//! record rather than failing the request, and every result carries a
//! completeness-based confidence score.
//!
//! # Architecture
//!
//! ```text
//! Text → Size check → {single call | chunked calls} → merge → parse → confidence
//!                                   │ (non-quota failure)
//!                                   └→ retry on secondary backend
//! ```
//!
//! # Example Usage
//!
//! ```no_run
//! use abstractor_pipeline::{ExtractionPipeline, ExtractionRequest, PipelineConfig};
//! use abstractor_llm::{GeminiBackend, OpenAiBackend};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let primary = OpenAiBackend::new("sk-...", "gpt-4o-mini");
//! let secondary = GeminiBackend::new("...", "gemini-2.0-flash");
//! let pipeline = ExtractionPipeline::new(primary, secondary, PipelineConfig::default());
//!
//! let result = pipeline
//!     .extract(ExtractionRequest {
//!         text: std::fs::read_to_string("contract.txt")?,
//!         schema_id: "purchase_agreement".to_string(),
//!     })
//!     .await?;
//!
//! println!("Confidence: {} via {}", result.confidence, result.backend_used);
//! println!("{}", serde_json::to_string_pretty(&result.data)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod orchestrator;
mod parser;
mod types;

#[cfg(test)]
mod tests;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use orchestrator::ExtractionPipeline;
pub use parser::parse_record;
pub use types::{CallStrategy, ExtractionMetadata, ExtractionRequest, ExtractionResult};
