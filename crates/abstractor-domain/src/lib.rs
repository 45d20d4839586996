//! Abstractor Domain Layer
//!
//! This crate contains the core data model shared by every layer of the
//! document-analysis pipeline. It defines the fundamental value objects
//! (sections, chunks, extraction schemas), the record-merge fold, the
//! completeness-based confidence formula, and the trait interfaces behind
//! which the external language-model and embedding capabilities live.
//!
//! ## Key Concepts
//!
//! - **Section**: A structurally-detected subdivision of a document
//! - **Chunk**: A bounded span of document text plus scoring metadata
//! - **PartialRecord / MergedRecord**: per-chunk extraction output and its
//!   fold into one final record (latest non-null occurrence wins)
//! - **ExtractionSchema**: required-field lists and prompt templates keyed
//!   by schema id
//! - **Confidence**: `round(100 × completed required fields / total)`
//!
//! ## Architecture
//!
//! Infrastructure implementations (HTTP backends, chunking algorithms, the
//! orchestrating pipeline) live in other crates. This crate only holds pure
//! logic and trait definitions for external interactions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod confidence;
pub mod record;
pub mod schema;
pub mod section;
pub mod traits;

// Re-exports for convenience
pub use chunk::{Chunk, ScoredChunk};
pub use confidence::{compute_confidence, resolve_path};
pub use record::merge_records;
pub use schema::{ExtractionSchema, FieldKind, RequiredField, SchemaRegistry};
pub use section::Section;
pub use traits::{BackendFailure, EmbeddingProvider, ExtractionBackend};
