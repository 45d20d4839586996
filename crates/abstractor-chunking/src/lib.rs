//! Abstractor Chunking
//!
//! Section-aware document splitting for the extraction pipeline:
//!
//! - [`SectionSegmenter`]: detects structural headers (ARTICLE/SECTION
//!   headings, numbered clauses, all-caps labels) and cuts the document
//!   into sections
//! - [`OverlapChunker`]: splits a span into bounded, overlapping pieces at
//!   sentence or newline boundaries
//! - [`ImportanceScorer`]: heuristic keyword/section/length scoring
//! - [`CoverageBudgeter`]: token-budget-constrained section selection with
//!   a reported coverage fraction
//!
//! All components are pure functions over in-memory text, configured
//! through explicit config structs so thresholds can vary per deployment
//! and per test.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod budgeter;
mod chunker;
mod config;
mod scorer;
mod segmenter;
mod tokens;

pub use budgeter::{BudgetedChunks, CoverageBudgeter, Strategy};
pub use chunker::OverlapChunker;
pub use config::{
    BudgeterConfig, ChunkerConfig, ChunkingConfig, ScoringConfig, SegmenterConfig,
};
pub use scorer::ImportanceScorer;
pub use segmenter::SectionSegmenter;
pub use tokens::{estimate_tokens, CHARS_PER_TOKEN};
