//! Abstractor Ranking
//!
//! Embedding-based relevance ranking over budgeted document chunks.
//! Candidate chunks are embedded in small, deliberately rate-limited
//! batches, scored by a weighted blend of cosine similarity and heuristic
//! importance, and the winners are returned in original document order so
//! downstream consumers read coherent, sequential text.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ranker;
mod similarity;

pub use ranker::{RankedSelection, RankerConfig, RelevanceRanker};
pub use similarity::cosine_similarity;
