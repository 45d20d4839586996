//! Chunk module - the unit of text handed to external capabilities

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A bounded span of document text plus scoring metadata.
///
/// Chunk identity is the `(section_index, chunk_index)` pair, rendered into
/// a stable string id. Importance is assigned once at creation and never
/// mutated; the embedding is attached lazily, only when a relevance-ranking
/// operation runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable composite identifier, e.g. `"s003.c002"`
    pub id: String,

    /// The chunk text
    pub text: String,

    /// Title of the section this chunk was cut from
    pub section_title: String,

    /// Index of the parent section in document order
    pub section_index: usize,

    /// Index of this chunk within its section
    pub chunk_index: usize,

    /// Heuristic importance score, >= 1.0
    pub importance: f64,

    /// Embedding vector, attached lazily during ranking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// Create a new chunk with a composite id derived from its indices
    pub fn new(
        section_index: usize,
        chunk_index: usize,
        text: impl Into<String>,
        section_title: impl Into<String>,
        importance: f64,
    ) -> Self {
        Self {
            id: format!("s{:03}.c{:03}", section_index, chunk_index),
            text: text.into(),
            section_title: section_title.into(),
            section_index,
            chunk_index,
            importance,
            embedding: None,
        }
    }

    /// Document-order key: section index first, then intra-section index
    pub fn position(&self) -> (usize, usize) {
        (self.section_index, self.chunk_index)
    }
}

/// A chunk paired with its similarity to a query, used only during ranking.
///
/// The combined score is a fixed weighted blend:
/// `0.7 × similarity + 0.3 × (importance / 5)`.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The underlying chunk
    pub chunk: Chunk,

    /// Cosine similarity between the chunk and the query embedding
    pub similarity: f64,

    /// Weighted blend of similarity and normalized importance
    pub combined_score: f64,
}

impl ScoredChunk {
    /// Weight given to semantic similarity in the combined score
    pub const SIMILARITY_WEIGHT: f64 = 0.7;

    /// Weight given to normalized heuristic importance
    pub const IMPORTANCE_WEIGHT: f64 = 0.3;

    /// Divisor that maps raw importance into roughly [0, 1]
    pub const IMPORTANCE_NORM: f64 = 5.0;

    /// Pair a chunk with its query similarity and compute the blend
    pub fn new(chunk: Chunk, similarity: f64) -> Self {
        let combined_score = Self::SIMILARITY_WEIGHT * similarity
            + Self::IMPORTANCE_WEIGHT * (chunk.importance / Self::IMPORTANCE_NORM);
        Self {
            chunk,
            similarity,
            combined_score,
        }
    }

    /// Descending comparison by combined score, for selection sorts
    pub fn cmp_by_score_desc(&self, other: &Self) -> Ordering {
        other
            .combined_score
            .partial_cmp(&self.combined_score)
            .unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id_is_composite_and_sortable() {
        let a = Chunk::new(0, 1, "text", "Terms", 1.0);
        let b = Chunk::new(1, 0, "text", "Closing", 1.0);
        assert_eq!(a.id, "s000.c001");
        assert_eq!(b.id, "s001.c000");
        assert!(a.id < b.id);
        assert!(a.position() < b.position());
    }

    #[test]
    fn test_combined_score_blend() {
        let chunk = Chunk::new(0, 0, "text", "Terms", 2.5);
        let scored = ScoredChunk::new(chunk, 0.8);
        // 0.7 * 0.8 + 0.3 * (2.5 / 5) = 0.56 + 0.15
        assert!((scored.combined_score - 0.71).abs() < 1e-9);
    }

    #[test]
    fn test_score_ordering_is_descending() {
        let low = ScoredChunk::new(Chunk::new(0, 0, "a", "T", 1.0), 0.1);
        let high = ScoredChunk::new(Chunk::new(0, 1, "b", "T", 1.0), 0.9);
        let mut v = vec![low, high];
        v.sort_by(|a, b| a.cmp_by_score_desc(b));
        assert!(v[0].similarity > v[1].similarity);
    }
}
