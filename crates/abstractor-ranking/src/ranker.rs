//! Query-relevance ranking over budgeted chunks

use crate::similarity::cosine_similarity;
use abstractor_chunking::CoverageBudgeter;
use abstractor_domain::{Chunk, EmbeddingProvider, ScoredChunk};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the relevance ranker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    /// Cap on chunks considered for embedding, bounding external calls
    pub max_candidates: usize,

    /// Chunks embedded per batch
    pub batch_size: usize,

    /// Pause between embedding batches, respecting external rate limits
    pub batch_delay_ms: u64,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            max_candidates: 30,
            batch_size: 5,
            batch_delay_ms: 200,
        }
    }
}

/// Result of a ranking request.
///
/// `degraded` carries a message when embedding failures reduced ranking
/// quality (the selection fell back to heuristic importance, or only part
/// of the candidate set was embedded). Degradation is never a hard error.
#[derive(Debug, Clone)]
pub struct RankedSelection {
    /// Selected chunks in original document order
    pub chunks: Vec<Chunk>,

    /// Set when embedding failures reduced ranking quality
    pub degraded: Option<String>,
}

/// Ranks budgeted chunks against a free-text query.
///
/// Candidates are embedded in fixed-size batches with a mandatory delay
/// between batches; a batch failure halts further batching and ranking
/// proceeds with whatever embeddings succeeded. This is a deliberate
/// backpressure policy against external rate limits, not retry material.
pub struct RelevanceRanker<E> {
    embedder: E,
    budgeter: CoverageBudgeter,
    config: RankerConfig,
}

impl<E: EmbeddingProvider> RelevanceRanker<E> {
    /// Create a ranker over the given embedding capability and budgeter
    pub fn new(embedder: E, budgeter: CoverageBudgeter, config: RankerConfig) -> Self {
        Self {
            embedder,
            budgeter,
            config,
        }
    }

    /// Select the `top_k` chunks of `document_text` most relevant to
    /// `query`, returned in original document order.
    ///
    /// The document is first budget-chunked at `max_tokens_for_chunking`;
    /// the highest-importance candidates (capped) are embedded and scored
    /// by `0.7 × similarity + 0.3 × (importance / 5)`; the winners are
    /// re-sorted to document position so downstream consumers see
    /// sequentially readable text rather than relevance-shuffled fragments.
    pub async fn rank(
        &self,
        document_text: &str,
        query: &str,
        max_tokens_for_chunking: usize,
        top_k: usize,
    ) -> RankedSelection {
        let query_embedding = match self.embedder.embed(query).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "query embedding failed, falling back to importance order");
                let budgeted = self.budgeter.process(document_text, max_tokens_for_chunking);
                let chunks = top_by_importance(budgeted.chunks, top_k);
                return RankedSelection {
                    chunks,
                    degraded: Some(format!("query embedding failed: {}", e)),
                };
            }
        };

        let budgeted = self.budgeter.process(document_text, max_tokens_for_chunking);

        // Bound embedding calls: keep only the most important candidates.
        let mut candidates = budgeted.chunks;
        candidates.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.position().cmp(&b.position()))
        });
        candidates.truncate(self.config.max_candidates);

        let (embedded, degraded) = self.embed_in_batches(candidates).await;
        debug!(embedded = embedded.len(), "candidate embedding complete");

        let mut scored: Vec<ScoredChunk> = embedded
            .into_iter()
            .map(|chunk| {
                let similarity = chunk
                    .embedding
                    .as_deref()
                    .map(|v| cosine_similarity(v, &query_embedding) as f64)
                    .unwrap_or(0.0);
                ScoredChunk::new(chunk, similarity)
            })
            .collect();

        scored.sort_by(|a, b| {
            a.cmp_by_score_desc(b)
                .then(a.chunk.position().cmp(&b.chunk.position()))
        });
        scored.truncate(top_k);

        let mut chunks: Vec<Chunk> = scored.into_iter().map(|s| s.chunk).collect();
        chunks.sort_by_key(|c| c.position());

        RankedSelection { chunks, degraded }
    }

    /// Embed candidates in batches with inter-batch delay; a batch failure
    /// stops further batches and keeps what succeeded
    async fn embed_in_batches(&self, candidates: Vec<Chunk>) -> (Vec<Chunk>, Option<String>) {
        let mut embedded = Vec::with_capacity(candidates.len());
        let mut degraded = None;

        for (batch_idx, batch) in candidates.chunks(self.config.batch_size.max(1)).enumerate() {
            if batch_idx > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }

            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            match self.embedder.embed_batch(&texts).await {
                Ok(vectors) => {
                    for (chunk, vector) in batch.iter().zip(vectors) {
                        let mut chunk = chunk.clone();
                        chunk.embedding = Some(vector);
                        embedded.push(chunk);
                    }
                }
                Err(e) => {
                    warn!(batch = batch_idx, error = %e, "embedding batch failed, stopping");
                    degraded = Some(format!(
                        "embedding stopped after {} of {} candidates: {}",
                        embedded.len(),
                        candidates.len(),
                        e
                    ));
                    break;
                }
            }
        }

        (embedded, degraded)
    }

    /// Join selected chunks into one prompt-ready text, each prefixed with
    /// its section header
    pub fn assemble(chunks: &[Chunk]) -> String {
        chunks
            .iter()
            .map(|c| format!("[{}]\n{}", c.section_title, c.text))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }
}

/// Importance-ordered fallback selection, returned in document order
fn top_by_importance(mut chunks: Vec<Chunk>, top_k: usize) -> Vec<Chunk> {
    chunks.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.position().cmp(&b.position()))
    });
    chunks.truncate(top_k);
    chunks.sort_by_key(|c| c.position());
    chunks
}
