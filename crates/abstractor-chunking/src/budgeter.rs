//! Token-budget-constrained coverage selection

use crate::chunker::OverlapChunker;
use crate::config::{BudgeterConfig, ChunkingConfig};
use crate::scorer::ImportanceScorer;
use crate::segmenter::SectionSegmenter;
use abstractor_domain::{Chunk, Section};
use tracing::{debug, info};

/// How the budgeter covered the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The whole document fit the budget and was chunked in full
    Full,
    /// Sections were ranked by importance and consumed until the budget ran
    /// out; lower-priority sections were dropped
    Hierarchical,
}

/// Result of budgeted chunking
#[derive(Debug, Clone)]
pub struct BudgetedChunks {
    /// Selected chunks, each scored at creation
    pub chunks: Vec<Chunk>,

    /// Strategy the budgeter applied
    pub strategy: Strategy,

    /// Fraction of the document's estimated tokens actually processed,
    /// in `[0, 1]`
    pub coverage: f64,
}

/// Selects and trims sections so the processed text fits a token budget.
///
/// When the whole document cannot be analyzed, the budget is spent on the
/// highest-signal sections first rather than truncating from the start,
/// which would bias toward whatever happens to appear first in the file.
pub struct CoverageBudgeter {
    segmenter: SectionSegmenter,
    chunker: OverlapChunker,
    scorer: ImportanceScorer,
    config: BudgeterConfig,
}

impl CoverageBudgeter {
    /// Build a budgeter from a combined chunking configuration
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            segmenter: SectionSegmenter::new(config.segmenter),
            chunker: OverlapChunker::new(config.chunker),
            scorer: ImportanceScorer::new(config.scoring),
            config: config.budgeter,
        }
    }

    /// Chunk `text` under `token_budget` estimated tokens.
    ///
    /// Documents that fit the budget are chunked whole (`Full`, coverage
    /// 1.0). Oversized documents are segmented, sections are scored and
    /// walked in descending importance; the first section that would
    /// overflow is trimmed to the remaining budget and everything after it
    /// is dropped (`Hierarchical`, coverage < 1.0).
    pub fn process(&self, text: &str, token_budget: usize) -> BudgetedChunks {
        let total_tokens = self.estimate(text);
        if total_tokens <= token_budget {
            let chunks = self.chunk_sections(&self.segmenter.segment(text));
            info!(chunks = chunks.len(), "document fits budget, full coverage");
            return BudgetedChunks {
                chunks,
                strategy: Strategy::Full,
                coverage: 1.0,
            };
        }

        let sections = self.segmenter.segment(text);
        debug!(
            sections = sections.len(),
            total_tokens, token_budget, "budget exceeded, ranking sections"
        );

        // Order section indices by score descending, document order on ties.
        let mut order: Vec<usize> = (0..sections.len()).collect();
        let scores: Vec<f64> = sections
            .iter()
            .map(|s| self.scorer.score(&s.content, Some(&s.title)))
            .collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        let mut chunks = Vec::new();
        let mut remaining = token_budget;
        let mut processed_tokens = 0usize;

        for &idx in &order {
            if remaining == 0 {
                break;
            }
            let section = &sections[idx];
            let section_tokens = self.estimate(&section.content);

            if section_tokens <= remaining {
                chunks.extend(self.chunk_one_section(idx, section, &section.content));
                remaining -= section_tokens;
                processed_tokens += section_tokens;
            } else {
                // Partial fit: keep the prefix that fills the budget, then stop.
                let prefix_chars = remaining * self.config.chars_per_token;
                let prefix = truncate_at_boundary(&section.content, prefix_chars);
                chunks.extend(self.chunk_one_section(idx, section, prefix));
                processed_tokens += remaining;
                remaining = 0;
                break;
            }
        }

        let coverage = if total_tokens == 0 {
            1.0
        } else {
            (processed_tokens as f64 / total_tokens as f64).min(1.0)
        };

        info!(
            chunks = chunks.len(),
            coverage, "hierarchical coverage selection complete"
        );

        BudgetedChunks {
            chunks,
            strategy: Strategy::Hierarchical,
            coverage,
        }
    }

    /// Chunk every section in document order
    fn chunk_sections(&self, sections: &[Section]) -> Vec<Chunk> {
        sections
            .iter()
            .enumerate()
            .flat_map(|(idx, section)| self.chunk_one_section(idx, section, &section.content))
            .collect()
    }

    /// Chunk one section's content (or a prefix of it), scoring each piece
    fn chunk_one_section(&self, section_index: usize, section: &Section, content: &str) -> Vec<Chunk> {
        self.chunker
            .chunk(content, self.config.chunk_size, self.config.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, piece)| {
                let importance = self.scorer.score(&piece, Some(&section.title));
                Chunk::new(section_index, chunk_index, piece, section.title.clone(), importance)
            })
            .collect()
    }

    fn estimate(&self, text: &str) -> usize {
        text.len().div_ceil(self.config.chars_per_token)
    }
}

impl Default for CoverageBudgeter {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

/// Cut `text` to at most `max_chars`, snapping back to a char boundary
fn truncate_at_boundary(text: &str, max_chars: usize) -> &str {
    if max_chars >= text.len() {
        return text;
    }
    let mut end = max_chars;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budgeter() -> CoverageBudgeter {
        CoverageBudgeter::default()
    }

    fn contract(sections: &[(&str, usize)]) -> String {
        sections
            .iter()
            .map(|(title, len)| {
                let body: String = "The parties covenant and agree as follows. "
                    .chars()
                    .cycle()
                    .take(*len)
                    .collect();
                format!("{}\n{}\n", title, body)
            })
            .collect()
    }

    #[test]
    fn test_generous_budget_gives_full_coverage() {
        let text = contract(&[("ARTICLE I: Terms", 500), ("ARTICLE II: Closing", 500)]);
        let result = budgeter().process(&text, 10_000);
        assert_eq!(result.strategy, Strategy::Full);
        assert_eq!(result.coverage, 1.0);
        assert!(!result.chunks.is_empty());
    }

    #[test]
    fn test_tight_budget_is_hierarchical_with_partial_coverage() {
        let text = contract(&[
            ("ARTICLE I: Recitals", 2000),
            ("ARTICLE II: Purchase Price", 2000),
            ("ARTICLE III: Notices", 2000),
        ]);
        let result = budgeter().process(&text, 600);
        assert_eq!(result.strategy, Strategy::Hierarchical);
        assert!(result.coverage < 1.0);
        assert!(result.coverage > 0.0);
        assert!(!result.chunks.is_empty());
    }

    #[test]
    fn test_high_signal_sections_selected_first() {
        let text = contract(&[
            ("ARTICLE I: Notices", 1200),
            ("ARTICLE II: Purchase Price", 1200),
            ("ARTICLE III: Miscellany", 1200),
        ]);
        // Budget fits exactly one 1200-char section.
        let result = budgeter().process(&text, 300);
        assert_eq!(result.strategy, Strategy::Hierarchical);
        // The critical-title section wins the budget.
        assert!(result
            .chunks
            .iter()
            .all(|c| c.section_title.contains("Purchase Price")));
    }

    #[test]
    fn test_chunk_ids_carry_document_position() {
        let text = contract(&[("ARTICLE I: Terms", 3000), ("ARTICLE II: Closing", 3000)]);
        let result = budgeter().process(&text, 10_000);
        let mut seen = result.chunks.clone();
        seen.sort_by_key(|c| c.position());
        let ids: Vec<_> = seen.iter().map(|c| c.id.clone()).collect();
        let mut sorted_ids = ids.clone();
        sorted_ids.sort();
        // Lexicographic id order equals document order.
        assert_eq!(ids, sorted_ids);
    }

    #[test]
    fn test_every_chunk_is_scored() {
        let text = contract(&[("ARTICLE I: Purchase Price", 900)]);
        let result = budgeter().process(&text, 10_000);
        for chunk in &result.chunks {
            assert!(chunk.importance >= 1.0);
            assert!(chunk.embedding.is_none());
        }
    }

    #[test]
    fn test_unstructured_document_still_processes() {
        let text = "No headers at all, just one run-on paragraph. ".repeat(40);
        let result = budgeter().process(&text, 10_000);
        assert_eq!(result.strategy, Strategy::Full);
        assert!(result.chunks.iter().all(|c| c.section_title == "Document"));
    }
}
