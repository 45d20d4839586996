//! Heuristic importance scoring

use crate::config::ScoringConfig;

/// Scores a chunk or section by keyword density, section-title relevance,
/// and length banding.
///
/// Pure function over its inputs: the same text and title always yield the
/// same score. The baseline is 1.0; every score is at least that.
pub struct ImportanceScorer {
    config: ScoringConfig,
}

impl ImportanceScorer {
    /// Create a scorer with the given keyword lists and weights
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Score a span of text, optionally with the title of its section.
    ///
    /// Each distinct keyword found in the lower-cased text adds a fixed
    /// increment once (no diminishing returns, no per-occurrence counting).
    /// Each critical-section substring found in the lower-cased title adds
    /// a larger increment. Text in the moderate length band gets a small
    /// bonus, rewarding spans likely to hold complete clauses.
    pub fn score(&self, text: &str, section_title: Option<&str>) -> f64 {
        let mut score = 1.0;

        let lowered = text.to_lowercase();
        for keyword in &self.config.keywords {
            if lowered.contains(keyword.as_str()) {
                score += self.config.keyword_increment;
            }
        }

        if let Some(title) = section_title {
            let title = title.to_lowercase();
            for marker in &self.config.critical_sections {
                if title.contains(marker.as_str()) {
                    score += self.config.section_increment;
                }
            }
        }

        let len = text.len();
        if len >= self.config.moderate_len_min && len <= self.config.moderate_len_max {
            score += self.config.length_bonus;
        }

        score
    }
}

impl Default for ImportanceScorer {
    fn default() -> Self {
        Self::new(ScoringConfig::default())
    }
}
