//! Configuration for the chunking components
//!
//! Every threshold and keyword list lives in an explicit config struct
//! passed into the component's constructor, so tests can vary them without
//! global mutation.

use serde::{Deserialize, Serialize};

/// Configuration for the section segmenter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Minimum section body length (characters); shorter detections are
    /// discarded as spurious matches
    pub min_section_len: usize,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            min_section_len: 40,
        }
    }
}

/// Configuration for the overlap chunker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Fraction of `max_size` a boundary must fall at or after to be used
    /// as the break point
    pub boundary_fraction: f64,

    /// Trailing chunks shorter than this are dropped as noise
    pub min_tail_len: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            boundary_fraction: 0.7,
            min_tail_len: 50,
        }
    }
}

/// Configuration for the importance scorer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Domain keywords; each distinct keyword found in the lower-cased
    /// text adds `keyword_increment` once
    pub keywords: Vec<String>,

    /// Substrings marking critical section titles
    pub critical_sections: Vec<String>,

    /// Increment per distinct keyword hit
    pub keyword_increment: f64,

    /// Increment per critical-section title match
    pub section_increment: f64,

    /// Bonus for chunks in the moderate length band
    pub length_bonus: f64,

    /// Lower edge of the moderate length band (characters)
    pub moderate_len_min: usize,

    /// Upper edge of the moderate length band (characters)
    pub moderate_len_max: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            critical_sections: DEFAULT_CRITICAL_SECTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            keyword_increment: 0.5,
            section_increment: 1.0,
            length_bonus: 0.25,
            moderate_len_min: 200,
            moderate_len_max: 1500,
        }
    }
}

/// Configuration for the coverage budgeter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgeterConfig {
    /// Characters per estimated token
    pub chars_per_token: usize,

    /// Chunk size (characters) used when cutting section content
    pub chunk_size: usize,

    /// Overlap (characters) between consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for BudgeterConfig {
    fn default() -> Self {
        Self {
            chars_per_token: crate::tokens::CHARS_PER_TOKEN,
            chunk_size: 1200,
            chunk_overlap: 150,
        }
    }
}

/// Combined configuration for the whole chunking layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Section segmenter settings
    pub segmenter: SegmenterConfig,

    /// Overlap chunker settings
    pub chunker: ChunkerConfig,

    /// Importance scorer settings
    pub scoring: ScoringConfig,

    /// Coverage budgeter settings
    pub budgeter: BudgeterConfig,
}

impl ChunkingConfig {
    /// Fine-grained preset: smaller chunks with more overlap, trading extra
    /// backend calls for tighter clause locality
    pub fn fine_grained() -> Self {
        Self {
            budgeter: BudgeterConfig {
                chunk_size: 800,
                chunk_overlap: 120,
                ..BudgeterConfig::default()
            },
            ..Self::default()
        }
    }

    /// Broad preset: larger chunks with less overlap, fewer backend calls
    /// for long documents
    pub fn broad() -> Self {
        Self {
            budgeter: BudgeterConfig {
                chunk_size: 2_000,
                chunk_overlap: 200,
                ..BudgeterConfig::default()
            },
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.budgeter.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.budgeter.chunk_overlap >= self.budgeter.chunk_size {
            return Err("chunk_overlap must be smaller than chunk_size".to_string());
        }
        if self.budgeter.chars_per_token == 0 {
            return Err("chars_per_token must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.chunker.boundary_fraction) {
            return Err("boundary_fraction must be in [0, 1]".to_string());
        }
        if self.scoring.moderate_len_min > self.scoring.moderate_len_max {
            return Err("moderate length band is inverted".to_string());
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to a TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

/// Domain keywords: financial terms, contingency terms, dates, liability
const DEFAULT_KEYWORDS: &[&str] = &[
    "purchase price",
    "earnest money",
    "deposit",
    "escrow",
    "closing date",
    "closing costs",
    "financing",
    "loan",
    "interest rate",
    "appraisal",
    "contingency",
    "contingencies",
    "inspection",
    "title",
    "deed",
    "possession",
    "default",
    "liability",
    "indemnif",
    "termination",
    "warranty",
    "disclosure",
    "survey",
    "taxes",
];

/// Section-title substrings that mark high-signal sections
const DEFAULT_CRITICAL_SECTIONS: &[&str] = &[
    "purchase price",
    "earnest",
    "financing",
    "closing",
    "contingenc",
    "inspection",
    "title",
    "possession",
    "default",
    "termination",
    "disclosure",
];
