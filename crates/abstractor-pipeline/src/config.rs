//! Configuration for the extraction pipeline

use abstractor_chunking::ChunkerConfig;
use serde::{Deserialize, Serialize};

/// Configuration for the extraction pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum document length in characters
    pub min_document_len: usize,

    /// Overlap in characters between adjacent extraction chunks
    pub chunk_overlap: usize,

    /// Chunk boundary tuning passed through to the splitter
    pub chunker: ChunkerConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_document_len: 100,
            chunk_overlap: 200,
            chunker: ChunkerConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_document_len == 0 {
            return Err("min_document_len must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
