//! Error types for the extraction pipeline

use thiserror::Error;

/// Errors that can occur during an extraction request
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Document is empty after trimming
    #[error("Document is empty")]
    EmptyDocument,

    /// Document is too short to extract anything meaningful
    #[error("Document too short: {0} chars (min: {1})")]
    InputTooShort(usize, usize),

    /// No registered schema under the requested identifier
    #[error("Unknown schema: {0}")]
    UnknownSchema(String),

    /// Quota or rate limit hit; retrying on another backend would not help
    #[error("Quota exceeded, retry later: {0}")]
    QuotaExhausted(String),

    /// Both backends failed the request
    #[error("Analysis failed on both backends; primary: {primary}; secondary: {secondary}")]
    AllBackendsFailed {
        /// Primary backend's failure message
        primary: String,
        /// Secondary backend's failure message
        secondary: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
