//! Section module - a structurally-detected subdivision of a document

use serde::{Deserialize, Serialize};

/// A structurally-detected subdivision of a document (e.g. an "ARTICLE").
///
/// Sections are transient views over an immutable document, recomputed per
/// request. Two sections may overlap in character range when independent
/// header patterns match near the same offset; the segmenter deliberately
/// does not resolve such collisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Header text the section was detected under
    pub title: String,

    /// The section body, from this header to the next detected header
    pub content: String,

    /// Character offset of the section content within the source document
    pub start_offset: usize,
}

impl Section {
    /// Create a new section
    pub fn new(title: impl Into<String>, content: impl Into<String>, start_offset: usize) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            start_offset,
        }
    }
}
