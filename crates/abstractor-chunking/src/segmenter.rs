//! Structural header detection

use crate::config::SegmenterConfig;
use abstractor_domain::Section;
use regex::Regex;

/// Detects structural headers and cuts a document into sections.
///
/// A fixed, priority-ordered set of header patterns is run independently
/// over the full text; all matches are collected and sorted by offset, and
/// the span between consecutive headers becomes a section body. Matches
/// from different patterns are deliberately not deduplicated against each
/// other, even at the same offset; a collision produces an empty span that
/// the minimum-length filter then drops.
pub struct SectionSegmenter {
    patterns: Vec<Regex>,
    config: SegmenterConfig,
}

/// Header patterns in priority order
const HEADER_PATTERNS: &[&str] = &[
    // ARTICLE IV: Title / SECTION 12. Title / PART II Title
    r"(?m)^[ \t]*(?:ARTICLE|SECTION|PART)\s+(?:[IVXLCDM]+|[0-9]+)\b[^\n]*",
    // 3) Financing Terms:  /  12. Closing Date:
    r"(?m)^[ \t]*[0-9]{1,2}[.)][ \t]+[A-Z][^:\n]{2,60}:",
    // EARNEST MONEY DEPOSIT:
    r"(?m)^[A-Z][A-Z0-9 ,&/'\-]{3,60}:",
];

impl SectionSegmenter {
    /// Build a segmenter with the fixed pattern set
    pub fn new(config: SegmenterConfig) -> Self {
        let patterns = HEADER_PATTERNS
            .iter()
            .map(|p| Regex::new(p).unwrap_or_else(|e| panic!("invalid header pattern {p}: {e}")))
            .collect();
        Self { patterns, config }
    }

    /// Cut `text` into an ordered list of sections.
    ///
    /// If no header survives the minimum-length filter, the whole document
    /// is returned as one synthetic section titled "Document". Pure: the
    /// same input always yields the same sections.
    pub fn segment(&self, text: &str) -> Vec<Section> {
        let mut headers: Vec<(usize, usize, String)> = Vec::new();
        for pattern in &self.patterns {
            for m in pattern.find_iter(text) {
                let title = m.as_str().trim().trim_end_matches(':').trim().to_string();
                headers.push((m.start(), m.end(), title));
            }
        }
        // Stable sort: same-offset matches keep pattern priority order.
        headers.sort_by_key(|&(start, _, _)| start);

        let mut sections = Vec::new();
        for (i, (_, end, title)) in headers.iter().enumerate() {
            let body_end = headers
                .get(i + 1)
                .map(|&(next_start, _, _)| next_start.max(*end))
                .unwrap_or(text.len());
            let content = &text[*end..body_end];
            if content.trim().len() < self.config.min_section_len {
                continue;
            }
            sections.push(Section::new(title.clone(), content.trim(), *end));
        }

        if sections.is_empty() {
            return vec![Section::new("Document", text.trim(), 0)];
        }
        sections
    }
}

impl Default for SectionSegmenter {
    fn default() -> Self {
        Self::new(SegmenterConfig::default())
    }
}
