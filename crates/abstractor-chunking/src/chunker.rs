//! Overlap-preserving text chunking

use crate::config::ChunkerConfig;

/// Splits a span of text into bounded, overlapping pieces.
///
/// `max_size` is a soft target: a piece may exceed it only when no
/// sentence or newline boundary exists in the window (the chunker never
/// force-splits mid-sentence; it extends to the end of the text instead).
/// Consecutive pieces share `overlap` characters so that clause context is
/// not lost at chunk edges.
pub struct OverlapChunker {
    config: ChunkerConfig,
}

impl OverlapChunker {
    /// Create a chunker with the given boundary policy
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Split `text` into ordered, overlapping pieces.
    ///
    /// The cursor advances by `max_size - overlap` per piece, clamped so it
    /// never jumps past the emitted piece's end (no gaps) and always makes
    /// progress. A candidate window is cut back to the latest `". "` or
    /// newline boundary, provided that boundary falls at or after
    /// `boundary_fraction` of the window. Trailing pieces shorter than
    /// `min_tail_len` are dropped as noise.
    pub fn chunk(&self, text: &str, max_size: usize, overlap: usize) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() || max_size == 0 {
            return Vec::new();
        }
        if text.len() <= max_size {
            return vec![text.to_string()];
        }

        let overlap = overlap.min(max_size.saturating_sub(1));
        let mut chunks = Vec::new();
        let mut cursor = 0usize;

        while cursor < text.len() {
            let hard_end = snap_to_char_boundary(text, (cursor + max_size).min(text.len()));
            let end = if hard_end < text.len() {
                self.break_point(text, cursor, hard_end, max_size)
            } else {
                hard_end
            };
            let end = end.max(cursor + 1).min(text.len());
            let end = snap_forward(text, end);

            chunks.push(text[cursor..end].to_string());

            if end >= text.len() {
                break;
            }

            let mut next = snap_to_char_boundary(text, cursor + (max_size - overlap));
            if next > end {
                next = end;
            }
            if next <= cursor {
                next = end;
            }
            cursor = next;
        }

        // Short trailing fragments carry no extractable signal.
        while chunks.len() > 1 {
            let last_len = chunks.last().map(|c| c.trim().len()).unwrap_or(0);
            if last_len < self.config.min_tail_len {
                chunks.pop();
            } else {
                break;
            }
        }

        chunks
    }

    /// Pick the end of the piece starting at `cursor`.
    ///
    /// Prefers the latest sentence/newline boundary in the window, accepted
    /// at or after `boundary_fraction` of `max_size`. When the window holds
    /// no acceptable boundary the piece extends forward to the next
    /// boundary (or end of text), exceeding `max_size` rather than
    /// force-splitting mid-sentence.
    fn break_point(&self, text: &str, cursor: usize, hard_end: usize, max_size: usize) -> usize {
        let window = &text[cursor..hard_end];
        let threshold = (max_size as f64 * self.config.boundary_fraction) as usize;

        let sentence = window.rfind(". ").map(|p| p + 2);
        let newline = window.rfind('\n').map(|p| p + 1);
        let candidate = match (sentence, newline) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };

        if let Some(pos) = candidate {
            if pos >= threshold {
                return snap_to_char_boundary(text, cursor + pos);
            }
        }

        // No acceptable boundary in the window: take the next one beyond it.
        let rest = &text[hard_end..];
        let sentence = rest.find(". ").map(|p| p + 2);
        let newline = rest.find('\n').map(|p| p + 1);
        match (sentence, newline) {
            (Some(a), Some(b)) => hard_end + a.min(b),
            (Some(a), None) => hard_end + a,
            (None, Some(b)) => hard_end + b,
            (None, None) => text.len(),
        }
    }
}

impl Default for OverlapChunker {
    fn default() -> Self {
        Self::new(ChunkerConfig::default())
    }
}

/// Snap a byte index forward to the nearest valid UTF-8 char boundary
fn snap_forward(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary
fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker() -> OverlapChunker {
        OverlapChunker::default()
    }

    #[test]
    fn test_small_text_single_chunk() {
        let text = "  The buyer shall deposit earnest money with escrow.  ";
        let chunks = chunker().chunk(text, 1000, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text.trim());
    }

    #[test]
    fn test_empty_text() {
        assert!(chunker().chunk("", 1000, 100).is_empty());
        assert!(chunker().chunk("   ", 1000, 100).is_empty());
    }

    #[test]
    fn test_pieces_respect_max_size_when_boundaries_exist() {
        let text = "One sentence here. ".repeat(100);
        let chunks = chunker().chunk(&text, 300, 50);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 300, "chunk of {} chars", chunk.len());
        }
    }

    #[test]
    fn test_breaks_at_sentence_boundary() {
        let text = "First clause of the agreement here. Second clause follows it. ".repeat(20);
        let chunks = chunker().chunk(&text, 250, 40);
        // Every non-final chunk should end right after a sentence terminator.
        for chunk in &chunks[..chunks.len() - 1] {
            assert!(chunk.ends_with(". "), "chunk ended with {:?}", &chunk[chunk.len() - 3..]);
        }
    }

    #[test]
    fn test_unbreakable_span_exceeds_max_size() {
        // No ". " or newline anywhere: never force-split.
        let text = "a".repeat(5000);
        let chunks = chunker().chunk(&text, 1000, 100);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 5000);
    }

    #[test]
    fn test_overlap_preserves_coverage() {
        // Unique sentence numbering so each chunk locates unambiguously.
        let text: String = (0..60)
            .map(|i| format!("Clause number {} of the conveyance agreement applies. ", i))
            .collect();
        let text = text.trim().to_string();
        let max_size = 400;
        let overlap = 80;
        let chunks = chunker().chunk(&text, max_size, overlap);
        assert!(chunks.len() > 1);

        // Every character offset of the source must fall inside at least
        // one chunk: reconstruct cursor positions by locating each chunk.
        let mut covered_to = 0usize;
        let mut search_from = 0usize;
        for chunk in &chunks {
            let start = text[search_from..]
                .find(chunk.as_str())
                .map(|p| p + search_from)
                .expect("chunk must appear in source");
            assert!(start <= covered_to, "gap before offset {}", start);
            covered_to = covered_to.max(start + chunk.len());
            search_from = start + 1;
        }
        // Tail drop may shave a sub-threshold fragment; nothing more.
        assert!(text.len() - covered_to < 400);
    }

    #[test]
    fn test_short_tail_dropped() {
        let text = format!("{}. {}", "a".repeat(208), "b".repeat(20));
        let chunks = chunker().chunk(&text, 220, 20);
        // The trailing 30-character fragment is below the 50-char floor.
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 210);
    }

    #[test]
    fn test_multibyte_text_does_not_panic() {
        let text = "Cláusula de depósito en garantía — número único. ".repeat(40);
        let chunks = chunker().chunk(&text, 200, 30);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            // Slicing stayed on char boundaries.
            assert!(chunk.chars().count() > 0);
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = "Possession transfers at closing. Risk of loss remains with seller. ".repeat(30);
        let c = chunker();
        assert_eq!(c.chunk(&text, 350, 60), c.chunk(&text, 350, 60));
    }
}
