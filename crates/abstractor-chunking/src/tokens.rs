//! Token estimation

/// Approximate characters-per-token ratio.
///
/// This is a rough heuristic (4 chars ≈ 1 token), not an exact tokenizer.
/// All budget arithmetic in the pipeline uses this same ratio.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of a text span from its character length
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(CHARS_PER_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
