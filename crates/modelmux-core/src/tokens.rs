//! Token usage estimation.
//!
//! Counts are estimates, not authoritative: when a backend does not report
//! usage we approximate with the classic four-characters-per-token rule.

/// Estimate tokens for a piece of text: `ceil(chars / 4)`, empty input is 0.
pub fn estimate_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    u32::try_from(text.chars().count().div_ceil(4)).unwrap_or(u32::MAX)
}
