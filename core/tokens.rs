//! Cheap token estimation for context budgeting.
//!
//! The divisor comes from the rough average of ~4 characters per token that
//! code and English prose both exhibit under common tokenizers. The `tokens
//! --exact` CLI path offers a real tokenizer; this stays a pure function so
//! it can run on every prompt assembly without cost.

pub const CHARS_PER_TOKEN: usize = 4;

/// Estimates the token count of `text` by character-count division,
/// rounding up. Empty text estimates to zero.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}
