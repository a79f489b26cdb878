//! Token counting for chunk budgeting.
//!
//! Uses a BPE tokenizer when a model name resolves, falling back to a
//! char/word heuristic tuned for insurance documents (dense technical
//! vocabulary runs about 10% over generic prose).

use std::fmt;
use tiktoken_rs::CoreBPE;
use tracing::warn;

const CHARS_PER_TOKEN: f64 = 4.0;
const WORDS_PER_TOKEN: f64 = 1.3;
const INSURANCE_DOC_FACTOR: f64 = 1.1;

/// Token counter with optional BPE backend.
pub struct TokenCounter {
    bpe: Option<CoreBPE>,
}

impl fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCounter")
            .field("bpe", &self.bpe.is_some())
            .finish()
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::heuristic()
    }
}

impl TokenCounter {
    /// Build a counter for the given model name, when any.
    ///
    /// An unknown model is reported once and the counter silently falls
    /// back to the heuristic; tokenizer absence is never fatal.
    pub fn new(model: Option<&str>) -> Self {
        let bpe = model.and_then(|name| match tiktoken_rs::get_bpe_from_model(name) {
            Ok(bpe) => Some(bpe),
            Err(error) => {
                warn!(model = name, %error, "tokenizer unavailable, using heuristic counting");
                None
            }
        });
        Self { bpe }
    }

    /// Heuristic-only counter.
    pub fn heuristic() -> Self {
        Self { bpe: None }
    }

    /// Count tokens in `text`; empty input counts zero.
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        if let Some(bpe) = &self.bpe {
            return bpe.encode_with_special_tokens(text).len();
        }

        let char_estimate = text.chars().count() as f64 / CHARS_PER_TOKEN;
        let word_estimate = text.split_whitespace().count() as f64 * WORDS_PER_TOKEN;
        (((char_estimate + word_estimate) / 2.0) * INSURANCE_DOC_FACTOR).round() as usize
    }

    pub fn fits(&self, text: &str, limit: usize) -> bool {
        self.count(text) <= limit
    }

    /// Split `text` into chunks of at most `limit` tokens, preserving line
    /// boundaries where possible and falling back to sentence splits for
    /// single lines over the limit. Successive chunks open with up to
    /// `overlap` tokens of trailing lines from the previous chunk.
    pub fn split_by_token_limit(&self, text: &str, limit: usize, overlap: usize) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        if self.fits(text, limit) {
            return vec![text.to_string()];
        }

        let mut chunks: Vec<String> = Vec::new();
        let mut current_lines: Vec<String> = Vec::new();
        let mut current_tokens = 0usize;

        for line in text.split('\n') {
            let line_tokens = self.count(line);

            if line_tokens > limit {
                if !current_lines.is_empty() {
                    chunks.push(current_lines.join("\n"));
                    current_lines.clear();
                    current_tokens = 0;
                }

                let mut sentence_parts: Vec<&str> = Vec::new();
                let mut sentence_tokens = 0usize;
                for sentence in split_sentences(line) {
                    let tokens = self.count(sentence);
                    if sentence_tokens + tokens > limit && !sentence_parts.is_empty() {
                        chunks.push(sentence_parts.concat());
                        sentence_parts.clear();
                        sentence_tokens = 0;
                    }
                    sentence_parts.push(sentence);
                    sentence_tokens += tokens;
                }
                if !sentence_parts.is_empty() {
                    chunks.push(sentence_parts.concat());
                }
                continue;
            }

            if current_tokens + line_tokens > limit && !current_lines.is_empty() {
                chunks.push(current_lines.join("\n"));

                if overlap > 0 {
                    let mut overlap_lines: Vec<String> = Vec::new();
                    let mut overlap_tokens = 0usize;
                    for prev_line in current_lines.iter().rev() {
                        let prev_tokens = self.count(prev_line);
                        if overlap_tokens + prev_tokens > overlap {
                            break;
                        }
                        overlap_lines.insert(0, prev_line.clone());
                        overlap_tokens += prev_tokens;
                    }
                    current_lines = overlap_lines;
                    current_tokens = overlap_tokens;
                } else {
                    current_lines.clear();
                    current_tokens = 0;
                }
            }

            current_lines.push(line.to_string());
            current_tokens += line_tokens;
        }

        if !current_lines.is_empty() {
            chunks.push(current_lines.join("\n"));
        }

        chunks
    }
}

/// Split on sentence terminators (`.`, `!`, `?` plus trailing whitespace),
/// keeping the terminators with their sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut pieces = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;

    while index < bytes.len() {
        if matches!(bytes[index], b'.' | b'!' | b'?') {
            let mut end = index + 1;
            while end < bytes.len() && matches!(bytes[end], b'.' | b'!' | b'?') {
                end += 1;
            }
            if end < bytes.len() && bytes[end].is_ascii_whitespace() {
                while end < bytes.len() && bytes[end].is_ascii_whitespace() {
                    end += 1;
                }
                pieces.push(&text[start..end]);
                start = end;
                index = end;
                continue;
            }
            index = end;
        } else {
            index += 1;
        }
    }

    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> TokenCounter {
        TokenCounter::heuristic()
    }

    #[test]
    fn test_empty_text_counts_zero() {
        assert_eq!(counter().count(""), 0);
        assert!(counter().split_by_token_limit("", 100, 0).is_empty());
    }

    #[test]
    fn test_heuristic_formula() {
        // "one two three four" is 18 chars, 4 words:
        // ((18/4 + 4*1.3) / 2) * 1.1 = 5.335 -> 5
        assert_eq!(counter().count("one two three four"), 5);
    }

    #[test]
    fn test_unknown_model_falls_back() {
        let c = TokenCounter::new(Some("definitely-not-a-model"));
        assert_eq!(c.count("one two three four"), 5);
    }

    #[test]
    fn test_fits() {
        let c = counter();
        assert!(c.fits("short text", 10));
        assert!(!c.fits(&"word ".repeat(200), 10));
    }

    #[test]
    fn test_split_keeps_small_text_whole() {
        let c = counter();
        let chunks = c.split_by_token_limit("a few words only", 100, 0);
        assert_eq!(chunks, vec!["a few words only".to_string()]);
    }

    #[test]
    fn test_split_respects_limit() {
        let c = counter();
        let text = (0..40)
            .map(|i| format!("line {i} with several words of content"))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = c.split_by_token_limit(&text, 50, 0);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(c.count(chunk) <= 50, "chunk over limit: {}", c.count(chunk));
        }
    }

    #[test]
    fn test_split_overlap_carries_trailing_lines() {
        let c = counter();
        let text = (0..30)
            .map(|i| format!("line {i} with several words of content"))
            .collect::<Vec<_>>()
            .join("\n");
        let chunks = c.split_by_token_limit(&text, 60, 15);
        assert!(chunks.len() > 1);
        // Each successive chunk opens with content from the previous one.
        for pair in chunks.windows(2) {
            let first_line = pair[1].lines().next().unwrap();
            assert!(pair[0].contains(first_line));
        }
    }

    #[test]
    fn test_single_long_line_splits_by_sentence() {
        let c = counter();
        let line = (0..30)
            .map(|i| format!("Sentence number {i} has a handful of words."))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = c.split_by_token_limit(&line, 40, 0);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(c.count(chunk) <= 40);
        }
    }

    #[test]
    fn test_split_sentences_keeps_terminators() {
        let pieces = split_sentences("First one. Second two! Third three? tail");
        assert_eq!(pieces.len(), 4);
        assert_eq!(pieces[0], "First one. ");
        assert_eq!(pieces[3], "tail");
        assert_eq!(pieces.concat(), "First one. Second two! Third three? tail");
    }
}
