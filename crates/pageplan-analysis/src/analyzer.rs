//! Signal extraction from extracted page markdown.
//!
//! Replaces direct PDF inspection with signals derived from the structured
//! markdown (headings, tables, anchor phrases) plus optional layout
//! metadata. The continuation-detection signals (policy/form numbers,
//! mid-sentence starts, section labels, explicit continuation text) feed
//! the endorsement tracker.

use crate::patterns::{
    self, ANCHOR_PHRASES, DOCUMENT_TYPE_KEYWORDS, ENDORSEMENT_HEADER_PATTERNS,
    EXPLICIT_CONTINUATION_PATTERNS, FORM_NUMBER_PATTERNS, MID_SENTENCE_CONJUNCTION,
    POLICY_NUMBER_PATTERNS, SECTION_LABEL_PATTERNS, TABLE_SEPARATOR,
};
use once_cell::sync::Lazy;
use pageplan_core::{DocumentType, PageMetadata, PageSignals, StructureType};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::debug;

static HEADING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#{1,6}\s+(.+)$").expect("static pattern"));

/// Analyzer producing one immutable [`PageSignals`] per page.
#[derive(Debug, Default)]
pub struct MarkdownPageAnalyzer;

impl MarkdownPageAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyze one page of markdown, preferring layout metadata when given.
    pub fn analyze(
        &self,
        markdown: &str,
        page_number: u32,
        metadata: Option<&PageMetadata>,
    ) -> PageSignals {
        let headings = extract_headings(markdown);
        let top_lines = if headings.is_empty() {
            extract_top_lines(markdown)
        } else {
            headings.clone()
        };

        let has_tables = metadata
            .and_then(|m| m.has_tables)
            .unwrap_or_else(|| TABLE_SEPARATOR.is_match(markdown));

        let text_density = text_density(markdown, metadata);

        let max_font_size = metadata
            .and_then(|m| m.max_font_size)
            .or_else(|| Some(estimate_max_font_size(markdown)));

        let (starts_mid_sentence, first_line_text) = detect_mid_sentence_start(markdown);
        let (section_labels, last_section_label) = extract_section_labels(markdown);

        let mut signal_metadata = BTreeMap::new();
        signal_metadata.insert(
            "source".to_string(),
            serde_json::json!(if metadata.is_some() { "layout" } else { "markdown" }),
        );
        signal_metadata.insert("headings_found".to_string(), serde_json::json!(headings.len()));
        signal_metadata.insert(
            "anchor_phrases_found".to_string(),
            serde_json::json!(find_anchor_phrases(markdown)),
        );
        if let Some(meta) = metadata {
            if let Some(count) = meta.block_count {
                signal_metadata.insert("block_count".to_string(), serde_json::json!(count));
            }
            if let Some(count) = meta.text_block_count {
                signal_metadata.insert("text_block_count".to_string(), serde_json::json!(count));
            }
            if let Some(count) = meta.table_block_count {
                signal_metadata.insert("table_block_count".to_string(), serde_json::json!(count));
            }
            if let Some(structure) = meta.structure_type {
                signal_metadata.insert(
                    "structure_type".to_string(),
                    serde_json::json!(structure_type_str(structure)),
                );
            }
            if let Some(levels) = &meta.heading_levels {
                signal_metadata.insert("heading_levels".to_string(), serde_json::json!(levels));
            }
        }

        let signals = PageSignals {
            page_number,
            top_lines,
            all_lines: markdown.lines().map(String::from).collect(),
            text_density,
            has_tables,
            max_font_size,
            page_hash: page_hash(markdown),
            policy_number: extract_policy_number(markdown),
            form_number: extract_form_number(markdown),
            has_endorsement_header: patterns::any_match(&ENDORSEMENT_HEADER_PATTERNS, markdown),
            starts_mid_sentence,
            first_line_text,
            section_labels,
            last_section_label,
            explicit_continuation: extract_explicit_continuation(markdown),
            additional_metadata: signal_metadata,
        };

        debug!(
            page = page_number,
            density = signals.text_density,
            tables = signals.has_tables,
            labels = signals.section_labels.len(),
            "extracted page signals"
        );

        signals
    }

    /// Analyze a batch of `(markdown, page_number)` tuples in order.
    pub fn analyze_batch(&self, pages: &[(String, u32)]) -> Vec<PageSignals> {
        pages
            .iter()
            .map(|(markdown, page_number)| self.analyze(markdown, *page_number, None))
            .collect()
    }

    /// Keyword-based preview of the document type over the full markdown.
    ///
    /// Used when no manifest exists yet. The score is the matched fraction
    /// of the winning type's keyword set.
    pub fn detect_document_type(&self, all_markdown: &str) -> (DocumentType, f64) {
        let upper = all_markdown.to_uppercase();
        let mut best = (DocumentType::Unknown, 0.0_f64);

        for (doc_type, keywords) in DOCUMENT_TYPE_KEYWORDS {
            let matched = keywords.iter().filter(|kw| upper.contains(**kw)).count();
            let score = matched as f64 / keywords.len() as f64;
            if score > best.1 {
                best = (*doc_type, score);
            }
        }

        best
    }
}

fn structure_type_str(structure: StructureType) -> &'static str {
    match structure {
        StructureType::Standard => "standard",
        StructureType::TextHeavy => "text_heavy",
        StructureType::TableHeavy => "table_heavy",
    }
}

fn extract_headings(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| HEADING_LINE.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .filter(|h| !h.is_empty())
        .collect()
}

fn extract_top_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(10)
        .map(String::from)
        .collect()
}

fn text_density(text: &str, metadata: Option<&PageMetadata>) -> f64 {
    let char_density = (text.len() as f64 / 4000.0).min(1.0);
    match metadata.and_then(|m| m.block_count) {
        Some(block_count) => {
            let block_density = (block_count as f64 / 25.0).min(1.0);
            round3(char_density * 0.6 + block_density * 0.4)
        }
        None => char_density,
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Synthetic font size from the largest markdown heading on the page.
fn estimate_max_font_size(text: &str) -> f64 {
    let mut top_level = usize::MAX;
    for line in text.lines() {
        let hashes = line.chars().take_while(|c| *c == '#').count();
        if hashes > 0 && line.chars().nth(hashes) == Some(' ') {
            top_level = top_level.min(hashes);
        }
    }
    match top_level {
        1 => 24.0,
        2 => 20.0,
        3 => 16.0,
        _ => 11.0,
    }
}

/// First 16 hex chars of the SHA-256 of whitespace-normalized lowered text.
fn page_hash(text: &str) -> String {
    let normalized = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let digest = Sha256::digest(normalized.as_bytes());
    hex::encode(digest)[..16].to_string()
}

fn find_anchor_phrases(text: &str) -> Vec<String> {
    let upper = text.to_uppercase();
    ANCHOR_PHRASES
        .iter()
        .filter(|phrase| upper.contains(**phrase))
        .map(|phrase| phrase.to_string())
        .collect()
}

fn extract_policy_number(text: &str) -> Option<String> {
    for pattern in POLICY_NUMBER_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            return Some(caps[1].to_uppercase().replace(' ', "-"));
        }
    }
    None
}

fn extract_form_number(text: &str) -> Option<String> {
    for pattern in FORM_NUMBER_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(text) {
            return Some(caps[1].to_uppercase());
        }
    }
    None
}

/// Detect whether the page text begins mid-sentence.
///
/// The first content line (skipping comments, headings, and list markers)
/// counts when it starts lowercase, with a continuation conjunction, or
/// with thought-completing punctuation.
fn detect_mid_sentence_start(text: &str) -> (bool, Option<String>) {
    let mut first_line: Option<String> = None;
    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with("<!--") || stripped.starts_with('#') {
            continue;
        }
        let content = stripped
            .trim_start_matches(['-', '*', '•'])
            .trim_start()
            .to_string();
        if !content.is_empty() {
            first_line = Some(content);
            break;
        }
    }

    let Some(first_line) = first_line else {
        return (false, None);
    };

    let first_char = first_line.chars().next().unwrap_or(' ');
    let lowercase_start = first_char.is_lowercase();
    let conjunction_start = lowercase_start && MID_SENTENCE_CONJUNCTION.is_match(&first_line);
    let punctuation_start = matches!(first_char, ',' | ')' | ']');

    (
        lowercase_start || conjunction_start || punctuation_start,
        Some(first_line),
    )
}

/// Ordered, deduplicated section labels plus the last label on the page.
fn extract_section_labels(text: &str) -> (Vec<String>, Option<String>) {
    let mut labels = Vec::new();
    for pattern in SECTION_LABEL_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            labels.push(caps[1].to_string());
        }
    }

    let mut unique = Vec::new();
    for label in labels {
        if !unique.contains(&label) {
            unique.push(label);
        }
    }

    let last = unique.last().cloned();
    (unique, last)
}

fn extract_explicit_continuation(text: &str) -> Option<String> {
    EXPLICIT_CONTINUATION_PATTERNS
        .iter()
        .find_map(|pattern| pattern.find(text).map(|m| m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> MarkdownPageAnalyzer {
        MarkdownPageAnalyzer::new()
    }

    #[test]
    fn test_headings_become_top_lines() {
        let md = "# DECLARATIONS\n\nPolicy Number: AB-1234567\n\n## Named Insured";
        let signals = analyzer().analyze(md, 1, None);
        assert_eq!(signals.top_lines, vec!["DECLARATIONS", "Named Insured"]);
        assert_eq!(signals.page_number, 1);
    }

    #[test]
    fn test_top_lines_fallback_without_headings() {
        let md = "DECLARATIONS PAGE\nPolicy Number: AB-1234567\n\nNamed Insured: XYZ LLC";
        let signals = analyzer().analyze(md, 1, None);
        assert_eq!(signals.top_lines.len(), 3);
        assert_eq!(signals.top_lines[0], "DECLARATIONS PAGE");
    }

    #[test]
    fn test_policy_number_canonicalized() {
        let signals = analyzer().analyze("Policy Number: ab 1234567", 1, None);
        assert_eq!(signals.policy_number.as_deref(), Some("AB-1234567"));
    }

    #[test]
    fn test_form_number_extracted() {
        let signals = analyzer().analyze("some text\nForm CA T3 53 02 15\nmore", 1, None);
        assert_eq!(signals.form_number.as_deref(), Some("CA T3 53 02 15"));
    }

    #[test]
    fn test_endorsement_header_detected() {
        let signals = analyzer().analyze(
            "THIS ENDORSEMENT CHANGES THE POLICY. PLEASE READ IT CAREFULLY.",
            5,
            None,
        );
        assert!(signals.has_endorsement_header);
    }

    #[test]
    fn test_mid_sentence_start() {
        let signals = analyzer().analyze("permission, while performing duties related to", 6, None);
        assert!(signals.starts_mid_sentence);
        assert!(signals
            .first_line_text
            .as_deref()
            .unwrap()
            .starts_with("permission"));
    }

    #[test]
    fn test_mid_sentence_ignores_headings_and_comments() {
        let md = "<!-- page 6 -->\n## D. Coverage\nThe insurance applies.";
        let signals = analyzer().analyze(md, 6, None);
        assert!(!signals.starts_mid_sentence);
        assert_eq!(signals.first_line_text.as_deref(), Some("The insurance applies."));
    }

    #[test]
    fn test_section_labels_deduplicated_in_order() {
        let md = "## A. First\n## B. Second\n- C. Third\n## B. Second again";
        let (labels, last) = extract_section_labels(md);
        assert_eq!(labels, vec!["A", "B", "C"]);
        assert_eq!(last.as_deref(), Some("C"));
    }

    #[test]
    fn test_explicit_continuation() {
        let signals = analyzer().analyze("(CONTINUED ON NEXT PAGE)", 3, None);
        assert!(signals
            .explicit_continuation
            .as_deref()
            .unwrap()
            .contains("CONTINUED ON"));
    }

    #[test]
    fn test_table_detection_from_markdown() {
        let md = "| Location | TIV |\n|----------|-----|\n| 1 | $5M |";
        let signals = analyzer().analyze(md, 2, None);
        assert!(signals.has_tables);
    }

    #[test]
    fn test_metadata_preferred_over_content() {
        let meta = PageMetadata {
            has_tables: Some(false),
            block_count: Some(25),
            max_font_size: Some(30.0),
            ..Default::default()
        };
        let md = "| a | b |\n|---|---|\nshort";
        let signals = analyzer().analyze(md, 2, Some(&meta));
        assert!(!signals.has_tables);
        assert_eq!(signals.max_font_size, Some(30.0));
        // 60% char-based + 40% block-based with a full block score.
        assert!(signals.text_density > 0.39);
    }

    #[test]
    fn test_page_hash_stable_under_whitespace() {
        let a = analyzer().analyze("Policy  Number:\n  ABC", 1, None);
        let b = analyzer().analyze("policy number: abc", 1, None);
        assert_eq!(a.page_hash, b.page_hash);
        assert_eq!(a.page_hash.len(), 16);
    }

    #[test]
    fn test_document_type_preview() {
        let md = "DECLARATIONS\nPOLICY NUMBER: X\nEFFECTIVE DATE: 1/1\nEXPIRATION DATE: 1/1\nCOVERAGE\nLIMITS OF LIABILITY";
        let (doc_type, score) = analyzer().detect_document_type(md);
        assert_eq!(doc_type, DocumentType::Policy);
        assert!(score >= 0.99);
    }
}
