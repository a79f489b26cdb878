//! Rule-based page classification.
//!
//! Keyword patterns plus structural heuristics; no models. Hard overrides
//! (ACORD certificates, the ISO endorsement header) run before scoring.
//! Batch classification threads an endorsement tracker through the pages
//! so multi-page endorsements classify as continuations.

use crate::endorsement::EndorsementTracker;
use crate::patterns::{
    self, ACORD_CERTIFICATE_OVERRIDES, BASE_POLICY_INDICATORS, CARVE_BACK_PATTERNS,
    COVERAGE_CONTEXT_TABLE_HEADERS, COVERAGE_EFFECT_PATTERNS, ENDORSEMENT_DIRECT_PHRASES,
    ENDORSEMENT_HEADER_OVERRIDES, EXCLUSION_EFFECT_PATTERNS, SECTION_PATTERNS,
    SEMANTIC_ROLE_PATTERNS, SPAN_ANCHOR_PATTERNS, STRUCTURAL_EXCLUSION_HEADERS,
    STRUCTURAL_EXCLUSION_REFERENCES,
};
use pageplan_core::{
    CoverageEffect, DocumentType, ExclusionEffect, PageClassification, PageSignals, PageType,
    SectionSpan, SemanticRole, TextSpan,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Page types preferred over granular motor types when they score well.
const PRIORITY_TYPES: &[PageType] = &[
    PageType::Declarations,
    PageType::Coverages,
    PageType::Endorsement,
];

const GRANULAR_TYPES: &[PageType] = &[
    PageType::VehicleDetails,
    PageType::InsuredDeclaredValue,
    PageType::LiabilityCoverages,
];

/// Mandatory tie-break hierarchy among overlapping structural sections.
const PRIORITY_LADDER: &[PageType] = &[
    PageType::Definitions,
    PageType::Exclusions,
    PageType::Conditions,
    PageType::Limits,
    PageType::CoverageExtension,
    PageType::CoverageGrant,
    PageType::Coverages,
];

const KEY_SECTIONS: &[PageType] = &[
    PageType::Declarations,
    PageType::Coverages,
    PageType::Endorsement,
    PageType::CoverageGrant,
    PageType::CoverageExtension,
    PageType::Limits,
    PageType::InsuredDefinition,
    PageType::Sov,
    PageType::LossRun,
    PageType::Invoice,
];

const SECONDARY_SECTIONS: &[PageType] = &[
    PageType::Conditions,
    PageType::Exclusions,
    PageType::Definitions,
];

/// Rule-based classifier for insurance document pages.
///
/// The classifier itself is pure and may be shared across documents; the
/// endorsement tracker used by [`PageClassifier::classify_batch`] is scoped
/// to the batch.
#[derive(Debug, Clone)]
pub struct PageClassifier {
    confidence_threshold: f64,
}

impl Default for PageClassifier {
    fn default() -> Self {
        Self::new(0.7)
    }
}

impl PageClassifier {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold,
        }
    }

    /// Classify a single page from its signals.
    pub fn classify(&self, signals: &PageSignals, hint: DocumentType) -> PageClassification {
        let top_text = signals.top_lines.join(" ").to_lowercase();
        let individual_lines: Vec<String> = signals
            .top_lines
            .iter()
            .map(|l| l.to_lowercase())
            .collect();
        let full_text = if signals.all_lines.is_empty() {
            top_text.clone()
        } else {
            signals.all_lines.join(" ").to_lowercase()
        };

        // Hard override 1: ACORD certificates are unambiguous and must
        // never fall through to conditions/coverages scoring.
        if patterns::any_match(&ACORD_CERTIFICATE_OVERRIDES, &full_text) {
            debug!(page = signals.page_number, "ACORD certificate hard override");
            return self.acord_classification(signals);
        }

        // Hard override 2: the standard ISO endorsement header.
        if patterns::any_match(&ENDORSEMENT_HEADER_OVERRIDES, &full_text) {
            debug!(page = signals.page_number, "endorsement header hard override");
            return self.endorsement_header_classification(signals, &full_text);
        }

        let (mut page_type, mut base_confidence) = self.match_patterns(&top_text, hint);

        // Declarations often spread label/value pairs across lines, which
        // defeats joined-text matching.
        if page_type == PageType::Unknown || base_confidence < 0.5 {
            let (decl_type, decl_confidence) =
                self.match_declarations(&top_text, &individual_lines);
            if decl_confidence > base_confidence {
                page_type = decl_type;
                base_confidence = decl_confidence;
            }
        }

        let (page_type, confidence) = self.apply_heuristics(page_type, base_confidence, signals);
        let should_process = self.should_process(page_type, confidence, signals);
        let reasoning = self.build_reasoning(page_type, signals, confidence);

        let mut classification = PageClassification {
            page_number: signals.page_number,
            page_type,
            confidence,
            should_process,
            duplicate_of: None,
            reasoning: Some(reasoning),
            sections: Vec::new(),
            semantic_role: None,
            coverage_effects: Vec::new(),
            exclusion_effects: Vec::new(),
            is_continuation: false,
            parent_endorsement_id: None,
            endorsement_page_sequence: None,
        };

        // Semantic intent applies to endorsement-shaped and base-modifying
        // pages; it forces processing when effects are present.
        if matches!(
            page_type,
            PageType::Endorsement | PageType::Exclusions | PageType::Coverages | PageType::Conditions
        ) {
            let (role, cov_effects, excl_effects) = detect_semantic_intent(&full_text);
            if page_type == PageType::Endorsement
                || !cov_effects.is_empty()
                || !excl_effects.is_empty()
            {
                classification.semantic_role = Some(role);
                classification.coverage_effects = cov_effects;
                classification.exclusion_effects = excl_effects;
                classification.should_process = true;
            }
        }

        if !signals.all_lines.is_empty() {
            let spans = detect_section_spans(&signals.all_lines, page_type);
            if !spans.is_empty() {
                if spans.iter().any(|s| s.confidence > 0.8) {
                    classification.should_process = true;
                }
                classification.sections = spans;
            }
        }

        debug!(
            page = signals.page_number,
            page_type = %page_type,
            confidence,
            process = classification.should_process,
            "classified page"
        );

        classification
    }

    /// Classify a document's pages in order with continuation awareness.
    ///
    /// Semantic projection only applies to policy bundles; base policies
    /// keep their pages authoritative and carry no endorsement semantics
    /// outside endorsement pages.
    pub fn classify_batch(
        &self,
        signals_list: &[PageSignals],
        hint: DocumentType,
    ) -> Vec<PageClassification> {
        let apply_semantic = hint == DocumentType::PolicyBundle;
        let mut tracker = EndorsementTracker::new();
        let mut classifications = Vec::with_capacity(signals_list.len());

        for signals in signals_list {
            let mut classification = if apply_semantic {
                let check = tracker.check_continuation(signals);
                if check.is_continuation {
                    let ctx = check
                        .context
                        .as_ref()
                        .map(|c| (c.endorsement_id.clone(), c.pages_seen.len() as u32));
                    match ctx {
                        Some((endorsement_id, sequence)) => continuation_classification(
                            signals,
                            &endorsement_id,
                            sequence,
                            check.confidence,
                            &check.reasoning,
                        ),
                        None => self.classify(signals, hint),
                    }
                } else {
                    self.classify_with_tracking(signals, hint, &mut tracker, true)
                }
            } else {
                self.classify_with_tracking(signals, hint, &mut tracker, false)
            };

            // Certificates are evidence, not policy changes: they carry no
            // semantic effects and are never extracted.
            if classification.page_type == PageType::CertificateOfInsurance {
                classification.semantic_role = Some(SemanticRole::InformationalOnly);
                classification.coverage_effects.clear();
                classification.exclusion_effects.clear();
                classification.should_process = false;
            }

            classifications.push(classification);
        }

        debug!(
            pages = classifications.len(),
            endorsements = tracker.endorsement_summary().len(),
            "batch classification complete"
        );

        classifications
    }

    fn classify_with_tracking(
        &self,
        signals: &PageSignals,
        hint: DocumentType,
        tracker: &mut EndorsementTracker,
        apply_semantic: bool,
    ) -> PageClassification {
        let mut classification = self.classify(signals, hint);

        if hint == DocumentType::Policy && classification.page_type != PageType::Endorsement {
            classification.semantic_role = None;
            classification.coverage_effects.clear();
            classification.exclusion_effects.clear();
        }

        if apply_semantic
            && classification.page_type == PageType::Endorsement
            && (signals.has_endorsement_header || !tracker.has_active_context())
        {
            tracker.start_endorsement(signals);
        }

        classification
    }

    fn acord_classification(&self, signals: &PageSignals) -> PageClassification {
        let end_line = signals.all_lines.len().max(1) as u32;
        PageClassification {
            page_number: signals.page_number,
            page_type: PageType::CertificateOfInsurance,
            confidence: 0.98,
            should_process: false,
            duplicate_of: None,
            reasoning: Some(
                "ACORD certificate detected: 'THIS CERTIFICATE IS ISSUED AS A MATTER OF \
                 INFORMATION' - informational only"
                    .to_string(),
            ),
            sections: vec![SectionSpan {
                section_type: PageType::CertificateOfInsurance,
                confidence: 0.98,
                span: Some(TextSpan {
                    start_line: 1,
                    end_line,
                }),
                reasoning: Some("ACORD certificate - atomic informational segment".to_string()),
                semantic_role: Some(SemanticRole::InformationalOnly),
                coverage_effects: Vec::new(),
                exclusion_effects: Vec::new(),
            }],
            semantic_role: Some(SemanticRole::InformationalOnly),
            coverage_effects: Vec::new(),
            exclusion_effects: Vec::new(),
            is_continuation: false,
            parent_endorsement_id: None,
            endorsement_page_sequence: None,
        }
    }

    fn endorsement_header_classification(
        &self,
        signals: &PageSignals,
        full_text: &str,
    ) -> PageClassification {
        let (role, cov_effects, excl_effects) = detect_semantic_intent(full_text);
        let role = if role == SemanticRole::Unknown {
            SemanticRole::CoverageModifier
        } else {
            role
        };
        let end_line = signals.all_lines.len().max(1) as u32;

        PageClassification {
            page_number: signals.page_number,
            page_type: PageType::Endorsement,
            confidence: 0.95,
            should_process: true,
            duplicate_of: None,
            reasoning: Some(
                "Endorsement header detected: 'THIS ENDORSEMENT CHANGES THE POLICY. PLEASE \
                 READ IT CAREFULLY.'"
                    .to_string(),
            ),
            sections: vec![SectionSpan {
                section_type: PageType::Endorsement,
                confidence: 0.95,
                span: Some(TextSpan {
                    start_line: 1,
                    end_line,
                }),
                reasoning: Some("Atomic endorsement segment".to_string()),
                semantic_role: Some(role),
                coverage_effects: cov_effects.clone(),
                exclusion_effects: excl_effects.clone(),
            }],
            semantic_role: Some(role),
            coverage_effects: cov_effects,
            exclusion_effects: excl_effects,
            is_continuation: false,
            parent_endorsement_id: None,
            endorsement_page_sequence: None,
        }
    }

    fn match_patterns(&self, text: &str, hint: DocumentType) -> (PageType, f64) {
        if matches!(hint, DocumentType::Policy | DocumentType::Unknown) {
            if patterns::any_match(&STRUCTURAL_EXCLUSION_HEADERS, text) {
                return (PageType::Exclusions, 0.95);
            }
            if patterns::any_match(&COVERAGE_CONTEXT_TABLE_HEADERS, text) {
                return (PageType::CoveragesContext, 0.90);
            }
        }

        let mut match_scores: BTreeMap<PageType, (usize, f64)> = BTreeMap::new();
        let mut best_match = PageType::Unknown;
        let mut best_score = 0.0_f64;

        for (page_type, table) in SECTION_PATTERNS.iter() {
            let matches = patterns::count_matches(table, text);
            if matches > 0 {
                let score = (0.6 + matches as f64 * 0.1).min(0.95);
                match_scores.insert(*page_type, (matches, score));
                if score > best_score {
                    best_score = score;
                    best_match = *page_type;
                }
            }
        }

        // Prefer the broad policy sections over granular motor types when
        // they have real support.
        if GRANULAR_TYPES.contains(&best_match) {
            for priority in PRIORITY_TYPES {
                if let Some((matches, score)) = match_scores.get(priority) {
                    if *matches >= 2 {
                        best_match = *priority;
                        best_score = *score;
                        break;
                    }
                }
            }
        }

        if let Some((end_matches, end_score)) = match_scores.get(&PageType::Endorsement).copied() {
            if matches!(best_match, PageType::Coverages | PageType::Exclusions) && end_matches >= 1
            {
                best_match = PageType::Endorsement;
                best_score = best_score.max(end_score);
            }
        }

        // Contextual preference for endorsements, suppressed when the page
        // window reads like a canonical ISO base policy form.
        let base_policy_window = matches!(hint, DocumentType::Policy | DocumentType::PolicyBundle)
            && patterns::count_matches(&BASE_POLICY_INDICATORS, text) >= 3;
        if matches!(
            hint,
            DocumentType::Endorsement | DocumentType::PolicyBundle | DocumentType::Policy
        ) && !base_policy_window
            && matches!(
                best_match,
                PageType::Coverages | PageType::Conditions | PageType::Exclusions
            )
        {
            if let Some((end_matches, end_score)) =
                match_scores.get(&PageType::Endorsement).copied()
            {
                if end_matches >= 2 || end_score >= best_score {
                    best_match = PageType::Endorsement;
                    best_score = best_score.max(end_score);
                }
                if patterns::any_match(&ENDORSEMENT_DIRECT_PHRASES, text) {
                    best_match = PageType::Endorsement;
                    best_score = best_score.max(end_score);
                }
            }
        }

        // Mandatory hierarchy among the structural sections.
        if best_match != PageType::Unknown {
            for ladder_type in PRIORITY_LADDER {
                if let Some((_, ladder_score)) = match_scores.get(ladder_type) {
                    if *ladder_score >= 0.8 && *ladder_score > best_score - 0.2 {
                        best_match = *ladder_type;
                        best_score = best_score.max(*ladder_score);
                        break;
                    }
                }
            }
        }

        (best_match, best_score)
    }

    /// Declarations fallback: also scans individual lines so label/value
    /// pairs split across lines still count.
    fn match_declarations(&self, combined_text: &str, lines: &[String]) -> (PageType, f64) {
        let Some(table) = patterns::patterns_for(PageType::Declarations) else {
            return (PageType::Unknown, 0.0);
        };

        let mut matches = patterns::count_matches(table, combined_text);
        for line in lines {
            if table.iter().any(|p| p.is_match(line)) {
                matches += 1;
            }
        }

        if matches > 0 {
            let score = (0.3 + matches as f64 * 0.15).min(0.95);
            (PageType::Declarations, score)
        } else {
            (PageType::Unknown, 0.0)
        }
    }

    fn apply_heuristics(
        &self,
        page_type: PageType,
        base_confidence: f64,
        signals: &PageSignals,
    ) -> (PageType, f64) {
        let mut page_type = page_type;
        let mut confidence = base_confidence;

        if signals.page_number == 1 && page_type == PageType::Declarations {
            confidence += 0.40;
        } else if signals.page_number == 1 {
            confidence += 0.25;
        } else if signals.page_number <= 3 {
            confidence += 0.20;
        } else if signals.page_number <= 5 {
            confidence += 0.10;
        }

        if signals.text_density > 0.7 {
            confidence += 0.15;
        }

        let structure_type = signals
            .additional_metadata
            .get("structure_type")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        if structure_type == "text_heavy"
            && matches!(
                page_type,
                PageType::Coverages
                    | PageType::Conditions
                    | PageType::Exclusions
                    | PageType::Definitions
            )
        {
            confidence += 0.15;
        }

        if signals.max_font_size.is_some_and(|size| size > 18.0) {
            confidence += 0.10;
        }

        if signals.has_tables && matches!(page_type, PageType::Sov | PageType::LossRun) {
            confidence += 0.15;
            if structure_type == "table_heavy" {
                confidence += 0.25;
            }
        }

        // Sparse pages with no signal are boilerplate; a truly empty page
        // stays unknown so the first-page gate can still admit it.
        if signals.text_density < 0.15
            && page_type == PageType::Unknown
            && signals.all_lines.iter().any(|l| !l.trim().is_empty())
        {
            page_type = PageType::Boilerplate;
            confidence = 0.6;
        }

        (page_type, round3(confidence.min(1.0)))
    }

    fn should_process(&self, page_type: PageType, confidence: f64, signals: &PageSignals) -> bool {
        if matches!(
            page_type,
            PageType::Duplicate | PageType::Boilerplate | PageType::TableOfContents
        ) {
            return false;
        }

        if KEY_SECTIONS.contains(&page_type) {
            return true;
        }

        if SECONDARY_SECTIONS.contains(&page_type) {
            return confidence >= self.confidence_threshold;
        }

        if page_type == PageType::Unknown {
            return signals.page_number == 1
                || (signals.page_number <= 3 && confidence >= 0.6)
                || confidence >= 0.8;
        }

        signals.page_number == 1 || confidence >= self.confidence_threshold
    }

    fn build_reasoning(&self, page_type: PageType, signals: &PageSignals, confidence: f64) -> String {
        let mut reasons: Vec<String> = Vec::new();

        if confidence > 0.5 {
            let matched_header = signals.top_lines.first().and_then(|first| {
                let upper = first.to_uppercase();
                ["SECTION", "FORM", "ENDORSEMENT", "EXCLUSION"]
                    .iter()
                    .any(|marker| upper.contains(marker))
                    .then(|| first.trim().to_string())
            });
            match matched_header {
                Some(header) => reasons.push(format!("Matched {page_type} header: {header}")),
                None => reasons.push(format!("Matched {page_type} keywords")),
            }
        }

        if signals.page_number <= 5 {
            reasons.push("early page".to_string());
        }
        if signals.has_tables {
            reasons.push("contains tables".to_string());
        }
        if signals.text_density > 0.7 {
            reasons.push("high text density".to_string());
        } else if signals.text_density < 0.2 {
            reasons.push("low text density".to_string());
        }
        if signals.max_font_size.is_some_and(|size| size > 18.0) {
            reasons.push("large headers".to_string());
        }
        if reasons.is_empty() {
            reasons.push("no strong indicators".to_string());
        }

        reasons.join(", ")
    }
}

/// Continuation classification for a page inside a tracked endorsement.
fn continuation_classification(
    signals: &PageSignals,
    endorsement_id: &str,
    sequence: u32,
    confidence: f64,
    reasoning: &str,
) -> PageClassification {
    let full_text = signals.all_lines.join(" ").to_lowercase();
    let (role, cov_effects, excl_effects) = detect_semantic_intent(&full_text);
    let end_line = signals.all_lines.len().max(1) as u32;

    PageClassification {
        page_number: signals.page_number,
        page_type: PageType::Endorsement,
        confidence,
        should_process: true,
        duplicate_of: None,
        reasoning: Some(format!(
            "Endorsement continuation of {endorsement_id}: {reasoning}"
        )),
        sections: vec![SectionSpan {
            section_type: PageType::Endorsement,
            confidence,
            span: Some(TextSpan {
                start_line: 1,
                end_line,
            }),
            reasoning: Some(format!("Continuation of {endorsement_id}")),
            semantic_role: Some(role),
            coverage_effects: cov_effects.clone(),
            exclusion_effects: excl_effects.clone(),
        }],
        semantic_role: Some(role),
        coverage_effects: cov_effects,
        exclusion_effects: excl_effects,
        is_continuation: true,
        parent_endorsement_id: Some(endorsement_id.to_string()),
        endorsement_page_sequence: Some(sequence),
    }
}

/// Detect semantic role and specific coverage/exclusion effects in text.
///
/// Carve-backs ("Exclusion B.2 does not apply ...") override coverage
/// signals; a structural exclusion reference alongside coverage effects is
/// strong evidence for dual effect.
pub fn detect_semantic_intent(
    text: &str,
) -> (SemanticRole, Vec<CoverageEffect>, Vec<ExclusionEffect>) {
    let mut cov_effects: Vec<CoverageEffect> = Vec::new();
    for (effect, table) in COVERAGE_EFFECT_PATTERNS.iter() {
        if patterns::any_match(table, text) {
            cov_effects.push(*effect);
        }
    }

    let mut excl_effects: Vec<ExclusionEffect> = Vec::new();
    for (effect, table) in EXCLUSION_EFFECT_PATTERNS.iter() {
        if patterns::any_match(table, text) {
            excl_effects.push(*effect);
        }
    }

    let has_structural_exclusion = patterns::any_match(&STRUCTURAL_EXCLUSION_REFERENCES, text);
    let has_carve_back = patterns::any_match(&CARVE_BACK_PATTERNS, text);

    let role = if !cov_effects.is_empty() && !excl_effects.is_empty() {
        if has_carve_back {
            SemanticRole::ExclusionModifier
        } else {
            SemanticRole::Both
        }
    } else if !cov_effects.is_empty() && has_structural_exclusion {
        SemanticRole::Both
    } else if !cov_effects.is_empty() {
        SemanticRole::CoverageModifier
    } else if !excl_effects.is_empty() || has_structural_exclusion {
        SemanticRole::ExclusionModifier
    } else {
        SEMANTIC_ROLE_PATTERNS
            .iter()
            .find(|(_, table)| patterns::any_match(table, text))
            .map(|(role, _)| *role)
            .unwrap_or(SemanticRole::Unknown)
    };

    (role, cov_effects, excl_effects)
}

/// Detect multiple section spans within one page.
///
/// Endorsement and certificate pages are atomic and never subdivided.
fn detect_section_spans(lines: &[String], initial_type: PageType) -> Vec<SectionSpan> {
    if matches!(
        initial_type,
        PageType::Endorsement | PageType::CertificateOfInsurance
    ) {
        let full_text = lines.join("\n").to_lowercase();
        let (role, cov_effects, excl_effects) = detect_semantic_intent(&full_text);
        return vec![SectionSpan {
            section_type: initial_type,
            confidence: 0.95,
            span: Some(TextSpan {
                start_line: 1,
                end_line: lines.len().max(1) as u32,
            }),
            reasoning: Some(format!("Atomic {initial_type} segment")),
            semantic_role: Some(role),
            coverage_effects: cov_effects,
            exclusion_effects: excl_effects,
        }];
    }

    let mut spans = Vec::new();
    let mut current_type = initial_type;
    let mut current_start: usize = 1;
    let mut current_reasoning: Option<String> = None;
    let line_count = lines.len();

    for (index, line) in lines.iter().enumerate() {
        let line_number = index + 1;
        let line_clean = line.trim().to_lowercase();
        if line_clean.len() < 5 {
            continue;
        }

        let mut detected_type = PageType::Unknown;
        let mut detected_reasoning = None;

        if patterns::any_match(&STRUCTURAL_EXCLUSION_HEADERS, &line_clean) {
            detected_type = PageType::Exclusions;
            detected_reasoning = Some(format!(
                "Structural exclusion header: {}",
                truncate_chars(&line_clean, 50)
            ));
        } else if patterns::any_match(&COVERAGE_CONTEXT_TABLE_HEADERS, &line_clean) {
            detected_type = PageType::CoveragesContext;
            detected_reasoning = Some(format!(
                "Coverage context table: {}",
                truncate_chars(&line_clean, 50)
            ));
        } else {
            'anchor: for (span_type, table) in SPAN_ANCHOR_PATTERNS.iter() {
                for pattern in table {
                    if pattern.is_match(&line_clean) {
                        detected_type = *span_type;
                        detected_reasoning = Some(format!(
                            "Section anchor: {}",
                            truncate_chars(&line_clean, 50)
                        ));
                        break 'anchor;
                    }
                }
            }
        }

        if detected_type != PageType::Unknown && detected_type != current_type {
            if current_type != PageType::Unknown && line_number - 1 >= current_start {
                spans.push(build_span(
                    lines,
                    current_type,
                    current_start,
                    line_number - 1,
                    current_reasoning.clone(),
                ));
            }
            current_type = detected_type;
            current_start = line_number;
            current_reasoning = detected_reasoning.clone();
        }

        if current_reasoning.is_none() && detected_type != PageType::Unknown {
            current_reasoning = detected_reasoning;
        }
    }

    if current_type != PageType::Unknown && line_count >= current_start {
        spans.push(build_span(
            lines,
            current_type,
            current_start,
            line_count,
            current_reasoning,
        ));
    }

    spans
}

fn build_span(
    lines: &[String],
    section_type: PageType,
    start_line: usize,
    end_line: usize,
    reasoning: Option<String>,
) -> SectionSpan {
    let span_text = lines[start_line - 1..end_line].join("\n").to_lowercase();
    let (role, cov_effects, excl_effects) = detect_semantic_intent(&span_text);

    let capture_semantic = section_type == PageType::Endorsement
        || (matches!(
            section_type,
            PageType::Exclusions | PageType::Coverages | PageType::Conditions
        ) && (!cov_effects.is_empty() || !excl_effects.is_empty()));

    SectionSpan {
        section_type,
        confidence: 0.9,
        span: Some(TextSpan {
            start_line: start_line as u32,
            end_line: end_line as u32,
        }),
        reasoning: Some(reasoning.unwrap_or_else(|| format!("Previous section {section_type}"))),
        semantic_role: capture_semantic.then_some(role),
        coverage_effects: if capture_semantic { cov_effects } else { vec![] },
        exclusion_effects: if capture_semantic { excl_effects } else { vec![] },
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
