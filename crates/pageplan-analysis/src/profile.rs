//! Document profile aggregation.
//!
//! Aggregates ordered page classifications into a document-level profile:
//! document type inference over the page-type distribution, section
//! boundaries from consecutive-run encoding plus explicit intra-page spans,
//! structural and semantic inheritance, and the page to semantic-section
//! map consumed by the chunker.

use crate::patterns::POLICY_SECTION_TRIGGERS;
use pageplan_core::{
    mapper, CoverageEffect, DocumentId, DocumentProfile, DocumentType, ExclusionEffect,
    PageClassification, PageType, SectionBoundary, SemanticRole, SemanticSection,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Page types folded into the preceding section rather than emitted.
const MERGE_WITH_ADJACENT: &[PageType] = &[
    PageType::Unknown,
    PageType::Boilerplate,
    PageType::Duplicate,
    PageType::TableOfContents,
];

/// Ordered inference rules; the first rule whose page types are all present
/// wins. Confidence scales with how much of the document the rule covers.
const DOCUMENT_TYPE_RULES: &[(&[PageType], DocumentType, f64)] = &[
    (
        &[PageType::Declarations, PageType::Coverages, PageType::Endorsement],
        DocumentType::PolicyBundle,
        0.95,
    ),
    (
        &[PageType::Declarations, PageType::Endorsement],
        DocumentType::PolicyBundle,
        0.90,
    ),
    (
        &[PageType::CertificateOfInsurance, PageType::Endorsement],
        DocumentType::PolicyBundle,
        0.90,
    ),
    (
        &[PageType::Declarations, PageType::Coverages],
        DocumentType::Policy,
        0.95,
    ),
    (&[PageType::Declarations], DocumentType::Policy, 0.85),
    (&[PageType::Sov], DocumentType::Sov, 0.90),
    (&[PageType::LossRun], DocumentType::LossRun, 0.90),
    (&[PageType::Endorsement], DocumentType::Endorsement, 0.85),
    (&[PageType::Invoice], DocumentType::Invoice, 0.90),
    (
        &[PageType::AcordApplication],
        DocumentType::AcordApplication,
        0.95,
    ),
    (&[PageType::Proposal], DocumentType::Proposal, 0.90),
    (
        &[PageType::CertificateOfInsurance],
        DocumentType::Certificate,
        0.95,
    ),
    (
        &[PageType::Coverages, PageType::Exclusions, PageType::Conditions],
        DocumentType::Policy,
        0.90,
    ),
    (
        &[PageType::CoverageGrant, PageType::Limits],
        DocumentType::Policy,
        0.95,
    ),
    (&[PageType::CoveragesContext], DocumentType::Policy, 0.85),
];

/// Semantic sections that never contribute extractable boundaries.
const NON_EXTRACTABLE: &[SemanticSection] = &[
    SemanticSection::Unknown,
    SemanticSection::Boilerplate,
    SemanticSection::Certificate,
    SemanticSection::CertificateOfInsurance,
    SemanticSection::TableOfContents,
];

#[derive(Debug, Clone)]
struct Run {
    page_type: PageType,
    start_page: u32,
    end_page: u32,
    confidences: Vec<f64>,
    reasoning: Option<String>,
    semantic_role: Option<SemanticRole>,
    coverage_effects: Vec<CoverageEffect>,
    exclusion_effects: Vec<ExclusionEffect>,
}

impl Run {
    fn from_classification(c: &PageClassification) -> Self {
        Self {
            page_type: c.page_type,
            start_page: c.page_number,
            end_page: c.page_number,
            confidences: vec![c.confidence],
            reasoning: c.reasoning.clone(),
            semantic_role: c.semantic_role,
            coverage_effects: c.coverage_effects.clone(),
            exclusion_effects: c.exclusion_effects.clone(),
        }
    }

    fn inherit_semantics_if_missing(
        &mut self,
        role: Option<SemanticRole>,
        coverage: &[CoverageEffect],
        exclusion: &[ExclusionEffect],
    ) {
        let missing = matches!(self.semantic_role, None | Some(SemanticRole::Unknown));
        if missing && matches!(role, Some(r) if r != SemanticRole::Unknown) {
            self.semantic_role = role;
            self.coverage_effects = coverage.to_vec();
            self.exclusion_effects = exclusion.to_vec();
        }
    }
}

/// Builds document profiles from page classifications. Pure and shareable.
#[derive(Debug, Default)]
pub struct DocumentProfileBuilder;

impl DocumentProfileBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the profile for one document.
    ///
    /// `workflow_hint` only changes behavior for the recognized
    /// `quote_comparison` value; anything else is ignored.
    pub fn build_profile(
        &self,
        document_id: DocumentId,
        classifications: &[PageClassification],
        workflow_hint: Option<&str>,
    ) -> DocumentProfile {
        if classifications.is_empty() {
            debug!(document = %document_id, "no classifications, returning empty profile");
            return DocumentProfile::empty(document_id);
        }

        let mut sorted: Vec<PageClassification> = classifications.to_vec();
        sorted.sort_by_key(|c| c.page_number);

        let page_type_distribution = distribution(&sorted);
        let (mut document_type, confidence) =
            self.infer_document_type(&sorted, &page_type_distribution, workflow_hint);

        let section_boundaries = self.detect_section_boundaries(&sorted, document_type);
        let page_section_map = self.build_page_section_map(&sorted);
        let (section_type_distribution, product_concepts) = section_metrics(&sorted);
        let document_subtype = infer_subtype(document_type, &page_type_distribution);

        let pages_to_process = sorted.iter().filter(|c| c.should_process).count();
        let has_declarations = product_concepts.iter().any(|c| c == "declarations");
        let has_endorsements = section_boundaries
            .iter()
            .any(|b| b.semantic_section == Some(SemanticSection::Endorsement));

        let mut metadata = BTreeMap::new();
        metadata.insert("total_pages".to_string(), serde_json::json!(sorted.len()));
        metadata.insert(
            "pages_to_process".to_string(),
            serde_json::json!(pages_to_process),
        );
        metadata.insert(
            "section_count".to_string(),
            serde_json::json!(section_boundaries.len()),
        );
        metadata.insert(
            "has_declarations".to_string(),
            serde_json::json!(has_declarations),
        );
        metadata.insert(
            "has_endorsements".to_string(),
            serde_json::json!(has_endorsements),
        );
        metadata.insert(
            "product_concepts".to_string(),
            serde_json::json!(product_concepts),
        );

        if document_type == DocumentType::Policy && has_endorsements {
            document_type = DocumentType::PolicyBundle;
        }

        let mut semantic_capabilities = Vec::new();
        if document_type == DocumentType::PolicyBundle || has_endorsements {
            semantic_capabilities.push("endorsement_semantic_projection".to_string());
        }

        info!(
            document = %document_id,
            document_type = %document_type,
            confidence,
            sections = section_boundaries.len(),
            "built document profile"
        );

        DocumentProfile {
            document_id,
            document_type,
            document_subtype,
            confidence,
            section_boundaries,
            page_section_map,
            section_type_distribution,
            product_concepts,
            page_type_distribution,
            metadata,
            semantic_capabilities,
        }
    }

    fn infer_document_type(
        &self,
        classifications: &[PageClassification],
        distribution: &BTreeMap<String, u32>,
        workflow_hint: Option<&str>,
    ) -> (DocumentType, f64) {
        let present: Vec<PageType> = PageType::all()
            .iter()
            .filter(|pt| distribution.contains_key(pt.as_str()))
            .copied()
            .collect();
        let total_pages = classifications.len() as f64;

        let mut inferred = DocumentType::Unknown;
        let mut final_confidence = 0.0;

        for (required, doc_type, base_confidence) in DOCUMENT_TYPE_RULES {
            if required.iter().all(|pt| present.contains(pt)) {
                let matching_pages: u32 = required
                    .iter()
                    .filter_map(|pt| distribution.get(pt.as_str()))
                    .sum();
                let coverage_ratio = if total_pages > 0.0 {
                    matching_pages as f64 / total_pages
                } else {
                    0.0
                };
                inferred = *doc_type;
                final_confidence = round3(base_confidence * (0.5 + 0.5 * coverage_ratio));
                break;
            }
        }

        if inferred == DocumentType::Unknown {
            // Fallback: the most common non-trivial page type decides.
            let mut dominant: Option<(PageType, u32)> = None;
            for pt in PageType::all() {
                if matches!(
                    pt,
                    PageType::Unknown | PageType::Boilerplate | PageType::Duplicate
                ) {
                    continue;
                }
                if let Some(count) = distribution.get(pt.as_str()) {
                    if dominant.map_or(true, |(_, best)| *count > best) {
                        dominant = Some((*pt, *count));
                    }
                }
            }
            if let Some((page_type, count)) = dominant {
                inferred = mapper::page_to_document_type(page_type);
                final_confidence = round3(0.6 * (count as f64 / total_pages));
            }
        }

        // Quotes and policies share sections and fields; only the workflow
        // context tells them apart.
        if workflow_hint == Some("quote_comparison") {
            if inferred == DocumentType::Policy {
                inferred = DocumentType::Quote;
            }
        } else if inferred == DocumentType::Quote {
            inferred = DocumentType::Policy;
        }

        (inferred, final_confidence)
    }

    fn detect_section_boundaries(
        &self,
        classifications: &[PageClassification],
        doc_type: DocumentType,
    ) -> Vec<SectionBoundary> {
        let Some(first) = classifications.first() else {
            return Vec::new();
        };

        let mut runs: Vec<Run> = Vec::new();
        let mut current = Run::from_classification(first);
        for c in &classifications[1..] {
            if c.page_type == current.page_type {
                current.end_page = c.page_number;
                current.confidences.push(c.confidence);
                current.inherit_semantics_if_missing(
                    c.semantic_role,
                    &c.coverage_effects,
                    &c.exclusion_effects,
                );
            } else {
                runs.push(current);
                current = Run::from_classification(c);
            }
        }
        runs.push(current);

        let span_boundaries = self.extract_span_boundaries(classifications, doc_type);
        let merged_runs = merge_trivial_runs(runs);

        let mut boundaries: Vec<SectionBoundary> = Vec::new();
        for run in &merged_runs {
            if MERGE_WITH_ADJACENT.contains(&run.page_type) {
                continue;
            }
            // Explicit spans that cover the exact run take precedence.
            if span_boundaries
                .iter()
                .any(|sb| sb.start_page == run.start_page && sb.end_page == run.end_page)
            {
                continue;
            }

            let avg_confidence =
                run.confidences.iter().sum::<f64>() / run.confidences.len() as f64;
            let semantic = mapper::page_to_semantic(run.page_type);
            let extractable = is_extractable(semantic, doc_type, run.start_page);

            let semantics_apply =
                doc_type != DocumentType::Policy || run.page_type == PageType::Endorsement;
            let mut semantic_role = if semantics_apply { run.semantic_role } else { None };
            // Certificates never carry modifier semantics, whatever the
            // page-level detection said: the role is an explicit unknown
            // and the effect lists stay empty.
            let is_certificate = run.page_type == PageType::CertificateOfInsurance;
            if is_certificate {
                semantic_role = Some(SemanticRole::Unknown);
            }
            let carry_effects = semantics_apply && !is_certificate;
            let effective =
                mapper::resolve_effective_section_type(run.page_type, semantic_role);

            boundaries.push(SectionBoundary {
                section_type: run.page_type,
                semantic_section: Some(semantic),
                start_page: run.start_page,
                end_page: run.end_page,
                start_line: None,
                end_line: None,
                confidence: round3(avg_confidence),
                page_count: run.end_page - run.start_page + 1,
                anchor_text: run.reasoning.clone(),
                sub_section_type: None,
                modifier_type: None,
                endorsement_scope: None,
                extractable,
                semantic_role,
                coverage_effects: if carry_effects {
                    run.coverage_effects.clone()
                } else {
                    Vec::new()
                },
                exclusion_effects: if carry_effects {
                    run.exclusion_effects.clone()
                } else {
                    Vec::new()
                },
                effective_section_type: Some(effective),
                metadata: BTreeMap::new(),
            });
        }

        let mut all_boundaries: Vec<SectionBoundary> =
            boundaries.into_iter().chain(span_boundaries).collect();
        all_boundaries.sort_by_key(|b| (b.start_page, b.start_line.unwrap_or(0)));

        if doc_type == DocumentType::Policy {
            apply_structural_inheritance(&mut all_boundaries);
        }

        all_boundaries
    }

    fn extract_span_boundaries(
        &self,
        classifications: &[PageClassification],
        doc_type: DocumentType,
    ) -> Vec<SectionBoundary> {
        let mut span_boundaries = Vec::new();
        for c in classifications {
            for span in &c.sections {
                let semantic = mapper::page_to_semantic(span.section_type);
                let core = mapper::normalize_to_core_section(mapper::page_type_to_section_type(
                    span.section_type,
                ));
                let normalized_type = mapper::section_type_to_page_type(core);
                let extractable = is_extractable(semantic, doc_type, c.page_number);

                let semantics_apply =
                    doc_type != DocumentType::Policy || span.section_type == PageType::Endorsement;
                let mut semantic_role = if semantics_apply { span.semantic_role } else { None };
                let is_certificate = span.section_type == PageType::CertificateOfInsurance;
                if is_certificate {
                    semantic_role = Some(SemanticRole::Unknown);
                }
                let carry_effects = semantics_apply && !is_certificate;
                let effective =
                    mapper::resolve_effective_section_type(normalized_type, semantic_role);

                span_boundaries.push(SectionBoundary {
                    section_type: normalized_type,
                    semantic_section: Some(semantic),
                    start_page: c.page_number,
                    end_page: c.page_number,
                    start_line: span.span.map(|s| s.start_line),
                    end_line: span.span.map(|s| s.end_line),
                    confidence: span.confidence,
                    page_count: 1,
                    anchor_text: span.reasoning.clone().or_else(|| c.reasoning.clone()),
                    sub_section_type: None,
                    modifier_type: None,
                    endorsement_scope: None,
                    extractable,
                    semantic_role,
                    coverage_effects: if carry_effects {
                        span.coverage_effects.clone()
                    } else {
                        Vec::new()
                    },
                    exclusion_effects: if carry_effects {
                        span.exclusion_effects.clone()
                    } else {
                        Vec::new()
                    },
                    effective_section_type: Some(effective),
                    metadata: BTreeMap::new(),
                });
            }
        }
        span_boundaries
    }

    /// One semantic section per page, with forward-fill inheritance across
    /// trivial pages and sticky definitions.
    fn build_page_section_map(
        &self,
        classifications: &[PageClassification],
    ) -> BTreeMap<u32, String> {
        const SPAN_PRIORITY: &[SemanticSection] = &[
            SemanticSection::Endorsement,
            SemanticSection::Coverages,
            SemanticSection::Exclusions,
            SemanticSection::Declarations,
            SemanticSection::Conditions,
            SemanticSection::Definitions,
            SemanticSection::CertificateOfInsurance,
            SemanticSection::Certificate,
        ];
        const INHERITANCE_SOURCES: &[SemanticSection] = &[
            SemanticSection::Endorsement,
            SemanticSection::Coverages,
            SemanticSection::Exclusions,
            SemanticSection::Conditions,
            SemanticSection::Definitions,
            SemanticSection::LiabilityCoverage,
            SemanticSection::PhysicalDamageCoverage,
        ];

        let mut page_section_map = BTreeMap::new();
        let mut last_meaningful = SemanticSection::Unknown;

        for c in classifications {
            let mut selected = if c.sections.is_empty() {
                mapper::page_to_semantic(c.page_type)
            } else {
                let found: Vec<SemanticSection> = c
                    .sections
                    .iter()
                    .map(|s| mapper::page_to_semantic(s.section_type))
                    .collect();
                SPAN_PRIORITY
                    .iter()
                    .find(|p| found.contains(p))
                    .copied()
                    .or_else(|| {
                        found
                            .iter()
                            .find(|s| **s != SemanticSection::Unknown)
                            .copied()
                    })
                    .unwrap_or(SemanticSection::Unknown)
            };

            // Forward-fill across trivial pages while a section is active.
            if matches!(
                selected,
                SemanticSection::Unknown | SemanticSection::Boilerplate
            ) && MERGE_WITH_ADJACENT.contains(&c.page_type)
                && !matches!(
                    last_meaningful,
                    SemanticSection::Unknown | SemanticSection::Boilerplate
                )
            {
                selected = last_meaningful;
            }

            // Definitions are sticky: a page that would flip back to
            // coverages mid-run stays in definitions.
            if selected == SemanticSection::Coverages
                && last_meaningful == SemanticSection::Definitions
            {
                selected = SemanticSection::Definitions;
            }

            page_section_map.insert(c.page_number, selected.as_str().to_string());

            if INHERITANCE_SOURCES.contains(&selected) {
                last_meaningful = selected;
            } else if selected == SemanticSection::CertificateOfInsurance {
                // Certificates break inheritance.
                last_meaningful = SemanticSection::Unknown;
            } else if !matches!(
                selected,
                SemanticSection::Unknown | SemanticSection::Boilerplate
            ) {
                last_meaningful = SemanticSection::Unknown;
            }
        }

        page_section_map
    }
}

fn distribution(classifications: &[PageClassification]) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for c in classifications {
        *counts.entry(c.page_type.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

fn section_metrics(
    classifications: &[PageClassification],
) -> (BTreeMap<String, u32>, Vec<String>) {
    let mut section_types = Vec::new();
    for c in classifications {
        if c.sections.is_empty() {
            section_types.push(mapper::page_type_to_section_type(c.page_type));
        } else {
            for span in &c.sections {
                section_types.push(mapper::page_type_to_section_type(span.section_type));
            }
        }
    }

    let significant: Vec<_> = section_types
        .into_iter()
        .filter(|st| *st != pageplan_core::SectionType::Unknown)
        .collect();

    let mut counter = BTreeMap::new();
    for st in &significant {
        *counter.entry(st.as_str().to_string()).or_insert(0) += 1;
    }

    (counter, mapper::product_concepts(&significant))
}

fn merge_trivial_runs(runs: Vec<Run>) -> Vec<Run> {
    if runs.len() <= 1 {
        return runs;
    }

    let mut merged: Vec<Run> = Vec::new();
    for run in runs {
        if MERGE_WITH_ADJACENT.contains(&run.page_type) {
            if let Some(prev) = merged.last_mut() {
                prev.end_page = run.end_page;
                prev.confidences.extend(run.confidences.iter().copied());
                prev.inherit_semantics_if_missing(
                    run.semantic_role,
                    &run.coverage_effects,
                    &run.exclusion_effects,
                );
            } else {
                // Leading trivial run; kept so later passes can skip it.
                merged.push(run);
            }
        } else {
            merged.push(run);
        }
    }
    merged
}

fn is_extractable(semantic: SemanticSection, doc_type: DocumentType, start_page: u32) -> bool {
    if NON_EXTRACTABLE.contains(&semantic) {
        return false;
    }
    // Repeated declarations deep inside bundles are form schedules, not the
    // authoritative front matter.
    if semantic == SemanticSection::Declarations
        && matches!(doc_type, DocumentType::PolicyBundle | DocumentType::Endorsement)
        && start_page > 2
    {
        return false;
    }
    true
}

/// Attach ISO structural context and refine coverage/exclusion semantics
/// for base policies ("SECTION II" pages carry liability context until
/// "SECTION III" flips it to physical damage).
fn apply_structural_inheritance(boundaries: &mut [SectionBoundary]) {
    let mut current_context: Option<&'static str> = None;

    for boundary in boundaries.iter_mut() {
        let anchor = boundary
            .anchor_text
            .as_deref()
            .unwrap_or("")
            .to_uppercase();

        for (pattern, context) in POLICY_SECTION_TRIGGERS.iter() {
            if pattern.is_match(&anchor) {
                current_context = Some(*context);
                break;
            }
        }

        let Some(context) = current_context else {
            continue;
        };
        boundary.metadata.insert(
            "policy_section_context".to_string(),
            serde_json::json!(context),
        );

        match boundary.semantic_section {
            Some(SemanticSection::Coverages) => {
                if context == "liability" {
                    boundary.semantic_section = Some(SemanticSection::LiabilityCoverage);
                } else if context == "physical_damage" {
                    boundary.semantic_section = Some(SemanticSection::PhysicalDamageCoverage);
                }
            }
            Some(SemanticSection::Exclusions) => {
                if context == "liability" {
                    boundary.semantic_section = Some(SemanticSection::LiabilityExclusions);
                } else if context == "physical_damage" {
                    boundary.semantic_section = Some(SemanticSection::PhysicalDamageExclusions);
                }
            }
            _ => {}
        }
    }
}

fn infer_subtype(
    document_type: DocumentType,
    distribution: &BTreeMap<String, u32>,
) -> Option<String> {
    if !matches!(
        document_type,
        DocumentType::Policy | DocumentType::PolicyBundle
    ) {
        return None;
    }

    let count = |pt: PageType| distribution.get(pt.as_str()).copied().unwrap_or(0);
    let subtype = if count(PageType::Sov) > 0 {
        "commercial_property"
    } else if count(PageType::LossRun) > 0 {
        "claims_made"
    } else if count(PageType::VehicleDetails) > 0 {
        "commercial_auto"
    } else {
        "general"
    };
    Some(subtype.to_string())
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pageplan_core::{SectionSpan, TextSpan};

    fn doc_id() -> DocumentId {
        DocumentId::from_u128(0x42)
    }

    fn classification(page: u32, page_type: PageType, confidence: f64) -> PageClassification {
        let mut c = PageClassification::new(page, page_type, confidence);
        c.should_process = true;
        c.reasoning = Some(format!("Matched {page_type} keywords"));
        c
    }

    fn builder() -> DocumentProfileBuilder {
        DocumentProfileBuilder::new()
    }

    #[test]
    fn test_empty_classifications() {
        let profile = builder().build_profile(doc_id(), &[], None);
        assert_eq!(profile.document_type, DocumentType::Unknown);
        assert_eq!(profile.confidence, 0.0);
        assert!(profile.section_boundaries.is_empty());
        assert!(profile.page_section_map.is_empty());
    }

    #[test]
    fn test_single_declarations_page() {
        let profile = builder().build_profile(
            doc_id(),
            &[classification(1, PageType::Declarations, 0.98)],
            None,
        );
        assert_eq!(profile.document_type, DocumentType::Policy);
        assert_eq!(profile.section_boundaries.len(), 1);
        let boundary = &profile.section_boundaries[0];
        assert_eq!(boundary.section_type, PageType::Declarations);
        assert_eq!((boundary.start_page, boundary.end_page), (1, 1));
        assert_eq!(boundary.page_count, 1);
        assert!(boundary.extractable);
        assert_eq!(
            profile.page_section_map.get(&1).map(String::as_str),
            Some("declarations")
        );
    }

    #[test]
    fn test_policy_bundle_rule() {
        let classifications = vec![
            classification(1, PageType::Declarations, 0.95),
            classification(2, PageType::Coverages, 0.85),
            classification(3, PageType::Endorsement, 0.9),
        ];
        let profile = builder().build_profile(doc_id(), &classifications, None);
        assert_eq!(profile.document_type, DocumentType::PolicyBundle);
        // Full coverage: 0.95 * (0.5 + 0.5 * 1.0).
        assert_eq!(profile.confidence, 0.95);
        assert!(profile
            .semantic_capabilities
            .contains(&"endorsement_semantic_projection".to_string()));
    }

    #[test]
    fn test_trivial_runs_merge_into_preceding() {
        let classifications = vec![
            classification(1, PageType::Declarations, 0.95),
            classification(2, PageType::Coverages, 0.85),
            classification(3, PageType::Unknown, 0.2),
            classification(4, PageType::Coverages, 0.8),
        ];
        let profile = builder().build_profile(doc_id(), &classifications, None);
        // Page 3 extends the coverages run rather than creating a boundary.
        let coverage_runs: Vec<_> = profile
            .section_boundaries
            .iter()
            .filter(|b| b.section_type == PageType::Coverages)
            .collect();
        assert_eq!(coverage_runs.len(), 2);
        assert_eq!(coverage_runs[0].end_page, 3);
        assert!(profile
            .section_boundaries
            .iter()
            .all(|b| b.section_type != PageType::Unknown));
        // Map inherits coverages for the unknown page.
        assert_eq!(
            profile.page_section_map.get(&3).map(String::as_str),
            Some("coverages")
        );
    }

    #[test]
    fn test_document_type_fallback_dominant_type() {
        let classifications = vec![
            classification(1, PageType::Deductibles, 0.8),
            classification(2, PageType::Deductibles, 0.8),
            classification(3, PageType::Unknown, 0.1),
        ];
        let profile = builder().build_profile(doc_id(), &classifications, None);
        assert_eq!(profile.document_type, DocumentType::Unknown);
        // Deductibles has no document-type mapping, so the fallback keeps
        // unknown with zero-ish confidence from the rules pass.
        assert!(profile.confidence <= 0.6);
    }

    #[test]
    fn test_sov_document() {
        let classifications = vec![
            classification(1, PageType::Sov, 0.9),
            classification(2, PageType::Sov, 0.9),
        ];
        let profile = builder().build_profile(doc_id(), &classifications, None);
        assert_eq!(profile.document_type, DocumentType::Sov);
    }

    #[test]
    fn test_quote_workflow_override() {
        let classifications = vec![
            classification(1, PageType::Declarations, 0.95),
            classification(2, PageType::Coverages, 0.85),
        ];
        let quote =
            builder().build_profile(doc_id(), &classifications, Some("quote_comparison"));
        assert_eq!(quote.document_type, DocumentType::Quote);

        let policy = builder().build_profile(doc_id(), &classifications, Some("other_flow"));
        assert_eq!(policy.document_type, DocumentType::Policy);
    }

    #[test]
    fn test_policy_promoted_to_bundle_with_endorsements() {
        // Declarations + coverages matches the POLICY rule first, but the
        // endorsement boundary promotes the result.
        let classifications = vec![
            classification(1, PageType::Declarations, 0.95),
            classification(2, PageType::Coverages, 0.85),
            classification(3, PageType::Coverages, 0.85),
            classification(4, PageType::Endorsement, 0.9),
        ];
        let profile = builder().build_profile(doc_id(), &classifications, None);
        assert_eq!(profile.document_type, DocumentType::PolicyBundle);
    }

    #[test]
    fn test_certificate_boundary_never_extractable() {
        let mut cert = classification(1, PageType::CertificateOfInsurance, 0.98);
        cert.semantic_role = Some(SemanticRole::Both);
        cert.coverage_effects = vec![CoverageEffect::AddsCoverage];
        let profile = builder().build_profile(doc_id(), &[cert], None);
        let boundary = &profile.section_boundaries[0];
        assert!(!boundary.extractable);
        // The hard guard downgrades detected semantics to an explicit
        // unknown role with empty effect lists on the wire.
        assert_eq!(boundary.semantic_role, Some(SemanticRole::Unknown));
        assert!(boundary.coverage_effects.is_empty());
        assert!(boundary.exclusion_effects.is_empty());
        assert_eq!(
            boundary.effective_section_type,
            Some(PageType::CertificateOfInsurance)
        );
    }

    #[test]
    fn test_late_declarations_not_extractable_in_bundle() {
        let classifications = vec![
            classification(1, PageType::Declarations, 0.95),
            classification(2, PageType::Endorsement, 0.9),
            classification(3, PageType::Endorsement, 0.9),
            classification(4, PageType::Declarations, 0.8),
        ];
        let profile = builder().build_profile(doc_id(), &classifications, None);
        assert_eq!(profile.document_type, DocumentType::PolicyBundle);
        let late_decl = profile
            .section_boundaries
            .iter()
            .find(|b| b.section_type == PageType::Declarations && b.start_page == 4)
            .unwrap();
        assert!(!late_decl.extractable);
    }

    #[test]
    fn test_span_boundaries_layered_and_sorted() {
        let mut c = classification(2, PageType::Coverages, 0.85);
        c.sections = vec![
            SectionSpan {
                section_type: PageType::Coverages,
                confidence: 0.9,
                span: Some(TextSpan {
                    start_line: 1,
                    end_line: 12,
                }),
                reasoning: Some("Section anchor: coverages".to_string()),
                semantic_role: None,
                coverage_effects: vec![],
                exclusion_effects: vec![],
            },
            SectionSpan {
                section_type: PageType::Exclusions,
                confidence: 0.9,
                span: Some(TextSpan {
                    start_line: 13,
                    end_line: 30,
                }),
                reasoning: Some("Structural exclusion header: ## b. exclusions".to_string()),
                semantic_role: None,
                coverage_effects: vec![],
                exclusion_effects: vec![],
            },
        ];
        let classifications = vec![classification(1, PageType::Declarations, 0.95), c];
        let profile = builder().build_profile(doc_id(), &classifications, None);

        let pairs: Vec<(u32, u32)> = profile
            .section_boundaries
            .iter()
            .map(|b| (b.start_page, b.start_line.unwrap_or(0)))
            .collect();
        let mut sorted_pairs = pairs.clone();
        sorted_pairs.sort();
        assert_eq!(pairs, sorted_pairs);
        assert!(profile
            .section_boundaries
            .iter()
            .any(|b| b.start_line == Some(13)));
    }

    #[test]
    fn test_structural_inheritance_refines_coverages() {
        let mut liability = classification(2, PageType::Coverages, 0.9);
        liability.reasoning =
            Some("Matched coverages header: SECTION II - COVERED AUTOS LIABILITY COVERAGE".into());
        let mut physical = classification(4, PageType::Coverages, 0.9);
        physical.reasoning =
            Some("Matched coverages header: SECTION III - PHYSICAL DAMAGE COVERAGE".into());

        let classifications = vec![
            classification(1, PageType::Declarations, 0.95),
            liability,
            classification(3, PageType::Exclusions, 0.85),
            physical,
        ];
        let profile = builder().build_profile(doc_id(), &classifications, None);
        assert_eq!(profile.document_type, DocumentType::Policy);

        let liability_boundary = profile
            .section_boundaries
            .iter()
            .find(|b| b.start_page == 2)
            .unwrap();
        assert_eq!(
            liability_boundary.semantic_section,
            Some(SemanticSection::LiabilityCoverage)
        );
        // The exclusions run after SECTION II inherits liability context.
        let exclusions_boundary = profile
            .section_boundaries
            .iter()
            .find(|b| b.start_page == 3)
            .unwrap();
        assert_eq!(
            exclusions_boundary.semantic_section,
            Some(SemanticSection::LiabilityExclusions)
        );
        let physical_boundary = profile
            .section_boundaries
            .iter()
            .find(|b| b.start_page == 4)
            .unwrap();
        assert_eq!(
            physical_boundary.semantic_section,
            Some(SemanticSection::PhysicalDamageCoverage)
        );
        assert_eq!(
            physical_boundary
                .metadata
                .get("policy_section_context")
                .and_then(|v| v.as_str()),
            Some("physical_damage")
        );
    }

    #[test]
    fn test_definitions_sticky_in_page_map() {
        let classifications = vec![
            classification(1, PageType::Definitions, 0.9),
            classification(2, PageType::Coverages, 0.7),
            classification(3, PageType::Conditions, 0.9),
        ];
        let profile = builder().build_profile(doc_id(), &classifications, None);
        assert_eq!(
            profile.page_section_map.get(&2).map(String::as_str),
            Some("definitions")
        );
        assert_eq!(
            profile.page_section_map.get(&3).map(String::as_str),
            Some("conditions")
        );
    }

    #[test]
    fn test_certificate_breaks_inheritance() {
        let classifications = vec![
            classification(1, PageType::Coverages, 0.9),
            classification(2, PageType::CertificateOfInsurance, 0.98),
            classification(3, PageType::Unknown, 0.1),
        ];
        let profile = builder().build_profile(doc_id(), &classifications, None);
        assert_eq!(
            profile.page_section_map.get(&3).map(String::as_str),
            Some("unknown")
        );
    }

    #[test]
    fn test_page_map_complete() {
        let classifications: Vec<_> = (1..=7)
            .map(|p| classification(p, PageType::Coverages, 0.8))
            .collect();
        let profile = builder().build_profile(doc_id(), &classifications, None);
        assert_eq!(profile.page_section_map.len(), 7);
        for page in 1..=7 {
            assert!(profile.page_section_map.contains_key(&page));
        }
    }

    #[test]
    fn test_profile_is_deterministic() {
        let classifications = vec![
            classification(1, PageType::Declarations, 0.95),
            classification(2, PageType::Coverages, 0.85),
            classification(3, PageType::Endorsement, 0.9),
        ];
        let a = builder().build_profile(doc_id(), &classifications, None);
        let b = builder().build_profile(doc_id(), &classifications, None);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_subtype_inference() {
        let classifications = vec![
            classification(1, PageType::Declarations, 0.95),
            classification(2, PageType::Coverages, 0.85),
            classification(3, PageType::Sov, 0.9),
        ];
        let profile = builder().build_profile(doc_id(), &classifications, None);
        assert_eq!(profile.document_subtype.as_deref(), Some("commercial_property"));
    }
}

