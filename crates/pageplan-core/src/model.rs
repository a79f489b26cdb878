//! Entity types flowing through the analysis pipeline.
//!
//! `PageSignals` is created once per page and never mutated. A
//! `PageClassification` is created once; only the batch classifier may fill
//! its continuation fields before it is handed out. `DocumentProfile` is a
//! pure function of the ordered classifications plus the workflow hint.

use crate::id::DocumentId;
use crate::taxonomy::{
    CoverageEffect, DocumentType, ExclusionEffect, PageType, SemanticRole, SemanticSection,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A span of text within a page, in 1-indexed inclusive line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start_line: u32,
    pub end_line: u32,
}

/// Signals extracted from a single page without full OCR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSignals {
    /// 1-indexed page number.
    pub page_number: u32,
    /// Detected headings, or the first non-empty lines when none exist.
    pub top_lines: Vec<String>,
    /// All lines, for intra-page span detection.
    pub all_lines: Vec<String>,
    /// Ratio of text to page area, 0.0 (empty) to 1.0 (full).
    pub text_density: f64,
    pub has_tables: bool,
    /// Largest font size on the page, when known.
    pub max_font_size: Option<f64>,
    /// First 16 hex chars of the SHA-256 of the normalized text.
    pub page_hash: String,
    /// Canonicalized policy number, when present.
    pub policy_number: Option<String>,
    /// ISO form number (e.g. "CA T3 53 02 15"), when present.
    pub form_number: Option<String>,
    pub has_endorsement_header: bool,
    pub starts_mid_sentence: bool,
    pub first_line_text: Option<String>,
    /// Ordered alpha/numeric section labels found on the page.
    pub section_labels: Vec<String>,
    pub last_section_label: Option<String>,
    /// Matched explicit continuation text, when present.
    pub explicit_continuation: Option<String>,
    pub additional_metadata: BTreeMap<String, serde_json::Value>,
}

/// A classified section block within a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSpan {
    pub section_type: PageType,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<TextSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_role: Option<SemanticRole>,
    #[serde(default)]
    pub coverage_effects: Vec<CoverageEffect>,
    #[serde(default)]
    pub exclusion_effects: Vec<ExclusionEffect>,
}

/// Classification result for a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageClassification {
    pub page_number: u32,
    pub page_type: PageType,
    pub confidence: f64,
    /// Whether this page should undergo full extraction.
    pub should_process: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_of: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub sections: Vec<SectionSpan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_role: Option<SemanticRole>,
    #[serde(default)]
    pub coverage_effects: Vec<CoverageEffect>,
    #[serde(default)]
    pub exclusion_effects: Vec<ExclusionEffect>,
    #[serde(default)]
    pub is_continuation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_endorsement_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endorsement_page_sequence: Option<u32>,
}

impl PageClassification {
    /// Minimal classification with empty semantic annotations.
    pub fn new(page_number: u32, page_type: PageType, confidence: f64) -> Self {
        Self {
            page_number,
            page_type,
            confidence,
            should_process: false,
            duplicate_of: None,
            reasoning: None,
            sections: Vec::new(),
            semantic_role: None,
            coverage_effects: Vec::new(),
            exclusion_effects: Vec::new(),
            is_continuation: false,
            parent_endorsement_id: None,
            endorsement_page_sequence: None,
        }
    }
}

/// A contiguous run of pages (or an intra-page span) of one section type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionBoundary {
    pub section_type: PageType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_section: Option<SemanticSection>,
    pub start_page: u32,
    pub end_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    /// Average confidence across the pages in this section.
    pub confidence: f64,
    pub page_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor_text: Option<String>,
    /// Original granular type when folded onto a broader category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_section_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifier_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endorsement_scope: Option<String>,
    /// Whether this section carries extractable insurance data.
    pub extractable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_role: Option<SemanticRole>,
    #[serde(default)]
    pub coverage_effects: Vec<CoverageEffect>,
    #[serde(default)]
    pub exclusion_effects: Vec<ExclusionEffect>,
    /// Section this boundary is routed to for extraction, when projected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_section_type: Option<PageType>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl SectionBoundary {
    pub fn covers_page(&self, page_number: u32) -> bool {
        page_number >= self.start_page && page_number <= self.end_page
    }
}

/// Document-level profile aggregated from page classifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentProfile {
    pub document_id: DocumentId,
    pub document_type: DocumentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_subtype: Option<String>,
    pub confidence: f64,
    pub section_boundaries: Vec<SectionBoundary>,
    /// One semantic-section string per page.
    pub page_section_map: BTreeMap<u32, String>,
    #[serde(default)]
    pub section_type_distribution: BTreeMap<String, u32>,
    #[serde(default)]
    pub product_concepts: Vec<String>,
    pub page_type_distribution: BTreeMap<String, u32>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub semantic_capabilities: Vec<String>,
}

impl DocumentProfile {
    pub fn empty(document_id: DocumentId) -> Self {
        Self {
            document_id,
            document_type: DocumentType::Unknown,
            document_subtype: None,
            confidence: 0.0,
            section_boundaries: Vec::new(),
            page_section_map: BTreeMap::new(),
            section_type_distribution: BTreeMap::new(),
            product_concepts: Vec::new(),
            page_type_distribution: BTreeMap::new(),
            metadata: BTreeMap::new(),
            semantic_capabilities: Vec::new(),
        }
    }

    pub fn section_count(&self) -> usize {
        self.section_boundaries.len()
    }

    pub fn has_declarations(&self) -> bool {
        if !self.product_concepts.is_empty() {
            return self.product_concepts.iter().any(|c| c == "declarations");
        }
        self.section_boundaries
            .iter()
            .any(|b| b.section_type == PageType::Declarations)
    }

    pub fn has_coverages(&self) -> bool {
        if !self.product_concepts.is_empty() {
            return self.product_concepts.iter().any(|c| c == "coverages");
        }
        self.section_boundaries
            .iter()
            .any(|b| b.section_type == PageType::Coverages)
    }

    pub fn has_endorsements(&self) -> bool {
        if !self.product_concepts.is_empty() {
            return self.product_concepts.iter().any(|c| c == "endorsements");
        }
        self.section_boundaries
            .iter()
            .any(|b| b.section_type == PageType::Endorsement)
    }

    /// All page numbers covered by boundaries of the given section type.
    pub fn section_pages(&self, section_type: PageType) -> Vec<u32> {
        let mut pages = Vec::new();
        for boundary in &self.section_boundaries {
            if boundary.section_type == section_type {
                pages.extend(boundary.start_page..=boundary.end_page);
            }
        }
        pages
    }

    pub fn section_for_page(&self, page_number: u32) -> Option<&str> {
        self.page_section_map.get(&page_number).map(String::as_str)
    }
}

/// Complete page analysis manifest for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageManifest {
    pub document_id: DocumentId,
    pub total_pages: u32,
    pub pages_to_process: Vec<u32>,
    pub pages_skipped: Vec<u32>,
    pub classifications: Vec<PageClassification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_profile: Option<DocumentProfile>,
    #[serde(default)]
    pub page_section_map: BTreeMap<u32, String>,
}

impl PageManifest {
    /// Fraction of pages that will be processed, in `[0, 1]`.
    pub fn processing_ratio(&self) -> f64 {
        if self.total_pages == 0 {
            return 0.0;
        }
        self.pages_to_process.len() as f64 / self.total_pages as f64
    }

    pub fn cost_savings_estimate(&self) -> f64 {
        1.0 - self.processing_ratio()
    }

    pub fn document_type(&self) -> Option<DocumentType> {
        self.document_profile.as_ref().map(|p| p.document_type)
    }

    pub fn pages_by_type(&self, page_type: PageType) -> Vec<u32> {
        self.classifications
            .iter()
            .filter(|c| c.page_type == page_type)
            .map(|c| c.page_number)
            .collect()
    }

    pub fn section_for_page(&self, page_number: u32) -> Option<&str> {
        self.page_section_map.get(&page_number).map(String::as_str)
    }
}
