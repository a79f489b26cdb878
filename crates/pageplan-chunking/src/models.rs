//! Chunk-plan data model.

use pageplan_core::{
    ChunkRole, CoverageEffect, DocumentId, ExclusionEffect, SectionType, SemanticRole,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contractual standing of a chunk's section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentRole {
    Contractual,
    NonContractual,
}

impl DocumentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentRole::Contractual => "contractual",
            DocumentRole::NonContractual => "non_contractual",
        }
    }
}

/// Metadata attached to every hybrid chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridChunkMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
    /// Primary (first) page of the chunk.
    pub page_number: u32,
    pub page_range: Vec<u32>,
    pub section_type: SectionType,
    pub section_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsection_type: Option<String>,
    pub chunk_index: usize,
    pub token_count: usize,
    /// Deterministic id: `chunk_{document_id}_{chunk_index}`.
    pub stable_chunk_id: String,
    pub chunk_role: ChunkRole,
    pub has_tables: bool,
    pub table_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_header: Option<String>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_role: Option<SemanticRole>,
    #[serde(default)]
    pub coverage_effects: Vec<CoverageEffect>,
    #[serde(default)]
    pub exclusion_effects: Vec<ExclusionEffect>,
    /// Structural section before any projection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_section_type: Option<SectionType>,
    /// Section this chunk is routed to for extraction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_section_type: Option<SectionType>,
    pub document_role: DocumentRole,
}

/// A section-aware, token-budgeted chunk of document text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridChunk {
    pub text: String,
    pub contextualized_text: String,
    pub metadata: HybridChunkMetadata,
}

impl HybridChunk {
    /// Section used for extraction grouping.
    pub fn routing_section(&self) -> SectionType {
        self.metadata
            .effective_section_type
            .unwrap_or(self.metadata.section_type)
    }
}

/// A group of chunks sharing an effective section, sized for one LLM call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSuperChunk {
    pub section_type: SectionType,
    pub section_name: String,
    pub chunks: Vec<HybridChunk>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub super_chunk_id: Option<String>,
    /// Lower runs earlier.
    pub processing_priority: i32,
    pub requires_llm: bool,
    pub table_only: bool,
}

impl SectionSuperChunk {
    pub fn total_tokens(&self) -> usize {
        self.chunks.iter().map(|c| c.metadata.token_count).sum()
    }

    pub fn add_chunk(&mut self, chunk: HybridChunk) {
        self.chunks.push(chunk);
    }

    /// Inclusive page range covered by the member chunks.
    pub fn page_range(&self) -> Option<(u32, u32)> {
        let mut pages = self
            .chunks
            .iter()
            .flat_map(|c| c.metadata.page_range.iter().copied());
        let first = pages.next()?;
        let (mut lo, mut hi) = (first, first);
        for page in pages {
            lo = lo.min(page);
            hi = hi.max(page);
        }
        Some((lo, hi))
    }
}

/// A batch of super-chunks packed under the per-batch token limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuperChunkBatch {
    pub super_chunks: Vec<SectionSuperChunk>,
    pub total_tokens: usize,
    pub batch_index: usize,
    pub section_types: Vec<String>,
}

impl SuperChunkBatch {
    pub fn new(batch_index: usize) -> Self {
        Self {
            batch_index,
            ..Default::default()
        }
    }

    pub fn add_super_chunk(&mut self, super_chunk: SectionSuperChunk) {
        self.total_tokens += super_chunk.total_tokens();
        let section = super_chunk.section_type.as_str().to_string();
        if !self.section_types.contains(&section) {
            self.section_types.push(section);
        }
        self.super_chunks.push(super_chunk);
    }
}

/// Aggregate statistics for a chunking run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkingStatistics {
    pub avg_tokens_per_chunk: f64,
    pub max_chunk_tokens: usize,
    pub min_chunk_tokens: usize,
    pub chunks_with_tables: usize,
    pub llm_required_chunks: usize,
    pub table_only_chunks: usize,
}

/// Full output of the hybrid chunking pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkingResult {
    pub chunks: Vec<HybridChunk>,
    pub super_chunks: Vec<SectionSuperChunk>,
    pub total_tokens: usize,
    pub total_pages: usize,
    /// Chunk counts per structural section.
    pub section_map: BTreeMap<String, u32>,
    pub statistics: ChunkingStatistics,
}

/// LLM call-count estimate for a planned extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmCallEstimate {
    pub tier1_calls: usize,
    pub tier2_calls: usize,
    pub tier3_calls: usize,
    pub total_llm_calls: usize,
    pub table_only_sections: usize,
    pub total_llm_tokens: usize,
    pub sections_requiring_llm: Vec<String>,
    pub sections_table_only: Vec<String>,
}
