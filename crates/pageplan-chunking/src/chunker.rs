//! Section-aware hybrid chunking.
//!
//! The document is processed as one stream of paragraphs. Section state is
//! carried across pages and updated by, in order of precedence, header
//! anchors in the text, explicit section boundaries, and the manifest's
//! page map. Flushes happen on section transitions and on token-budget
//! pressure; endorsement semantics project chunks onto the coverage and
//! exclusion spaces, emitting twice for dual-effect text.

use crate::anchors::detect_section_type;
use crate::models::{
    ChunkingResult, ChunkingStatistics, DocumentRole, HybridChunk, HybridChunkMetadata,
};
use crate::section_config::section_config;
use crate::super_chunks::SuperChunkBuilder;
use crate::token_counter::{split_sentences, TokenCounter};
use pageplan_core::{
    mapper, ChunkRole, CoverageEffect, DocumentId, EngineConfig, ExclusionEffect, Page,
    SectionBoundary, SectionType, SemanticRole,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Hard floor for the configurable minimum chunk size.
const FALLBACK_MIN_TOKENS: usize = 200;

/// Sections whose boundary arrival always forces a flush, even when the
/// section value matches the current one.
const ISO_HARD_STOPS: &[SectionType] = &[
    SectionType::CoverageGrant,
    SectionType::InsuredDefinition,
    SectionType::Limits,
    SectionType::Exclusions,
    SectionType::Conditions,
    SectionType::Definitions,
];

/// Resolve a structural section plus semantic role to the effective
/// extraction sections. `Both` triggers dual emission.
pub fn effective_section_types(
    section_type: SectionType,
    semantic_role: Option<SemanticRole>,
) -> Vec<SectionType> {
    if semantic_role == Some(SemanticRole::Both) {
        return vec![SectionType::Coverages, SectionType::Exclusions];
    }

    if section_type == SectionType::Endorsements {
        match semantic_role {
            Some(SemanticRole::CoverageModifier) => return vec![SectionType::Coverages],
            Some(SemanticRole::ExclusionModifier) => return vec![SectionType::Exclusions],
            Some(SemanticRole::AdministrativeOnly) => return vec![SectionType::Endorsements],
            _ => {}
        }
    }

    vec![section_type]
}

/// Streaming state for the chunk under construction.
#[derive(Debug)]
struct StreamState {
    section: SectionType,
    subsection: Option<String>,
    buffer: Vec<String>,
    tokens: usize,
    page_range: BTreeSet<u32>,
    semantic_role: Option<SemanticRole>,
    coverage_effects: Vec<CoverageEffect>,
    exclusion_effects: Vec<ExclusionEffect>,
    has_tables: bool,
    table_count: u32,
}

impl StreamState {
    fn new() -> Self {
        Self {
            section: SectionType::Unknown,
            subsection: None,
            buffer: Vec::new(),
            tokens: 0,
            page_range: BTreeSet::new(),
            semantic_role: None,
            coverage_effects: Vec::new(),
            exclusion_effects: Vec::new(),
            has_tables: false,
            table_count: 0,
        }
    }

    fn clear_buffer(&mut self) {
        self.buffer.clear();
        self.tokens = 0;
        self.page_range.clear();
        self.has_tables = false;
        self.table_count = 0;
    }
}

/// Hybrid chunker over extracted pages.
#[derive(Debug)]
pub struct HybridChunker {
    max_tokens: usize,
    min_tokens: usize,
    overlap_tokens: usize,
    token_counter: TokenCounter,
    super_chunk_builder: SuperChunkBuilder,
}

impl HybridChunker {
    /// Build a chunker from engine configuration. The minimum chunk size
    /// is clamped to the 200-token floor regardless of configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_tokens: config.max_tokens_per_chunk,
            min_tokens: config.min_tokens_per_chunk.max(FALLBACK_MIN_TOKENS),
            overlap_tokens: config.overlap_tokens,
            token_counter: TokenCounter::new(config.tokenizer_model.as_deref()),
            super_chunk_builder: SuperChunkBuilder::new(
                config.max_tokens_per_super_chunk,
                config.max_tokens_per_batch,
            ),
        }
    }

    pub fn super_chunk_builder(&self) -> &SuperChunkBuilder {
        &self.super_chunk_builder
    }

    /// Chunk a document's pages into hybrid chunks and super-chunks.
    ///
    /// Section attribution prefers the manifest's `page_section_map`, then
    /// per-page `page_type` metadata, then content detection. Boundaries
    /// supply intra-page transitions and semantic context.
    pub fn chunk_pages(
        &self,
        pages: &[Page],
        document_id: Option<DocumentId>,
        page_section_map: Option<&BTreeMap<u32, String>>,
        section_boundaries: Option<&[SectionBoundary]>,
    ) -> ChunkingResult {
        if pages.is_empty() {
            debug!("empty page list, nothing to chunk");
            return ChunkingResult::default();
        }

        let page_sections = match page_section_map {
            Some(map) => convert_section_map(map),
            None => {
                let has_metadata_sections = pages
                    .iter()
                    .any(|p| p.metadata.as_ref().is_some_and(|m| m.page_type.is_some()));
                if has_metadata_sections {
                    sections_from_metadata(pages)
                } else {
                    detect_page_sections(pages)
                }
            }
        };

        let chunks = self.stream_chunks(pages, &page_sections, document_id, section_boundaries);
        let chunks = self.merge_small_chunks(chunks);
        let super_chunks = self.super_chunk_builder.build_super_chunks(&chunks, document_id);

        let total_tokens: usize = chunks.iter().map(|c| c.metadata.token_count).sum();
        let mut section_map: BTreeMap<String, u32> = BTreeMap::new();
        for chunk in &chunks {
            let section = chunk
                .metadata
                .original_section_type
                .unwrap_or(chunk.metadata.section_type);
            *section_map.entry(section.as_str().to_string()).or_insert(0) += 1;
        }

        let statistics = ChunkingStatistics {
            avg_tokens_per_chunk: if chunks.is_empty() {
                0.0
            } else {
                total_tokens as f64 / chunks.len() as f64
            },
            max_chunk_tokens: chunks.iter().map(|c| c.metadata.token_count).max().unwrap_or(0),
            min_chunk_tokens: chunks.iter().map(|c| c.metadata.token_count).min().unwrap_or(0),
            chunks_with_tables: chunks.iter().filter(|c| c.metadata.has_tables).count(),
            llm_required_chunks: super_chunks.iter().filter(|sc| sc.requires_llm).count(),
            table_only_chunks: super_chunks.iter().filter(|sc| sc.table_only).count(),
        };

        info!(
            chunks = chunks.len(),
            super_chunks = super_chunks.len(),
            total_tokens,
            "hybrid chunking complete"
        );

        ChunkingResult {
            chunks,
            super_chunks,
            total_tokens,
            total_pages: pages.len(),
            section_map,
            statistics,
        }
    }

    fn stream_chunks(
        &self,
        pages: &[Page],
        page_sections: &BTreeMap<u32, SectionType>,
        document_id: Option<DocumentId>,
        section_boundaries: Option<&[SectionBoundary]>,
    ) -> Vec<HybridChunk> {
        let mut chunks: Vec<HybridChunk> = Vec::new();
        let mut chunk_index = 0usize;
        let mut state = StreamState::new();

        // Boundaries indexed by their start page, plus a covering-boundary
        // map so continuation pages inherit semantics.
        let mut boundaries_by_start: BTreeMap<u32, Vec<&SectionBoundary>> = BTreeMap::new();
        let mut boundaries_covering: BTreeMap<u32, &SectionBoundary> = BTreeMap::new();
        if let Some(boundaries) = section_boundaries {
            for boundary in boundaries {
                boundaries_by_start
                    .entry(boundary.start_page)
                    .or_default()
                    .push(boundary);
                for page in boundary.start_page..=boundary.end_page {
                    boundaries_covering.entry(page).or_insert(boundary);
                }
            }
        }

        for page in pages {
            let page_num = page.page_number;
            let manifest_section = page_sections
                .get(&page_num)
                .copied()
                .unwrap_or(SectionType::Unknown);
            let page_has_tables = page.has_tables();
            let page_table_count = page.table_count();
            let paragraphs = split_paragraphs(&page.markdown);
            let mut line_estimate = 1u32;

            for (para_idx, paragraph) in paragraphs.iter().enumerate() {
                let para_tokens = self.token_counter.count(paragraph);
                let para_lines = paragraph.matches('\n').count() as u32 + 1;

                let detected = detect_section_type(paragraph);

                let mut transition = false;
                let mut new_section = state.section;
                let mut new_subsection = state.subsection.clone();
                let mut new_role = state.semantic_role;
                let mut new_coverage = state.coverage_effects.clone();
                let mut new_exclusion = state.exclusion_effects.clone();

                // Explicit boundaries: page-level ones land on the first
                // paragraph, line-anchored ones when the stream reaches
                // their starting line.
                let mut boundary_section = SectionType::Unknown;
                let mut current_boundary: Option<&SectionBoundary> = None;
                if let Some(page_boundaries) = boundaries_by_start.get(&page_num) {
                    for boundary in page_boundaries.iter().copied() {
                        match boundary.start_line {
                            None if para_idx == 0 => {
                                boundary_section =
                                    mapper::page_type_to_section_type(boundary.section_type);
                                current_boundary = Some(boundary);
                            }
                            Some(start_line) if line_estimate >= start_line => {
                                boundary_section =
                                    mapper::page_type_to_section_type(boundary.section_type);
                                current_boundary = Some(boundary);
                            }
                            _ => {}
                        }
                    }
                }

                // Continuation pages of a multi-page boundary inherit its
                // semantics even though no boundary starts here.
                if current_boundary.is_none() && para_idx == 0 {
                    if let Some(covering) = boundaries_covering.get(&page_num) {
                        if covering.start_page != page_num {
                            if covering.semantic_role.is_some() {
                                new_role = covering.semantic_role;
                                state.semantic_role = covering.semantic_role;
                            }
                            if !covering.coverage_effects.is_empty() {
                                new_coverage = covering.coverage_effects.clone();
                                state.coverage_effects = covering.coverage_effects.clone();
                            }
                            if !covering.exclusion_effects.is_empty() {
                                new_exclusion = covering.exclusion_effects.clone();
                                state.exclusion_effects = covering.exclusion_effects.clone();
                            }
                        }
                    }
                }

                if detected != SectionType::Unknown && detected != state.section {
                    transition = true;
                    new_section = detected;
                    let core = mapper::normalize_to_core_section(detected);
                    if core != detected {
                        new_section = core;
                        new_subsection = Some(detected.as_str().to_string());
                    }
                    debug!(
                        page = page_num,
                        from = %state.section,
                        to = %new_section,
                        "section transition via header"
                    );
                }

                if boundary_section != SectionType::Unknown {
                    if let Some(boundary) = current_boundary {
                        new_subsection = boundary.sub_section_type.clone();
                        new_role = boundary.semantic_role;
                        new_coverage = boundary.coverage_effects.clone();
                        new_exclusion = boundary.exclusion_effects.clone();
                    }

                    if boundary_section != state.section
                        || new_subsection != state.subsection
                        || new_role != state.semantic_role
                        || ISO_HARD_STOPS.contains(&boundary_section)
                    {
                        transition = true;
                        new_section = boundary_section;
                        debug!(
                            page = page_num,
                            from = %state.section,
                            to = %boundary_section,
                            "section transition via boundary"
                        );
                    }
                } else if para_idx == 0
                    && manifest_section != SectionType::Unknown
                    && manifest_section != state.section
                {
                    transition = true;
                    new_section = manifest_section;
                    debug!(
                        page = page_num,
                        from = %state.section,
                        to = %manifest_section,
                        "section transition via manifest"
                    );
                }

                // Certificates carry no modifier semantics, whatever the
                // boundary or detection said.
                if new_section == SectionType::CertificateOfInsurance {
                    new_role = None;
                    new_coverage.clear();
                    new_exclusion.clear();
                }

                // A single paragraph over the budget is split internally;
                // the last piece stays buffered for normal flow.
                if para_tokens > self.max_tokens {
                    if !state.buffer.is_empty() {
                        self.emit(&mut chunks, &mut chunk_index, &state, document_id);
                        state.clear_buffer();
                        state.page_range.insert(page_num);
                    }

                    if transition {
                        state.section = new_section;
                        state.subsection = new_subsection.clone();
                        state.semantic_role = new_role;
                        state.coverage_effects = new_coverage.clone();
                        state.exclusion_effects = new_exclusion.clone();
                    }

                    let pieces = self.token_counter.split_by_token_limit(
                        paragraph,
                        self.max_tokens,
                        self.overlap_tokens,
                    );
                    if let Some((last, head)) = pieces.split_last() {
                        for piece in head {
                            let piece_tokens = self.token_counter.count(piece);
                            let piece_state = StreamState {
                                section: state.section,
                                subsection: state.subsection.clone(),
                                buffer: vec![piece.clone()],
                                tokens: piece_tokens,
                                page_range: BTreeSet::from([page_num]),
                                semantic_role: state.semantic_role,
                                coverage_effects: state.coverage_effects.clone(),
                                exclusion_effects: state.exclusion_effects.clone(),
                                has_tables: page_has_tables,
                                table_count: page_table_count,
                            };
                            self.emit(&mut chunks, &mut chunk_index, &piece_state, document_id);
                        }
                        state.buffer = vec![last.clone()];
                        state.tokens = self.token_counter.count(last);
                        state.page_range = BTreeSet::from([page_num]);
                        state.has_tables = page_has_tables;
                        state.table_count = page_table_count;
                    }

                    line_estimate += para_lines + 1;
                    continue;
                }

                let token_limit_reached = state.tokens + para_tokens > self.max_tokens;
                let min_tokens_met = state.tokens >= self.min_tokens;
                let should_flush = !state.buffer.is_empty()
                    && (transition || (token_limit_reached && min_tokens_met));

                // Symbol-table rule: pipe-heavy buffers describing covered
                // auto symbols belong to the context tables, not to a
                // semantic coverage section.
                if !state.buffer.is_empty()
                    && matches!(state.section, SectionType::Coverages | SectionType::Unknown)
                {
                    let joined = state.buffer.join("\n").to_lowercase();
                    if joined.contains("symbol") || joined.contains("designation") {
                        let table_like = state
                            .buffer
                            .iter()
                            .filter(|p| {
                                let trimmed = p.trim();
                                trimmed.starts_with('|') || trimmed.matches('|').count() > 2
                            })
                            .count();
                        let mostly_tables =
                            table_like as f64 / state.buffer.len() as f64 >= 0.6;
                        if mostly_tables || (state.has_tables && joined.contains("symbol")) {
                            debug!(page = page_num, "symbol-table rule forcing coverages_context");
                            state.section = SectionType::CoveragesContext;
                            state.semantic_role = None;
                        }
                    }
                }

                if should_flush {
                    self.emit(&mut chunks, &mut chunk_index, &state, document_id);

                    if transition {
                        state.clear_buffer();
                    } else {
                        // Token-limit flush: seed the next chunk with
                        // trailing sentences worth roughly overlap_tokens.
                        let flushed = state.buffer.join("\n\n");
                        let overlap_text = self.overlap_tail(&flushed);
                        state.clear_buffer();
                        if !overlap_text.is_empty() {
                            state.tokens = self.token_counter.count(&overlap_text);
                            state.buffer.push(overlap_text);
                        }
                    }
                    state.page_range.insert(page_num);
                }

                if transition {
                    state.section = new_section;
                    state.subsection = new_subsection;
                    state.semantic_role = new_role;
                    state.coverage_effects = new_coverage;
                    state.exclusion_effects = new_exclusion;
                }

                // Granular coverage sections imply their role when nothing
                // explicit was set.
                if matches!(state.semantic_role, None | Some(SemanticRole::Unknown)) {
                    state.semantic_role = match state.section {
                        SectionType::CoverageGrant => Some(SemanticRole::CoverageGrant),
                        SectionType::CoverageExtension => Some(SemanticRole::CoverageExtension),
                        SectionType::Limits => Some(SemanticRole::Limits),
                        SectionType::InsuredDefinition => Some(SemanticRole::InsuredDefinition),
                        SectionType::Definitions => Some(SemanticRole::Definitions),
                        _ => state.semantic_role,
                    };
                }

                state.buffer.push(paragraph.clone());
                state.tokens += para_tokens;
                state.page_range.insert(page_num);
                if page_has_tables {
                    state.has_tables = true;
                    state.table_count = state.table_count.max(page_table_count);
                }

                line_estimate += para_lines + 1;
            }
        }

        if !state.buffer.is_empty() {
            self.emit(&mut chunks, &mut chunk_index, &state, document_id);
        }

        chunks
    }

    /// Emit one chunk per effective section type for the buffered state.
    fn emit(
        &self,
        chunks: &mut Vec<HybridChunk>,
        chunk_index: &mut usize,
        state: &StreamState,
        document_id: Option<DocumentId>,
    ) {
        for effective in effective_section_types(state.section, state.semantic_role) {
            chunks.push(self.build_chunk(state, effective, document_id, *chunk_index));
            *chunk_index += 1;
        }
    }

    fn build_chunk(
        &self,
        state: &StreamState,
        effective: SectionType,
        document_id: Option<DocumentId>,
        chunk_index: usize,
    ) -> HybridChunk {
        let text = state.buffer.join("\n\n").trim().to_string();
        let pages: Vec<u32> = state.page_range.iter().copied().collect();
        let primary_page = pages.first().copied().unwrap_or(1);

        let chunk_role = if state.has_tables && state.table_count > 0 {
            if state.table_count > 2 {
                ChunkRole::Table
            } else {
                ChunkRole::Mixed
            }
        } else {
            ChunkRole::Text
        };

        let config = section_config(state.section);
        let document_role = if config.is_non_contractual {
            DocumentRole::NonContractual
        } else {
            DocumentRole::Contractual
        };

        let mut subsection_type = state.subsection.clone();
        if effective != state.section && subsection_type.is_none() {
            subsection_type = Some(format!("projected_from_{}", state.section.as_str()));
        }

        let context_header = format!(
            "{} (Page {})",
            state.section.display_name(),
            primary_page
        );

        let stable_chunk_id = stable_chunk_id(document_id, chunk_index);
        let contextualized_text = format!("{context_header}\n\n{text}");

        HybridChunk {
            text,
            contextualized_text,
            metadata: HybridChunkMetadata {
                document_id,
                page_number: primary_page,
                page_range: pages,
                section_type: state.section,
                section_name: state.section.display_name(),
                subsection_type,
                chunk_index,
                token_count: state.tokens,
                stable_chunk_id,
                chunk_role,
                has_tables: state.has_tables,
                table_count: state.table_count,
                context_header: Some(context_header),
                source: "semantic_paragraph_chunker".to_string(),
                semantic_role: state.semantic_role,
                coverage_effects: state.coverage_effects.clone(),
                exclusion_effects: state.exclusion_effects.clone(),
                original_section_type: Some(state.section),
                effective_section_type: Some(effective),
                document_role,
            },
        }
    }

    /// Trailing sentences worth at most `overlap_tokens`, oldest first.
    fn overlap_tail(&self, text: &str) -> String {
        if text.is_empty() || self.overlap_tokens == 0 {
            return String::new();
        }

        let sentences = split_sentences(text);
        let mut tail: Vec<&str> = Vec::new();
        let mut tokens = 0usize;
        for sentence in sentences.iter().rev() {
            let sentence_tokens = self.token_counter.count(sentence);
            if tokens + sentence_tokens > self.overlap_tokens {
                break;
            }
            tail.insert(0, sentence);
            tokens += sentence_tokens;
        }

        tail.concat().trim().to_string()
    }

    /// Merge consecutive undersized chunks that share structural section,
    /// effective section, and semantic role.
    fn merge_small_chunks(&self, chunks: Vec<HybridChunk>) -> Vec<HybridChunk> {
        if chunks.len() < 2 {
            return chunks;
        }

        let mut merged: Vec<HybridChunk> = Vec::new();
        let mut iter = chunks.into_iter();
        let mut current = match iter.next() {
            Some(first) => first,
            None => return merged,
        };

        for next in iter {
            let same_section = current.metadata.section_type == next.metadata.section_type
                && current.metadata.effective_section_type == next.metadata.effective_section_type;
            let same_semantic = current.metadata.semantic_role == next.metadata.semantic_role;
            let undersized = current.metadata.token_count < self.min_tokens;
            let combined_fits =
                current.metadata.token_count + next.metadata.token_count <= self.max_tokens;

            if same_section && same_semantic && undersized && combined_fits {
                current = merge_pair(current, &next);
            } else {
                merged.push(current);
                current = next;
            }
        }
        merged.push(current);
        merged
    }
}

fn merge_pair(current: HybridChunk, next: &HybridChunk) -> HybridChunk {
    let text = format!("{}\n\n{}", current.text, next.text);
    let token_count = current.metadata.token_count + next.metadata.token_count;

    let mut page_range: Vec<u32> = current
        .metadata
        .page_range
        .iter()
        .chain(next.metadata.page_range.iter())
        .copied()
        .collect();
    page_range.sort_unstable();
    page_range.dedup();

    let mut coverage_effects = current.metadata.coverage_effects.clone();
    for effect in &next.metadata.coverage_effects {
        if !coverage_effects.contains(effect) {
            coverage_effects.push(*effect);
        }
    }
    let mut exclusion_effects = current.metadata.exclusion_effects.clone();
    for effect in &next.metadata.exclusion_effects {
        if !exclusion_effects.contains(effect) {
            exclusion_effects.push(*effect);
        }
    }

    let metadata = HybridChunkMetadata {
        page_number: page_range.first().copied().unwrap_or(1),
        page_range,
        token_count,
        has_tables: current.metadata.has_tables || next.metadata.has_tables,
        table_count: current.metadata.table_count.max(next.metadata.table_count),
        coverage_effects,
        exclusion_effects,
        source: "merged_semantic_paragraph_chunker".to_string(),
        ..current.metadata
    };

    let contextualized_text = match &metadata.context_header {
        Some(header) => format!("{header}\n\n{text}"),
        None => text.clone(),
    };

    HybridChunk {
        text,
        contextualized_text,
        metadata,
    }
}

fn stable_chunk_id(document_id: Option<DocumentId>, chunk_index: usize) -> String {
    match document_id {
        Some(id) => format!("chunk_{id}_{chunk_index}"),
        None => format!("chunk_unknown_{chunk_index}"),
    }
}

/// Manifest map values normalized to canonical section types. Multi-value
/// entries ("coverages,exclusions") keep their first section.
fn convert_section_map(map: &BTreeMap<u32, String>) -> BTreeMap<u32, SectionType> {
    map.iter()
        .map(|(page, value)| {
            let primary = value.split(',').next().unwrap_or(value);
            (*page, mapper::string_to_section_type(primary))
        })
        .collect()
}

fn sections_from_metadata(pages: &[Page]) -> BTreeMap<u32, SectionType> {
    pages
        .iter()
        .map(|page| {
            let section = page
                .metadata
                .as_ref()
                .and_then(|m| m.page_type.as_deref())
                .map(mapper::string_to_section_type)
                .unwrap_or(SectionType::Unknown);
            (page.page_number, section)
        })
        .collect()
}

/// Content-detection fallback with forward fill across pages.
fn detect_page_sections(pages: &[Page]) -> BTreeMap<u32, SectionType> {
    let mut sections = BTreeMap::new();
    let mut current = SectionType::Unknown;
    for page in pages {
        let detected = detect_section_type(&page.markdown);
        if detected != SectionType::Unknown {
            current = detected;
        }
        sections.insert(page.page_number, current);
    }
    sections
}

/// Paragraphs split on blank lines and before markdown headings.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let is_blank = line.trim().is_empty();
        let is_heading = {
            let hashes = line.chars().take_while(|c| *c == '#').count();
            (1..=3).contains(&hashes) && line.chars().nth(hashes) == Some(' ')
        };

        if is_blank || is_heading {
            if !current.is_empty() {
                let paragraph = current.join("\n").trim().to_string();
                if !paragraph.is_empty() {
                    paragraphs.push(paragraph);
                }
                current.clear();
            }
            if is_heading {
                current.push(line);
            }
            continue;
        }
        current.push(line);
    }

    if !current.is_empty() {
        let paragraph = current.join("\n").trim().to_string();
        if !paragraph.is_empty() {
            paragraphs.push(paragraph);
        }
    }

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chunker() -> HybridChunker {
        HybridChunker::new(&EngineConfig::default())
    }

    fn small_chunker() -> HybridChunker {
        HybridChunker::new(&EngineConfig {
            max_tokens_per_chunk: 300,
            min_tokens_per_chunk: 0,
            overlap_tokens: 20,
            ..EngineConfig::default()
        })
    }

    fn doc_id() -> DocumentId {
        DocumentId::from_u128(7)
    }

    fn boundary(section: pageplan_core::PageType, start: u32, end: u32) -> SectionBoundary {
        SectionBoundary {
            section_type: section,
            semantic_section: None,
            start_page: start,
            end_page: end,
            start_line: None,
            end_line: None,
            confidence: 0.9,
            page_count: end - start + 1,
            anchor_text: None,
            sub_section_type: None,
            modifier_type: None,
            endorsement_scope: None,
            extractable: true,
            semantic_role: None,
            coverage_effects: vec![],
            exclusion_effects: vec![],
            effective_section_type: None,
            metadata: BTreeMap::new(),
        }
    }

    #[test]
    fn test_empty_pages() {
        let result = chunker().chunk_pages(&[], None, None, None);
        assert!(result.chunks.is_empty());
        assert_eq!(result.total_tokens, 0);
        assert_eq!(result.total_pages, 0);
    }

    #[test]
    fn test_split_paragraphs_on_blank_lines_and_headings() {
        let text = "first paragraph line one\nline two\n\nsecond paragraph\n## Heading\nbody under heading";
        let paragraphs = split_paragraphs(text);
        assert_eq!(paragraphs.len(), 3);
        assert!(paragraphs[2].starts_with("## Heading"));
    }

    #[test]
    fn test_single_page_single_chunk() {
        let pages = vec![Page::new(
            1,
            "DECLARATIONS\n\nPolicy Number: AB-1234567\nNamed Insured: XYZ LLC",
        )];
        let mut map = BTreeMap::new();
        map.insert(1, "declarations".to_string());
        let result = chunker().chunk_pages(&pages, Some(doc_id()), Some(&map), None);
        assert_eq!(result.chunks.len(), 1);
        let chunk = &result.chunks[0];
        assert_eq!(chunk.metadata.section_type, SectionType::Declarations);
        assert_eq!(
            chunk.metadata.effective_section_type,
            Some(SectionType::Declarations)
        );
        assert_eq!(chunk.metadata.stable_chunk_id, format!("chunk_{}_0", doc_id()));
        assert!(chunk
            .contextualized_text
            .starts_with("Declarations (Page 1)"));
        assert_eq!(result.total_tokens, chunk.metadata.token_count);
    }

    #[test]
    fn test_boundary_wins_over_manifest() {
        let mut map = BTreeMap::new();
        map.insert(1, "declarations".to_string());
        map.insert(2, "coverages".to_string());
        map.insert(3, "unknown".to_string());

        let boundaries = vec![boundary(pageplan_core::PageType::Coverages, 1, 1)];
        let pages = vec![
            Page::new(1, "Some insuring text that the manifest calls declarations."),
            Page::new(2, "More coverage text on the second page of the form."),
            Page::new(3, "Trailing text with no section of its own."),
        ];
        let result = chunker().chunk_pages(&pages, Some(doc_id()), Some(&map), Some(&boundaries));
        assert_eq!(result.chunks[0].metadata.section_type, SectionType::Coverages);
        // Page 3 is absorbed into the preceding section's chunk.
        let last = result.chunks.last().unwrap();
        assert!(last.metadata.page_range.contains(&3));
    }

    #[test]
    fn test_dual_emission_for_both_role() {
        let mut endorsement = boundary(pageplan_core::PageType::Endorsement, 1, 1);
        endorsement.semantic_role = Some(SemanticRole::Both);
        endorsement.coverage_effects = vec![CoverageEffect::AddsCoverage];
        endorsement.exclusion_effects = vec![ExclusionEffect::IntroducesExclusion];

        let mut map = BTreeMap::new();
        map.insert(1, "endorsement".to_string());
        let pages = vec![Page::new(
            1,
            "This endorsement adds coverage for hired autos but excludes racing.",
        )];
        let result =
            chunker().chunk_pages(&pages, Some(doc_id()), Some(&map), Some(&[endorsement]));

        assert_eq!(result.chunks.len(), 2);
        let (first, second) = (&result.chunks[0], &result.chunks[1]);
        assert_eq!(first.text, second.text);
        assert_ne!(
            first.metadata.stable_chunk_id,
            second.metadata.stable_chunk_id
        );
        let effectives: Vec<_> = result
            .chunks
            .iter()
            .filter_map(|c| c.metadata.effective_section_type)
            .collect();
        assert!(effectives.contains(&SectionType::Coverages));
        assert!(effectives.contains(&SectionType::Exclusions));
        for chunk in &result.chunks {
            assert_eq!(chunk.metadata.semantic_role, Some(SemanticRole::Both));
            assert_eq!(
                chunk.metadata.subsection_type.as_deref(),
                Some("projected_from_endorsements")
            );
        }
    }

    #[test]
    fn test_coverage_modifier_projects_to_coverages() {
        let mut endorsement = boundary(pageplan_core::PageType::Endorsement, 1, 1);
        endorsement.semantic_role = Some(SemanticRole::CoverageModifier);

        let mut map = BTreeMap::new();
        map.insert(1, "endorsement".to_string());
        let pages = vec![Page::new(1, "Who is an insured is amended to include volunteers.")];
        let result =
            chunker().chunk_pages(&pages, Some(doc_id()), Some(&map), Some(&[endorsement]));
        assert_eq!(result.chunks.len(), 1);
        assert_eq!(
            result.chunks[0].metadata.effective_section_type,
            Some(SectionType::Coverages)
        );
        assert_eq!(
            result.chunks[0].metadata.section_type,
            SectionType::Endorsements
        );
    }

    #[test]
    fn test_continuation_page_inherits_boundary_semantics() {
        let mut endorsement = boundary(pageplan_core::PageType::Endorsement, 1, 2);
        endorsement.semantic_role = Some(SemanticRole::ExclusionModifier);
        endorsement.exclusion_effects = vec![ExclusionEffect::IntroducesExclusion];

        let mut map = BTreeMap::new();
        map.insert(1, "endorsement".to_string());
        map.insert(2, "endorsement".to_string());
        let pages = vec![
            Page::new(1, "This endorsement excludes racing events."),
            Page::new(2, "continued terms of the racing exclusion on page two."),
        ];
        let result =
            chunker().chunk_pages(&pages, Some(doc_id()), Some(&map), Some(&[endorsement]));
        for chunk in &result.chunks {
            assert_eq!(
                chunk.metadata.effective_section_type,
                Some(SectionType::Exclusions)
            );
            assert_eq!(
                chunk.metadata.semantic_role,
                Some(SemanticRole::ExclusionModifier)
            );
        }
    }

    #[test]
    fn test_certificate_guard_clears_semantics() {
        let mut cert = boundary(pageplan_core::PageType::CertificateOfInsurance, 1, 1);
        cert.semantic_role = Some(SemanticRole::Both);
        cert.coverage_effects = vec![CoverageEffect::AddsCoverage];

        let mut map = BTreeMap::new();
        map.insert(1, "certificate_of_insurance".to_string());
        let pages = vec![Page::new(1, "CERTIFICATE HOLDER information and coverages listed.")];
        let result = chunker().chunk_pages(&pages, Some(doc_id()), Some(&map), Some(&[cert]));
        assert_eq!(result.chunks.len(), 1);
        let chunk = &result.chunks[0];
        assert!(chunk.metadata.semantic_role.is_none());
        assert!(chunk.metadata.coverage_effects.is_empty());
        assert_eq!(chunk.metadata.document_role, DocumentRole::NonContractual);
    }

    #[test]
    fn test_oversized_paragraph_is_split() {
        let chunker = small_chunker();
        let huge = (0..60)
            .map(|i| format!("Sentence number {i} has a handful of words in it."))
            .collect::<Vec<_>>()
            .join(" ");
        let pages = vec![Page::new(1, huge.as_str())];
        let result = chunker.chunk_pages(&pages, Some(doc_id()), None, None);
        assert!(result.chunks.len() > 1);
        for chunk in &result.chunks {
            assert!(
                chunk.metadata.token_count <= 300,
                "chunk over hard limit: {}",
                chunk.metadata.token_count
            );
        }
    }

    #[test]
    fn test_transition_flush_carries_no_overlap() {
        let pages = vec![
            Page::new(1, "COVERAGES\n\nWe will pay for direct physical loss of covered property."),
            Page::new(2, "EXCLUSIONS\n\nWe will not pay for loss caused by war."),
        ];
        let result = chunker().chunk_pages(&pages, Some(doc_id()), None, None);
        assert_eq!(result.chunks.len(), 2);
        assert_eq!(result.chunks[0].metadata.section_type, SectionType::Coverages);
        assert_eq!(result.chunks[1].metadata.section_type, SectionType::Exclusions);
        assert!(!result.chunks[1].text.contains("direct physical loss"));
    }

    #[test]
    fn test_symbol_table_rule() {
        let md = "COVERAGES\n\n| Symbol | Description of Covered Auto Designation Symbols |\n| 1 | Any auto |\n| 2 | Owned autos only |\n\nThese symbols determine which autos are covered.";
        let pages = vec![Page::new(1, md).with_metadata(pageplan_core::PageMetadata {
            has_tables: Some(true),
            table_count: Some(1),
            ..Default::default()
        })];
        let result = chunker().chunk_pages(&pages, Some(doc_id()), None, None);
        let chunk = result.chunks.last().unwrap();
        assert_eq!(chunk.metadata.section_type, SectionType::CoveragesContext);
        assert!(chunk.metadata.semantic_role.is_none());
    }

    #[test]
    fn test_granular_section_derives_role() {
        let mut map = BTreeMap::new();
        map.insert(1, "limits".to_string());
        let pages = vec![Page::new(
            1,
            "LIMIT OF INSURANCE\n\nThe most we will pay is the limit shown.",
        )];
        let result = chunker().chunk_pages(&pages, Some(doc_id()), Some(&map), None);
        let chunk = &result.chunks[0];
        assert_eq!(chunk.metadata.section_type, SectionType::Limits);
        assert_eq!(chunk.metadata.semantic_role, Some(SemanticRole::Limits));
    }

    #[test]
    fn test_merge_small_chunks_same_section() {
        // Two per-page exclusion boundaries: the hard stop forces a flush
        // between pages, and the post-merge pass stitches the undersized
        // chunks back together.
        let boundaries = vec![
            boundary(pageplan_core::PageType::Exclusions, 1, 1),
            boundary(pageplan_core::PageType::Exclusions, 2, 2),
        ];
        let pages = vec![
            Page::new(1, "We will not pay for loss caused by war."),
            Page::new(2, "We will not pay for loss caused by racing."),
        ];
        let result = chunker().chunk_pages(&pages, Some(doc_id()), None, Some(&boundaries));
        assert_eq!(result.chunks.len(), 1);
        let chunk = &result.chunks[0];
        assert_eq!(chunk.metadata.page_range, vec![1, 2]);
        assert_eq!(chunk.metadata.source, "merged_semantic_paragraph_chunker");
        assert!(chunk.text.contains("war") && chunk.text.contains("racing"));
    }

    #[test]
    fn test_total_tokens_invariant() {
        let pages: Vec<Page> = (1..=6)
            .map(|n| {
                Page::new(
                    n,
                    format!("Page {n} body text with a reasonable amount of words to count."),
                )
            })
            .collect();
        let result = chunker().chunk_pages(&pages, Some(doc_id()), None, None);
        let sum: usize = result.chunks.iter().map(|c| c.metadata.token_count).sum();
        assert_eq!(sum, result.total_tokens);
    }

    #[test]
    fn test_stable_ids_unique_and_deterministic() {
        let pages = vec![
            Page::new(1, "COVERAGES\n\nSome coverage text."),
            Page::new(2, "EXCLUSIONS\n\nSome exclusion text."),
        ];
        let a = chunker().chunk_pages(&pages, Some(doc_id()), None, None);
        let b = chunker().chunk_pages(&pages, Some(doc_id()), None, None);
        let ids_a: Vec<_> = a.chunks.iter().map(|c| &c.metadata.stable_chunk_id).collect();
        let ids_b: Vec<_> = b.chunks.iter().map(|c| &c.metadata.stable_chunk_id).collect();
        assert_eq!(ids_a, ids_b);
        let mut deduped = ids_a.clone();
        deduped.dedup();
        assert_eq!(deduped.len(), ids_a.len());
    }

    proptest! {
        #[test]
        fn prop_no_chunk_exceeds_budget(
            paragraphs in proptest::collection::vec("[a-z]{2,8}( [a-z]{2,8}){5,40}", 1..12)
        ) {
            let chunker = small_chunker();
            let markdown = paragraphs.join("\n\n");
            let pages = vec![Page::new(1, markdown.as_str())];
            let result = chunker.chunk_pages(&pages, None, None, None);
            for chunk in &result.chunks {
                prop_assert!(chunk.metadata.token_count <= 300);
            }
        }

        #[test]
        fn prop_total_tokens_is_sum(
            paragraphs in proptest::collection::vec("[a-z]{2,8}( [a-z]{2,8}){5,40}", 1..12)
        ) {
            let chunker = small_chunker();
            let markdown = paragraphs.join("\n\n");
            let pages = vec![Page::new(1, markdown.as_str())];
            let result = chunker.chunk_pages(&pages, None, None, None);
            let sum: usize = result.chunks.iter().map(|c| c.metadata.token_count).sum();
            prop_assert_eq!(sum, result.total_tokens);
        }
    }
}
