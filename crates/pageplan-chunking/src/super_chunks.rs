//! Section super-chunk assembly and LLM batch planning.
//!
//! Chunks group by effective section, split under per-section chunk and
//! token caps, and pack into batches sized for single LLM calls. Ordering
//! is driven by the per-section priority in the section config table.

use crate::models::{HybridChunk, LlmCallEstimate, SectionSuperChunk, SuperChunkBatch};
use crate::section_config::section_config;
use pageplan_core::{DocumentId, SectionType};
use tracing::{debug, info};

/// Builder for section super-chunks and processing batches.
#[derive(Debug, Clone)]
pub struct SuperChunkBuilder {
    max_tokens_per_super_chunk: usize,
    max_tokens_per_batch: usize,
}

impl SuperChunkBuilder {
    pub fn new(max_tokens_per_super_chunk: usize, max_tokens_per_batch: usize) -> Self {
        Self {
            max_tokens_per_super_chunk,
            max_tokens_per_batch,
        }
    }

    /// Group chunks into super-chunks, splitting oversized sections and
    /// sorting the result by processing priority.
    pub fn build_super_chunks(
        &self,
        chunks: &[HybridChunk],
        document_id: Option<DocumentId>,
    ) -> Vec<SectionSuperChunk> {
        if chunks.is_empty() {
            return Vec::new();
        }

        // Group by routing section, preserving first-seen order.
        let mut groups: Vec<(SectionType, Vec<HybridChunk>)> = Vec::new();
        for chunk in chunks {
            let section = chunk.routing_section();
            match groups.iter_mut().find(|(s, _)| *s == section) {
                Some((_, members)) => members.push(chunk.clone()),
                None => groups.push((section, vec![chunk.clone()])),
            }
        }

        let mut super_chunks: Vec<SectionSuperChunk> = Vec::new();
        for (section, members) in groups {
            super_chunks.extend(self.build_for_section(section, members, document_id));
        }
        super_chunks.sort_by_key(|sc| sc.processing_priority);

        info!(
            super_chunks = super_chunks.len(),
            "built section super-chunks"
        );
        super_chunks
    }

    fn build_for_section(
        &self,
        section: SectionType,
        chunks: Vec<HybridChunk>,
        document_id: Option<DocumentId>,
    ) -> Vec<SectionSuperChunk> {
        let config = section_config(section);
        let effective_max_tokens = config
            .max_tokens
            .map_or(self.max_tokens_per_super_chunk, |limit| {
                limit.min(self.max_tokens_per_super_chunk)
            });

        let total_tokens: usize = chunks.iter().map(|c| c.metadata.token_count).sum();
        debug!(
            section = %section,
            chunks = chunks.len(),
            total_tokens,
            effective_max_tokens,
            "building super-chunks for section"
        );

        if total_tokens <= effective_max_tokens && chunks.len() <= config.max_chunks {
            return vec![self.make_super_chunk(section, chunks, document_id, 0)];
        }

        let mut parts: Vec<SectionSuperChunk> = Vec::new();
        let mut current: Vec<HybridChunk> = Vec::new();
        let mut current_tokens = 0usize;
        let mut part_index = 0usize;

        for chunk in chunks {
            let chunk_tokens = chunk.metadata.token_count;
            let would_exceed_tokens = current_tokens + chunk_tokens > effective_max_tokens;
            let would_exceed_count = current.len() >= config.max_chunks;

            if !current.is_empty() && (would_exceed_tokens || would_exceed_count) {
                parts.push(self.make_super_chunk(
                    section,
                    std::mem::take(&mut current),
                    document_id,
                    part_index,
                ));
                part_index += 1;
                current_tokens = 0;
            }

            current_tokens += chunk_tokens;
            current.push(chunk);
        }

        if !current.is_empty() {
            parts.push(self.make_super_chunk(section, current, document_id, part_index));
        }

        parts
    }

    fn make_super_chunk(
        &self,
        section: SectionType,
        chunks: Vec<HybridChunk>,
        document_id: Option<DocumentId>,
        part_index: usize,
    ) -> SectionSuperChunk {
        let config = section_config(section);

        let mut section_name = section.display_name();
        if part_index > 0 {
            section_name = format!("{} (Part {})", section_name, part_index + 1);
        }

        let super_chunk_id = document_id
            .map(|id| format!("sc_{}_{}_{}", id, section.as_str(), part_index));

        SectionSuperChunk {
            section_type: section,
            section_name,
            chunks,
            document_id,
            super_chunk_id,
            processing_priority: config.priority,
            requires_llm: config.requires_llm,
            table_only: config.table_only,
        }
    }

    /// Pack LLM-required super-chunks into batches under the batch token
    /// limit, either in section priority order or first-fit-decreasing by
    /// token count.
    pub fn create_processing_batches(
        &self,
        super_chunks: &[SectionSuperChunk],
        batch_by_section: bool,
    ) -> Vec<SuperChunkBatch> {
        let mut llm_chunks: Vec<SectionSuperChunk> = super_chunks
            .iter()
            .filter(|sc| sc.requires_llm)
            .cloned()
            .collect();
        if llm_chunks.is_empty() {
            return Vec::new();
        }

        if !batch_by_section {
            llm_chunks.sort_by(|a, b| b.total_tokens().cmp(&a.total_tokens()));
        }

        let mut batches: Vec<SuperChunkBatch> = Vec::new();
        let mut current = SuperChunkBatch::new(0);

        for super_chunk in llm_chunks {
            if !current.super_chunks.is_empty()
                && current.total_tokens + super_chunk.total_tokens() > self.max_tokens_per_batch
            {
                batches.push(current);
                current = SuperChunkBatch::new(batches.len());
            }
            current.add_super_chunk(super_chunk);
        }
        if !current.super_chunks.is_empty() {
            batches.push(current);
        }

        debug!(batches = batches.len(), "created processing batches");
        batches
    }

    /// Merge small same-section super-chunks to reduce call count.
    pub fn merge_small_super_chunks(
        &self,
        super_chunks: Vec<SectionSuperChunk>,
        min_tokens: usize,
    ) -> Vec<SectionSuperChunk> {
        if super_chunks.is_empty() {
            return super_chunks;
        }

        let mut by_section: Vec<(SectionType, Vec<SectionSuperChunk>)> = Vec::new();
        for sc in super_chunks {
            match by_section.iter_mut().find(|(s, _)| *s == sc.section_type) {
                Some((_, members)) => members.push(sc),
                None => by_section.push((sc.section_type, vec![sc])),
            }
        }

        let mut merged: Vec<SectionSuperChunk> = Vec::new();
        for (_, members) in by_section {
            if members.len() == 1 {
                merged.extend(members);
                continue;
            }

            let mut pending: Option<SectionSuperChunk> = None;
            for sc in members {
                if sc.total_tokens() >= min_tokens {
                    if let Some(held) = pending.take() {
                        merged.push(held);
                    }
                    merged.push(sc);
                } else if let Some(held) = pending.as_mut() {
                    if held.total_tokens() + sc.total_tokens() <= self.max_tokens_per_super_chunk {
                        for chunk in sc.chunks {
                            held.add_chunk(chunk);
                        }
                    } else {
                        let full = pending.take();
                        if let Some(full) = full {
                            merged.push(full);
                        }
                        pending = Some(sc);
                    }
                } else {
                    pending = Some(sc);
                }
            }
            if let Some(held) = pending {
                merged.push(held);
            }
        }

        merged.sort_by_key(|sc| sc.processing_priority);
        merged
    }

    /// LLM-required super-chunks in priority order, then table-only ones.
    pub fn extraction_order(
        &self,
        super_chunks: &[SectionSuperChunk],
    ) -> Vec<SectionSuperChunk> {
        let mut llm_required: Vec<SectionSuperChunk> = super_chunks
            .iter()
            .filter(|sc| sc.requires_llm)
            .cloned()
            .collect();
        let mut table_only: Vec<SectionSuperChunk> = super_chunks
            .iter()
            .filter(|sc| sc.table_only)
            .cloned()
            .collect();

        llm_required.sort_by_key(|sc| sc.processing_priority);
        table_only.sort_by_key(|sc| sc.processing_priority);

        llm_required.extend(table_only);
        llm_required
    }

    /// Estimate LLM calls for the three-tier extraction model: one document
    /// classification call, one batch call per tier-2 batch, one
    /// cross-section validation call.
    pub fn estimate_llm_calls(&self, super_chunks: &[SectionSuperChunk]) -> LlmCallEstimate {
        let llm_required: Vec<&SectionSuperChunk> =
            super_chunks.iter().filter(|sc| sc.requires_llm).collect();
        let table_only: Vec<&SectionSuperChunk> =
            super_chunks.iter().filter(|sc| sc.table_only).collect();

        let batches = self.create_processing_batches(super_chunks, true);
        let total_llm_tokens: usize = llm_required.iter().map(|sc| sc.total_tokens()).sum();

        LlmCallEstimate {
            tier1_calls: 1,
            tier2_calls: batches.len(),
            tier3_calls: 1,
            total_llm_calls: 2 + batches.len(),
            table_only_sections: table_only.len(),
            total_llm_tokens,
            sections_requiring_llm: llm_required
                .iter()
                .map(|sc| sc.section_type.as_str().to_string())
                .collect(),
            sections_table_only: table_only
                .iter()
                .map(|sc| sc.section_type.as_str().to_string())
                .collect(),
        }
    }
}

impl Default for SuperChunkBuilder {
    fn default() -> Self {
        Self::new(6000, 12_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DocumentRole, HybridChunkMetadata};
    use pageplan_core::ChunkRole;

    fn chunk(
        section: SectionType,
        effective: Option<SectionType>,
        tokens: usize,
        index: usize,
    ) -> HybridChunk {
        HybridChunk {
            text: format!("chunk {index}"),
            contextualized_text: format!("chunk {index}"),
            metadata: HybridChunkMetadata {
                document_id: None,
                page_number: index as u32 + 1,
                page_range: vec![index as u32 + 1],
                section_type: section,
                section_name: section.display_name(),
                subsection_type: None,
                chunk_index: index,
                token_count: tokens,
                stable_chunk_id: format!("chunk_test_{index}"),
                chunk_role: ChunkRole::Text,
                has_tables: false,
                table_count: 0,
                context_header: None,
                source: "test".to_string(),
                semantic_role: None,
                coverage_effects: vec![],
                exclusion_effects: vec![],
                original_section_type: Some(section),
                effective_section_type: effective,
                document_role: DocumentRole::Contractual,
            },
        }
    }

    fn builder() -> SuperChunkBuilder {
        SuperChunkBuilder::new(8000, 12_000)
    }

    #[test]
    fn test_empty_chunks() {
        assert!(builder().build_super_chunks(&[], None).is_empty());
    }

    #[test]
    fn test_groups_by_section_sorted_by_priority() {
        let chunks = vec![
            chunk(SectionType::Sov, None, 1000, 0),
            chunk(SectionType::Coverages, None, 800, 1),
            chunk(SectionType::Declarations, None, 500, 2),
            chunk(SectionType::Coverages, None, 800, 3),
        ];
        let super_chunks = builder().build_super_chunks(&chunks, None);

        let sections: Vec<SectionType> = super_chunks.iter().map(|sc| sc.section_type).collect();
        assert_eq!(
            sections,
            vec![SectionType::Declarations, SectionType::Coverages, SectionType::Sov]
        );
        let coverages = &super_chunks[1];
        assert_eq!(coverages.chunks.len(), 2);
        assert_eq!(coverages.total_tokens(), 1600);
    }

    #[test]
    fn test_effective_section_routes_grouping() {
        let chunks = vec![
            chunk(SectionType::Endorsements, Some(SectionType::Coverages), 400, 0),
            chunk(SectionType::Coverages, None, 600, 1),
        ];
        let super_chunks = builder().build_super_chunks(&chunks, None);
        assert_eq!(super_chunks.len(), 1);
        assert_eq!(super_chunks[0].section_type, SectionType::Coverages);
        assert_eq!(super_chunks[0].chunks.len(), 2);
    }

    #[test]
    fn test_token_cap_splits_into_parts() {
        let builder = SuperChunkBuilder::new(2000, 12_000);
        let chunks: Vec<HybridChunk> = (0..5)
            .map(|i| chunk(SectionType::Coverages, None, 900, i))
            .collect();
        let super_chunks = builder.build_super_chunks(&chunks, Some(DocumentId::from_u128(9)));

        assert_eq!(super_chunks.len(), 3);
        for sc in &super_chunks {
            assert!(sc.total_tokens() <= 2000);
        }
        assert_eq!(super_chunks[0].section_name, "Coverages");
        assert_eq!(super_chunks[1].section_name, "Coverages (Part 2)");
        assert_eq!(
            super_chunks[1].super_chunk_id.as_deref(),
            Some(format!("sc_{}_coverages_1", DocumentId::from_u128(9)).as_str())
        );
    }

    #[test]
    fn test_max_chunks_cap_splits() {
        // Declarations cap at one chunk per super-chunk.
        let chunks: Vec<HybridChunk> = (0..3)
            .map(|i| chunk(SectionType::Declarations, None, 100, i))
            .collect();
        let super_chunks = builder().build_super_chunks(&chunks, None);
        assert_eq!(super_chunks.len(), 3);
        for sc in &super_chunks {
            assert_eq!(sc.chunks.len(), 1);
        }
    }

    #[test]
    fn test_table_only_flags() {
        let chunks = vec![
            chunk(SectionType::Sov, None, 1000, 0),
            chunk(SectionType::Declarations, None, 400, 1),
        ];
        let super_chunks = builder().build_super_chunks(&chunks, None);
        let sov = super_chunks
            .iter()
            .find(|sc| sc.section_type == SectionType::Sov)
            .unwrap();
        assert!(sov.table_only);
        assert!(!sov.requires_llm);
        let decl = super_chunks
            .iter()
            .find(|sc| sc.section_type == SectionType::Declarations)
            .unwrap();
        assert!(!decl.table_only);
        assert!(decl.requires_llm);
    }

    #[test]
    fn test_batches_respect_token_limit() {
        let builder = SuperChunkBuilder::new(8000, 2000);
        let chunks: Vec<HybridChunk> = (0..4)
            .map(|i| chunk(SectionType::Coverages, None, 900, i))
            .collect();
        let super_chunks = builder.build_super_chunks(&chunks, None);
        let batches = builder.create_processing_batches(&super_chunks, true);
        assert!(!batches.is_empty());
        for batch in &batches {
            assert!(batch.total_tokens <= 2000 || batch.super_chunks.len() == 1);
        }
        let indices: Vec<usize> = batches.iter().map(|b| b.batch_index).collect();
        assert_eq!(indices, (0..batches.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_batches_exclude_table_only() {
        let chunks = vec![
            chunk(SectionType::Sov, None, 1000, 0),
            chunk(SectionType::Coverages, None, 500, 1),
        ];
        let super_chunks = builder().build_super_chunks(&chunks, None);
        let batches = builder().create_processing_batches(&super_chunks, true);
        for batch in &batches {
            assert!(batch
                .super_chunks
                .iter()
                .all(|sc| sc.section_type != SectionType::Sov));
        }
    }

    #[test]
    fn test_token_sorted_batching_is_decreasing() {
        let builder = SuperChunkBuilder::new(8000, 50_000);
        let chunks = vec![
            chunk(SectionType::Conditions, None, 300, 0),
            chunk(SectionType::Coverages, None, 2000, 1),
            chunk(SectionType::Exclusions, None, 900, 2),
        ];
        let super_chunks = builder.build_super_chunks(&chunks, None);
        let batches = builder.create_processing_batches(&super_chunks, false);
        assert_eq!(batches.len(), 1);
        let tokens: Vec<usize> = batches[0]
            .super_chunks
            .iter()
            .map(|sc| sc.total_tokens())
            .collect();
        let mut sorted = tokens.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(tokens, sorted);
    }

    #[test]
    fn test_extraction_order_llm_first() {
        let chunks = vec![
            chunk(SectionType::Sov, None, 1000, 0),
            chunk(SectionType::Exclusions, None, 600, 1),
            chunk(SectionType::Declarations, None, 400, 2),
        ];
        let super_chunks = builder().build_super_chunks(&chunks, None);
        let ordered = builder().extraction_order(&super_chunks);
        assert_eq!(ordered.first().unwrap().section_type, SectionType::Declarations);
        assert_eq!(ordered.last().unwrap().section_type, SectionType::Sov);
        assert!(ordered.first().unwrap().requires_llm);
        assert!(ordered.last().unwrap().table_only);
    }

    #[test]
    fn test_merge_small_super_chunks() {
        let builder = SuperChunkBuilder::new(2000, 12_000);
        let chunks: Vec<HybridChunk> = (0..4)
            .map(|i| chunk(SectionType::Exclusions, None, 200, i))
            .collect();
        // Force one super-chunk per chunk by splitting through a tiny cap.
        let small_builder = SuperChunkBuilder::new(200, 12_000);
        let split = small_builder.build_super_chunks(&chunks, None);
        assert_eq!(split.len(), 4);

        let merged = builder.merge_small_super_chunks(split, 500);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].total_tokens(), 800);
    }

    #[test]
    fn test_estimate_llm_calls() {
        let chunks = vec![
            chunk(SectionType::Sov, None, 1000, 0),
            chunk(SectionType::Coverages, None, 500, 1),
            chunk(SectionType::Exclusions, None, 700, 2),
        ];
        let super_chunks = builder().build_super_chunks(&chunks, None);
        let estimate = builder().estimate_llm_calls(&super_chunks);
        assert_eq!(estimate.tier1_calls, 1);
        assert_eq!(estimate.tier3_calls, 1);
        assert_eq!(estimate.total_llm_calls, 2 + estimate.tier2_calls);
        assert_eq!(estimate.table_only_sections, 1);
        assert_eq!(estimate.total_llm_tokens, 1200);
        assert!(estimate
            .sections_requiring_llm
            .contains(&"coverages".to_string()));
        assert!(estimate.sections_table_only.contains(&"sov".to_string()));
    }
}
