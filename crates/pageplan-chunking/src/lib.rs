//! # Pageplan Chunking
//!
//! Token-aware hybrid chunking and LLM batch planning.
//!
//! This crate provides:
//! - Token counting with BPE and heuristic backends
//! - The hybrid paragraph-stream chunker with section transitions,
//!   overlap, and semantic dual emission
//! - Section super-chunk assembly and batch packing for LLM calls
//!
//! ## Key Types
//!
//! - [`HybridChunker`] - Streams pages into section-aware chunks
//! - [`SuperChunkBuilder`] - Groups chunks for batched extraction
//! - [`TokenCounter`] - Budget enforcement for every split decision

pub mod anchors;
pub mod chunker;
pub mod models;
pub mod section_config;
pub mod super_chunks;
pub mod token_counter;

pub use anchors::detect_section_type;
pub use chunker::{effective_section_types, HybridChunker};
pub use models::{
    ChunkingResult, ChunkingStatistics, DocumentRole, HybridChunk, HybridChunkMetadata,
    LlmCallEstimate, SectionSuperChunk, SuperChunkBatch,
};
pub use section_config::{section_config, SectionConfig};
pub use super_chunks::SuperChunkBuilder;
pub use token_counter::TokenCounter;
