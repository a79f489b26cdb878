//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Tunable knobs for the analysis and chunking pipeline.
///
/// Defaults match production behavior; unknown workflow hints are ignored
/// downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Classifier gating threshold for secondary sections (conditions,
    /// exclusions, definitions).
    pub confidence_threshold: f64,
    /// Jaccard similarity at or above which a page is a duplicate.
    pub minhash_similarity_threshold: f64,
    /// Number of MinHash permutations.
    pub minhash_permutations: usize,
    /// Hard per-chunk token ceiling.
    pub max_tokens_per_chunk: usize,
    /// Soft per-chunk token floor; the chunker clamps this to at least 200.
    pub min_tokens_per_chunk: usize,
    /// Sentence-granular overlap carried across token-limit flushes.
    pub overlap_tokens: usize,
    /// Token ceiling per section super-chunk.
    pub max_tokens_per_super_chunk: usize,
    /// Token ceiling per LLM batch.
    pub max_tokens_per_batch: usize,
    /// BPE tokenizer model name; heuristic counting when absent or unknown.
    pub tokenizer_model: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            minhash_similarity_threshold: 0.8,
            minhash_permutations: 128,
            max_tokens_per_chunk: 1500,
            min_tokens_per_chunk: 300,
            overlap_tokens: 50,
            max_tokens_per_super_chunk: 6000,
            max_tokens_per_batch: 12_000,
            tokenizer_model: None,
        }
    }
}
