//! Duplicate page detection via MinHash similarity.
//!
//! Repeated ISO forms and boilerplate disclaimers are common in bundled
//! policies; pages whose top-line token sets agree above the threshold are
//! flagged as duplicates of the first occurrence. One detector instance is
//! scoped to a single document.

use pageplan_core::PageSignals;
use serde::Serialize;
use tracing::{debug, info};
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Fixed-permutation MinHash signature over a token set.
///
/// Each permutation keeps the minimum seeded xxh3 of every token; Jaccard
/// similarity is estimated from signature agreement. Seeds are the
/// permutation indices, so signatures are deterministic across runs.
#[derive(Debug, Clone)]
pub struct MinHash {
    signature: Vec<u64>,
}

impl MinHash {
    pub fn new(num_perm: usize) -> Self {
        Self {
            signature: vec![u64::MAX; num_perm],
        }
    }

    pub fn update(&mut self, token: &str) {
        for (seed, slot) in self.signature.iter_mut().enumerate() {
            let hashed = xxh3_64_with_seed(token.as_bytes(), seed as u64);
            if hashed < *slot {
                *slot = hashed;
            }
        }
    }

    /// Estimated Jaccard similarity in `[0, 1]`.
    pub fn jaccard(&self, other: &MinHash) -> f64 {
        debug_assert_eq!(self.signature.len(), other.signature.len());
        if self.signature.is_empty() {
            return 0.0;
        }
        let matching = self
            .signature
            .iter()
            .zip(&other.signature)
            .filter(|(a, b)| a == b)
            .count();
        matching as f64 / self.signature.len() as f64
    }
}

/// Summary counters exposed for logging and diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateStats {
    pub total_pages_seen: usize,
    pub similarity_threshold: f64,
    pub num_permutations: usize,
}

/// Per-document duplicate page registry.
#[derive(Debug)]
pub struct DuplicateDetector {
    similarity_threshold: f64,
    num_perm: usize,
    seen_pages: Vec<(u32, MinHash)>,
}

impl DuplicateDetector {
    pub fn new(similarity_threshold: f64, num_perm: usize) -> Self {
        Self {
            similarity_threshold,
            num_perm,
            seen_pages: Vec::new(),
        }
    }

    /// Check a page against every previously seen page in insertion order.
    ///
    /// Returns `(true, Some(first_matching_page))` on a duplicate; unique
    /// pages are registered and return `(false, None)`.
    pub fn is_duplicate(&mut self, signals: &PageSignals) -> (bool, Option<u32>) {
        let current = self.minhash_for(signals);

        for (seen_page, seen_hash) in &self.seen_pages {
            let similarity = current.jaccard(seen_hash);
            if similarity >= self.similarity_threshold {
                info!(
                    page = signals.page_number,
                    duplicate_of = seen_page,
                    similarity,
                    "duplicate page detected"
                );
                return (true, Some(*seen_page));
            }
        }

        debug!(
            page = signals.page_number,
            checked = self.seen_pages.len(),
            "page is unique"
        );
        self.seen_pages.push((signals.page_number, current));
        (false, None)
    }

    fn minhash_for(&self, signals: &PageSignals) -> MinHash {
        let mut minhash = MinHash::new(self.num_perm);
        for line in &signals.top_lines {
            let normalized = line.to_lowercase();
            for word in normalized.split_whitespace() {
                minhash.update(word);
            }
        }
        minhash
    }

    /// Clear the registry before analyzing a new document.
    pub fn reset(&mut self) {
        self.seen_pages.clear();
        info!("reset duplicate detector registry");
    }

    pub fn stats(&self) -> DuplicateStats {
        DuplicateStats {
            total_pages_seen: self.seen_pages.len(),
            similarity_threshold: self.similarity_threshold,
            num_permutations: self.num_perm,
        }
    }
}

impl Default for DuplicateDetector {
    fn default() -> Self {
        Self::new(0.8, 128)
    }
}
