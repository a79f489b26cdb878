//! Pipeline facade.
//!
//! Sequences signal extraction, duplicate detection, classification,
//! profile building, and chunk planning for one document at a time. The
//! facade owns no per-document state itself; the duplicate detector and
//! endorsement tracker live inside a single call. Suspension points are
//! only at the repository boundary, so a cancelled document can be retried
//! from scratch against the idempotent upserts.

use crate::error::{PipelineError, PipelineResult};
use crate::repository::PageAnalysisRepository;
use pageplan_analysis::{DocumentProfileBuilder, DuplicateDetector, MarkdownPageAnalyzer, PageClassifier};
use pageplan_chunking::{ChunkingResult, HybridChunker};
use pageplan_core::{
    DocumentId, DocumentType, EngineConfig, Page, PageClassification, PageManifest, PageSignals,
    PageType,
};
use tracing::{info, instrument};

/// End-to-end page analysis pipeline over a repository port.
pub struct PageAnalysisPipeline<R> {
    repository: R,
    config: EngineConfig,
    analyzer: MarkdownPageAnalyzer,
    classifier: PageClassifier,
    profile_builder: DocumentProfileBuilder,
    chunker: HybridChunker,
}

impl<R: PageAnalysisRepository> PageAnalysisPipeline<R> {
    pub fn new(repository: R, config: EngineConfig) -> Self {
        let classifier = PageClassifier::new(config.confidence_threshold);
        let chunker = HybridChunker::new(&config);
        Self {
            repository,
            config,
            analyzer: MarkdownPageAnalyzer::new(),
            classifier,
            profile_builder: DocumentProfileBuilder::new(),
            chunker,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Extract and persist signals for every page, in page order.
    #[instrument(skip(self, pages), fields(document = %document_id, pages = pages.len()))]
    pub async fn extract_signals(
        &self,
        document_id: DocumentId,
        pages: &[Page],
    ) -> PipelineResult<Vec<PageSignals>> {
        validate_pages(pages)?;

        let mut all_signals = Vec::with_capacity(pages.len());
        for page in pages {
            let signals =
                self.analyzer
                    .analyze(&page.markdown, page.page_number, page.metadata.as_ref());
            self.repository
                .save_page_signals(document_id, &signals)
                .await?;
            all_signals.push(signals);
        }

        info!(pages = all_signals.len(), "signal extraction complete");
        Ok(all_signals)
    }

    /// Classify pages with duplicate detection and continuation tracking,
    /// persisting each classification.
    #[instrument(skip(self, signals), fields(document = %document_id, hint = %hint))]
    pub async fn classify_pages(
        &self,
        document_id: DocumentId,
        signals: &[PageSignals],
        hint: DocumentType,
    ) -> PipelineResult<Vec<PageClassification>> {
        let mut detector = DuplicateDetector::new(
            self.config.minhash_similarity_threshold,
            self.config.minhash_permutations,
        );

        let mut duplicates: Vec<PageClassification> = Vec::new();
        let mut unique_signals: Vec<PageSignals> = Vec::new();
        for page_signals in signals {
            let (is_dup, dup_of) = detector.is_duplicate(page_signals);
            if is_dup {
                let mut classification =
                    PageClassification::new(page_signals.page_number, PageType::Duplicate, 1.0);
                classification.duplicate_of = dup_of;
                classification.reasoning =
                    dup_of.map(|page| format!("Duplicate of page {page}"));
                duplicates.push(classification);
            } else {
                unique_signals.push(page_signals.clone());
            }
        }

        let classified = self.classifier.classify_batch(&unique_signals, hint);

        let mut classifications: Vec<PageClassification> =
            classified.into_iter().chain(duplicates).collect();
        classifications.sort_by_key(|c| c.page_number);

        for classification in &classifications {
            self.repository
                .save_page_classification(document_id, classification)
                .await?;
        }

        let skipped = classifications.iter().filter(|c| !c.should_process).count();
        info!(
            total = classifications.len(),
            skipped,
            "page classification complete"
        );
        Ok(classifications)
    }

    /// Aggregate classifications into the document manifest and persist it.
    #[instrument(skip(self, classifications), fields(document = %document_id))]
    pub async fn create_manifest(
        &self,
        document_id: DocumentId,
        classifications: &[PageClassification],
        workflow_hint: Option<&str>,
    ) -> PipelineResult<PageManifest> {
        let profile =
            self.profile_builder
                .build_profile(document_id, classifications, workflow_hint);

        let pages_to_process: Vec<u32> = classifications
            .iter()
            .filter(|c| c.should_process)
            .map(|c| c.page_number)
            .collect();
        let pages_skipped: Vec<u32> = classifications
            .iter()
            .filter(|c| !c.should_process)
            .map(|c| c.page_number)
            .collect();

        let manifest = PageManifest {
            document_id,
            total_pages: classifications.len() as u32,
            pages_to_process,
            pages_skipped,
            classifications: classifications.to_vec(),
            page_section_map: profile.page_section_map.clone(),
            document_profile: Some(profile),
        };

        check_manifest_invariants(&manifest)?;
        self.repository.save_manifest(&manifest).await?;

        info!(
            total_pages = manifest.total_pages,
            processing_ratio = manifest.processing_ratio(),
            "manifest created"
        );
        Ok(manifest)
    }

    /// Convenience flow: signals, classification, manifest.
    ///
    /// With an unknown document-type hint, a keyword preview over the full
    /// markdown seeds the classifier so continuation tracking can engage on
    /// bundles before any manifest exists.
    pub async fn analyze_document(
        &self,
        document_id: DocumentId,
        pages: &[Page],
        hint: DocumentType,
        workflow_hint: Option<&str>,
    ) -> PipelineResult<PageManifest> {
        let signals = self.extract_signals(document_id, pages).await?;

        let hint = if hint == DocumentType::Unknown {
            let combined: String = pages
                .iter()
                .map(|p| p.markdown.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let (preview, score) = self.analyzer.detect_document_type(&combined);
            if score >= 0.5 {
                preview
            } else {
                DocumentType::Unknown
            }
        } else {
            hint
        };

        let classifications = self.classify_pages(document_id, &signals, hint).await?;
        self.create_manifest(document_id, &classifications, workflow_hint)
            .await
    }

    /// Plan hybrid chunks for a document using its manifest.
    pub fn chunk_document(
        &self,
        document_id: DocumentId,
        pages: &[Page],
        manifest: &PageManifest,
    ) -> ChunkingResult {
        let boundaries = manifest
            .document_profile
            .as_ref()
            .map(|p| p.section_boundaries.as_slice());
        self.chunker.chunk_pages(
            pages,
            Some(document_id),
            Some(&manifest.page_section_map),
            boundaries,
        )
    }
}

fn validate_pages(pages: &[Page]) -> PipelineResult<()> {
    for page in pages {
        if page.page_number < 1 {
            return Err(PipelineError::InvalidPage {
                page_number: page.page_number,
                reason: "page numbers are 1-indexed".to_string(),
            });
        }
        if page.markdown.trim().is_empty() {
            return Err(PipelineError::InvalidPage {
                page_number: page.page_number,
                reason: "empty markdown".to_string(),
            });
        }
        if let Some(metadata) = &page.metadata {
            if metadata.max_font_size.is_some_and(|size| size <= 0.0) {
                return Err(PipelineError::InvalidPage {
                    page_number: page.page_number,
                    reason: "max_font_size must be positive".to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Fatal checks for the invariants persisted state relies on.
fn check_manifest_invariants(manifest: &PageManifest) -> PipelineResult<()> {
    for classification in &manifest.classifications {
        if !manifest
            .page_section_map
            .contains_key(&classification.page_number)
        {
            return Err(PipelineError::InternalInvariant(format!(
                "page {} missing from page_section_map",
                classification.page_number
            )));
        }
    }

    if let Some(profile) = &manifest.document_profile {
        let mut previous: Option<(u32, u32)> = None;
        for boundary in &profile.section_boundaries {
            if boundary.page_count != boundary.end_page - boundary.start_page + 1 {
                return Err(PipelineError::InternalInvariant(format!(
                    "boundary page_count mismatch at page {}",
                    boundary.start_page
                )));
            }
            let key = (boundary.start_page, boundary.start_line.unwrap_or(0));
            if previous.is_some_and(|prev| key < prev) {
                return Err(PipelineError::InternalInvariant(
                    "section boundaries out of order".to_string(),
                ));
            }
            previous = Some(key);
        }
    }

    Ok(())
}
