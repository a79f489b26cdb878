//! End-to-end pipeline scenarios against the in-memory repository.

use pageplan_core::{DocumentId, DocumentType, Page, PageType, SectionType, SemanticRole};
use pageplan_pipeline::{MemoryRepository, PageAnalysisPipeline, PageAnalysisRepository};

fn pipeline() -> PageAnalysisPipeline<MemoryRepository> {
    PageAnalysisPipeline::new(MemoryRepository::new(), pageplan_core::EngineConfig::default())
}

fn doc(n: u128) -> DocumentId {
    DocumentId::from_u128(n)
}

#[tokio::test]
async fn single_declarations_page_becomes_policy() {
    let pipeline = pipeline();
    let pages = vec![Page::new(
        1,
        "DECLARATIONS PAGE\nPolicy Number: AB-1234567\nNamed Insured: XYZ Manufacturing LLC\nPolicy Period: from 01/01 to 01/01\nPremium : $12,000\nEffective Date: 01/01\nExpiration Date: 01/01",
    )];

    let manifest = pipeline
        .analyze_document(doc(1), &pages, DocumentType::Unknown, None)
        .await
        .unwrap();

    let classification = &manifest.classifications[0];
    assert_eq!(classification.page_type, PageType::Declarations);
    assert!(classification.confidence >= 0.95);
    assert!(classification.should_process);

    let profile = manifest.document_profile.as_ref().unwrap();
    assert_eq!(profile.document_type, DocumentType::Policy);
    assert_eq!(profile.section_boundaries.len(), 1);
    let boundary = &profile.section_boundaries[0];
    assert_eq!(boundary.section_type, PageType::Declarations);
    assert_eq!((boundary.start_page, boundary.end_page), (1, 1));

    // Single-page document: the processing ratio is all or nothing.
    assert!(manifest.processing_ratio() == 1.0 || manifest.processing_ratio() == 0.0);
    assert_eq!(manifest.processing_ratio(), 1.0);

    let result = pipeline.chunk_document(doc(1), &pages, &manifest);
    assert_eq!(result.chunks.len(), 1);
    assert_eq!(
        result.chunks[0].metadata.effective_section_type,
        Some(SectionType::Declarations)
    );
}

#[tokio::test]
async fn acord_certificate_is_informational_only() {
    let pipeline = pipeline();
    let pages = vec![Page::new(
        1,
        "CERTIFICATE OF LIABILITY INSURANCE\nTHIS CERTIFICATE IS ISSUED AS A MATTER OF INFORMATION\nCertificate Holder: ACME Corp",
    )];

    let manifest = pipeline
        .analyze_document(doc(2), &pages, DocumentType::Unknown, None)
        .await
        .unwrap();

    let classification = &manifest.classifications[0];
    assert_eq!(classification.page_type, PageType::CertificateOfInsurance);
    assert_eq!(classification.confidence, 0.98);
    assert_eq!(
        classification.semantic_role,
        Some(SemanticRole::InformationalOnly)
    );
    assert!(!classification.should_process);
    assert!(classification.coverage_effects.is_empty());
    assert!(classification.exclusion_effects.is_empty());

    let profile = manifest.document_profile.as_ref().unwrap();
    assert!(profile.section_boundaries.iter().all(|b| !b.extractable));
    assert_eq!(manifest.processing_ratio(), 0.0);
}

#[tokio::test]
async fn endorsement_with_both_role_dual_emits() {
    let pipeline = pipeline();
    let pages = vec![Page::new(
        1,
        "This endorsement adds coverage for hired autos but excludes racing.",
    )];

    let manifest = pipeline
        .analyze_document(doc(3), &pages, DocumentType::PolicyBundle, None)
        .await
        .unwrap();

    let classification = &manifest.classifications[0];
    assert_eq!(classification.page_type, PageType::Endorsement);
    assert_eq!(classification.semantic_role, Some(SemanticRole::Both));

    let result = pipeline.chunk_document(doc(3), &pages, &manifest);
    assert_eq!(result.chunks.len(), 2);

    let (first, second) = (&result.chunks[0], &result.chunks[1]);
    assert_eq!(first.text, second.text);
    assert_ne!(
        first.metadata.stable_chunk_id,
        second.metadata.stable_chunk_id
    );
    let mut effectives: Vec<SectionType> = result
        .chunks
        .iter()
        .filter_map(|c| c.metadata.effective_section_type)
        .collect();
    effectives.sort();
    assert_eq!(effectives, vec![SectionType::Coverages, SectionType::Exclusions]);
    for chunk in &result.chunks {
        assert_eq!(chunk.metadata.semantic_role, Some(SemanticRole::Both));
        assert_eq!(
            chunk.metadata.subsection_type.as_deref(),
            Some("projected_from_endorsements")
        );
    }
}

#[tokio::test]
async fn multi_page_endorsement_tracks_continuation() {
    let pipeline = pipeline();
    let pages = vec![
        Page::new(
            1,
            "THIS ENDORSEMENT CHANGES THE POLICY. PLEASE READ IT CAREFULLY.\n## A. Broad Form Named Insured\n## B. Blanket Additional Insured\nCA T3 53 02 15",
        ),
        Page::new(
            2,
            "continuation of coverage terms under this form\n## C. Employee Hired Autos\nCA T3 53 02 15",
        ),
        Page::new(
            3,
            "further provisions for covered autos\n## D. Supplementary Payments\nCA T3 53 02 15",
        ),
        Page::new(
            4,
            "final provisions of this endorsement form\n## E. Other Insurance\nCA T3 53 02 15",
        ),
    ];

    let manifest = pipeline
        .analyze_document(doc(4), &pages, DocumentType::PolicyBundle, None)
        .await
        .unwrap();

    for classification in &manifest.classifications {
        assert_eq!(classification.page_type, PageType::Endorsement);
        assert!(classification.should_process);
    }
    for classification in &manifest.classifications[1..] {
        assert!(classification.is_continuation);
        assert_eq!(
            classification.parent_endorsement_id.as_deref(),
            Some("CA T3 53 02 15")
        );
        assert!(classification.confidence >= 0.95);
    }
    assert_eq!(manifest.classifications[1].endorsement_page_sequence, Some(2));
    assert_eq!(manifest.classifications[3].endorsement_page_sequence, Some(4));
}

#[tokio::test]
async fn repeated_pages_are_skipped_as_duplicates() {
    let pipeline = pipeline();
    let boilerplate =
        "COMMON POLICY CONDITIONS\nAll Coverage Parts\nIL 00 17 11 98\nCancellation terms apply";
    let pages: Vec<Page> = (1..=5).map(|n| Page::new(n, boilerplate)).collect();

    let manifest = pipeline
        .analyze_document(doc(5), &pages, DocumentType::Unknown, None)
        .await
        .unwrap();

    let duplicates: Vec<_> = manifest
        .classifications
        .iter()
        .filter(|c| c.page_type == PageType::Duplicate)
        .collect();
    assert_eq!(duplicates.len(), 4);
    for duplicate in &duplicates {
        assert_eq!(duplicate.duplicate_of, Some(1));
        assert!(!duplicate.should_process);
        assert_eq!(duplicate.confidence, 1.0);
    }
    assert_eq!(manifest.pages_skipped, vec![2, 3, 4, 5]);
}

#[tokio::test]
async fn manifest_is_persisted_and_retrievable() {
    let pipeline = pipeline();
    let pages = vec![
        Page::new(1, "DECLARATIONS PAGE\nPolicy Number: AB-1234567\nNamed Insured: XYZ LLC"),
        Page::new(2, "COVERAGES\n\nWe will pay for direct physical loss of covered property."),
    ];

    let manifest = pipeline
        .analyze_document(doc(6), &pages, DocumentType::Unknown, None)
        .await
        .unwrap();

    let stored = pipeline
        .repository()
        .get_manifest(doc(6))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total_pages, manifest.total_pages);
    assert_eq!(stored.page_section_map, manifest.page_section_map);

    let classifications = pipeline
        .repository()
        .get_classifications(doc(6))
        .await
        .unwrap();
    assert_eq!(classifications.len(), 2);
}

#[tokio::test]
async fn page_section_map_covers_every_page() {
    let pipeline = pipeline();
    let pages = vec![
        Page::new(1, "DECLARATIONS PAGE\nPolicy Number: AB-1234567\nNamed Insured: XYZ LLC"),
        Page::new(2, "COVERAGES\n\nWe will pay for direct physical loss of covered property."),
        Page::new(3, "EXCLUSIONS\n\nWe will not pay for loss caused by war or nuclear hazard."),
        Page::new(4, "x"),
    ];

    let manifest = pipeline
        .analyze_document(doc(7), &pages, DocumentType::Unknown, None)
        .await
        .unwrap();

    assert_eq!(manifest.page_section_map.len(), 4);
    for page in 1..=4u32 {
        assert!(manifest.page_section_map.contains_key(&page));
    }

    // Chunk ids are unique and deterministic across the document.
    let result = pipeline.chunk_document(doc(7), &pages, &manifest);
    let mut ids: Vec<&str> = result
        .chunks
        .iter()
        .map(|c| c.metadata.stable_chunk_id.as_str())
        .collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
    assert_eq!(
        result.total_tokens,
        result
            .chunks
            .iter()
            .map(|c| c.metadata.token_count)
            .sum::<usize>()
    );
}

#[tokio::test]
async fn quote_comparison_workflow_flips_policy_to_quote() {
    let pipeline = pipeline();
    let pages = vec![
        Page::new(1, "DECLARATIONS PAGE\nPolicy Number: AB-1234567\nNamed Insured: XYZ LLC"),
        Page::new(2, "COVERAGES\n\nWe will pay for direct physical loss of covered property."),
    ];

    let manifest = pipeline
        .analyze_document(doc(8), &pages, DocumentType::Unknown, Some("quote_comparison"))
        .await
        .unwrap();

    let profile = manifest.document_profile.as_ref().unwrap();
    assert_eq!(profile.document_type, DocumentType::Quote);
}
