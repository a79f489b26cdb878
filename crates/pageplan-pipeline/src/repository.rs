//! Repository port for persisted analysis state.
//!
//! The core treats persistence as an opaque key-value view: signals and
//! classifications keyed by `(document_id, page_number)`, one manifest per
//! document. All writes are idempotent upserts so a cancelled document can
//! be retried from scratch. A single writer per document is assumed.

use crate::error::RepositoryError;
use async_trait::async_trait;
use pageplan_core::{DocumentId, PageClassification, PageManifest, PageSignals};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[async_trait]
pub trait PageAnalysisRepository: Send + Sync {
    async fn save_page_signals(
        &self,
        document_id: DocumentId,
        signals: &PageSignals,
    ) -> Result<(), RepositoryError>;

    async fn save_page_classification(
        &self,
        document_id: DocumentId,
        classification: &PageClassification,
    ) -> Result<(), RepositoryError>;

    /// Upsert the document's manifest, keyed by `document_id`.
    async fn save_manifest(&self, manifest: &PageManifest) -> Result<(), RepositoryError>;

    async fn get_manifest(
        &self,
        document_id: DocumentId,
    ) -> Result<Option<PageManifest>, RepositoryError>;

    async fn get_classifications(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<PageClassification>, RepositoryError>;

    async fn get_page_signals(
        &self,
        document_id: DocumentId,
        page_number: u32,
    ) -> Result<Option<PageSignals>, RepositoryError>;
}

/// In-memory repository used in tests and embedded runs.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    signals: RwLock<BTreeMap<(DocumentId, u32), PageSignals>>,
    classifications: RwLock<BTreeMap<(DocumentId, u32), PageClassification>>,
    manifests: RwLock<BTreeMap<DocumentId, PageManifest>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PageAnalysisRepository for MemoryRepository {
    async fn save_page_signals(
        &self,
        document_id: DocumentId,
        signals: &PageSignals,
    ) -> Result<(), RepositoryError> {
        self.signals
            .write()
            .await
            .insert((document_id, signals.page_number), signals.clone());
        Ok(())
    }

    async fn save_page_classification(
        &self,
        document_id: DocumentId,
        classification: &PageClassification,
    ) -> Result<(), RepositoryError> {
        self.classifications
            .write()
            .await
            .insert((document_id, classification.page_number), classification.clone());
        Ok(())
    }

    async fn save_manifest(&self, manifest: &PageManifest) -> Result<(), RepositoryError> {
        self.manifests
            .write()
            .await
            .insert(manifest.document_id, manifest.clone());
        Ok(())
    }

    async fn get_manifest(
        &self,
        document_id: DocumentId,
    ) -> Result<Option<PageManifest>, RepositoryError> {
        Ok(self.manifests.read().await.get(&document_id).cloned())
    }

    async fn get_classifications(
        &self,
        document_id: DocumentId,
    ) -> Result<Vec<PageClassification>, RepositoryError> {
        Ok(self
            .classifications
            .read()
            .await
            .range((document_id, 0)..=(document_id, u32::MAX))
            .map(|(_, c)| c.clone())
            .collect())
    }

    async fn get_page_signals(
        &self,
        document_id: DocumentId,
        page_number: u32,
    ) -> Result<Option<PageSignals>, RepositoryError> {
        Ok(self
            .signals
            .read()
            .await
            .get(&(document_id, page_number))
            .cloned())
    }
}
