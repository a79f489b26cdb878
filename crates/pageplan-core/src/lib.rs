//! # Pageplan Core
//!
//! Core types for the pageplan document analysis engine.
//!
//! This crate provides:
//! - Closed taxonomies for page, section, and document classification
//! - Entity types flowing through the pipeline (signals, classifications,
//!   boundaries, profiles, manifests)
//! - The canonical section type mapper
//! - Engine configuration and the shared error type
//!
//! ## Key Types
//!
//! - [`PageType`] - Visual/role classification of a single page
//! - [`SectionType`] - Canonical chunking and extraction-routing taxonomy
//! - [`PageSignals`] - Immutable per-page signal record
//! - [`DocumentProfile`] - Aggregated document-level profile
//! - [`DocumentId`] - 128-bit document identifier

pub mod config;
pub mod error;
pub mod id;
pub mod mapper;
pub mod model;
pub mod page;
pub mod taxonomy;

pub use config::EngineConfig;
pub use error::{CoreError, CoreResult};
pub use id::DocumentId;
pub use model::{
    DocumentProfile, PageClassification, PageManifest, PageSignals, SectionBoundary, SectionSpan,
    TextSpan,
};
pub use page::{Page, PageMetadata, StructureType};
pub use taxonomy::{
    ChunkRole, CoverageEffect, DocumentType, ExclusionEffect, PageType, SectionType, SemanticRole,
    SemanticSection,
};
