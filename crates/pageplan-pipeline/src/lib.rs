//! # Pageplan Pipeline
//!
//! Facade sequencing the document analysis pipeline, and the repository
//! port it persists through.
//!
//! The flow per document: extract signals, flag duplicates, classify pages
//! with continuation tracking, aggregate the document profile, persist the
//! manifest, then plan hybrid chunks. Documents are independent; all state
//! that must not leak across documents (duplicate registry, endorsement
//! tracker, chunk stream) is scoped inside a single call.
//!
//! ## Key Types
//!
//! - [`PageAnalysisPipeline`] - The facade
//! - [`PageAnalysisRepository`] - Async persistence port
//! - [`MemoryRepository`] - In-memory port for tests and embedded use

pub mod error;
pub mod facade;
pub mod repository;

pub use error::{PipelineError, PipelineResult, RepositoryError};
pub use facade::PageAnalysisPipeline;
pub use repository::{MemoryRepository, PageAnalysisRepository};
