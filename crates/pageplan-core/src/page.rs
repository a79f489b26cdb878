//! External page input delivered by the extraction layer.

use serde::{Deserialize, Serialize};

/// Structural shape of a page as reported by the extraction layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    Standard,
    TextHeavy,
    TableHeavy,
}

/// Optional structural metadata accompanying a page's markdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_tables: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_block_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_block_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_levels: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure_type: Option<StructureType>,
    /// Section hint emitted by upstream OCR, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
}

/// One page of extracted markdown, 1-indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub page_number: u32,
    pub markdown: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PageMetadata>,
}

impl Page {
    pub fn new(page_number: u32, markdown: impl Into<String>) -> Self {
        Self {
            page_number,
            markdown: markdown.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: PageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn has_tables(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.has_tables)
            .unwrap_or(false)
    }

    pub fn table_count(&self) -> u32 {
        self.metadata
            .as_ref()
            .and_then(|m| m.table_count)
            .unwrap_or(0)
    }
}
