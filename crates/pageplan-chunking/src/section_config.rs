//! Per-section processing configuration.
//!
//! Build-time table covering every [`SectionType`]: chunk and token caps
//! for super-chunk assembly, extraction priority (lower runs earlier),
//! whether the section needs an LLM pass or is handled by table
//! extraction alone, and whether its content is contractual.

use pageplan_core::SectionType;

#[derive(Debug, Clone, Copy)]
pub struct SectionConfig {
    /// Maximum chunks per super-chunk.
    pub max_chunks: usize,
    /// Section-specific token cap; the global cap still applies.
    pub max_tokens: Option<usize>,
    pub priority: i32,
    pub requires_llm: bool,
    pub table_only: bool,
    pub is_non_contractual: bool,
}

const fn llm(max_chunks: usize, max_tokens: Option<usize>, priority: i32) -> SectionConfig {
    SectionConfig {
        max_chunks,
        max_tokens,
        priority,
        requires_llm: true,
        table_only: false,
        is_non_contractual: false,
    }
}

const fn table(max_chunks: usize, priority: i32) -> SectionConfig {
    SectionConfig {
        max_chunks,
        max_tokens: None,
        priority,
        requires_llm: false,
        table_only: true,
        is_non_contractual: false,
    }
}

/// Processing configuration for a section type. Total over the enum.
pub fn section_config(section_type: SectionType) -> SectionConfig {
    match section_type {
        // Declarations are short and information-dense; they extract first
        // and one chunk already carries the whole front matter.
        SectionType::Declarations => llm(1, Some(4000), 1),
        SectionType::Coverages => llm(10, None, 2),
        SectionType::CoverageGrant => llm(6, None, 3),
        SectionType::InsuringAgreement => llm(6, None, 3),
        SectionType::CoverageExtension => llm(6, None, 4),
        SectionType::Limits => llm(4, None, 5),
        SectionType::LiabilityCoverages => llm(6, None, 5),
        SectionType::InsuredDefinition => llm(4, None, 6),
        SectionType::Exclusions => llm(8, None, 7),
        SectionType::Conditions => llm(8, None, 8),
        SectionType::Definitions => llm(8, None, 9),
        SectionType::Endorsements => llm(10, None, 10),
        SectionType::Deductibles => llm(4, None, 11),
        SectionType::Premium => llm(4, None, 12),
        SectionType::PremiumSummary => llm(4, None, 12),
        SectionType::FinancialStatement => llm(4, None, 13),
        SectionType::InsuredDeclaredValue => llm(4, None, 14),
        // Symbol tables and schedules route to table extraction.
        SectionType::CoveragesContext => table(6, 15),
        SectionType::VehicleDetails => table(6, 16),
        SectionType::DriverInformation => table(6, 17),
        SectionType::Sov => table(8, 20),
        SectionType::LossRun => table(8, 21),
        SectionType::CertificateOfInsurance => SectionConfig {
            max_chunks: 4,
            max_tokens: None,
            priority: 30,
            requires_llm: false,
            table_only: false,
            is_non_contractual: true,
        },
        SectionType::Unknown => SectionConfig {
            max_chunks: 5,
            max_tokens: None,
            priority: 99,
            requires_llm: false,
            table_only: false,
            is_non_contractual: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_total() {
        for st in SectionType::all() {
            let config = section_config(*st);
            assert!(config.max_chunks > 0, "bad max_chunks for {st}");
        }
    }

    #[test]
    fn test_declarations_extract_first() {
        let config = section_config(SectionType::Declarations);
        assert_eq!(config.priority, 1);
        assert_eq!(config.max_chunks, 1);
        assert!(config.requires_llm);
        assert!(!config.table_only);
    }

    #[test]
    fn test_schedules_are_table_only() {
        for st in [SectionType::Sov, SectionType::LossRun, SectionType::VehicleDetails] {
            let config = section_config(st);
            assert!(config.table_only, "{st} should be table only");
            assert!(!config.requires_llm);
        }
    }

    #[test]
    fn test_non_contractual_sections() {
        assert!(section_config(SectionType::Unknown).is_non_contractual);
        assert!(section_config(SectionType::CertificateOfInsurance).is_non_contractual);
        assert!(!section_config(SectionType::Coverages).is_non_contractual);
    }
}
