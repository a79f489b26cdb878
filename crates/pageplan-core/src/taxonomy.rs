//! Closed classification taxonomies.
//!
//! Every enum here is a closed set with a stable snake_case wire string.
//! Conversions between the axes live in [`crate::mapper`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visual/role classification of a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    Declarations,
    Coverages,
    Conditions,
    Exclusions,
    Endorsement,
    Sov,
    LossRun,
    Invoice,
    Boilerplate,
    Duplicate,
    Definitions,
    TableOfContents,
    VehicleDetails,
    InsuredDeclaredValue,
    LiabilityCoverages,
    Deductibles,
    Premium,
    CoveragesContext,
    CoverageGrant,
    CoverageExtension,
    Limits,
    InsuredDefinition,
    AcordApplication,
    Proposal,
    CertificateOfInsurance,
    Unknown,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Declarations => "declarations",
            PageType::Coverages => "coverages",
            PageType::Conditions => "conditions",
            PageType::Exclusions => "exclusions",
            PageType::Endorsement => "endorsement",
            PageType::Sov => "sov",
            PageType::LossRun => "loss_run",
            PageType::Invoice => "invoice",
            PageType::Boilerplate => "boilerplate",
            PageType::Duplicate => "duplicate",
            PageType::Definitions => "definitions",
            PageType::TableOfContents => "table_of_contents",
            PageType::VehicleDetails => "vehicle_details",
            PageType::InsuredDeclaredValue => "insured_declared_value",
            PageType::LiabilityCoverages => "liability_coverages",
            PageType::Deductibles => "deductibles",
            PageType::Premium => "premium",
            PageType::CoveragesContext => "coverages_context",
            PageType::CoverageGrant => "coverage_grant",
            PageType::CoverageExtension => "coverage_extension",
            PageType::Limits => "limits",
            PageType::InsuredDefinition => "insured_definition",
            PageType::AcordApplication => "acord_application",
            PageType::Proposal => "proposal",
            PageType::CertificateOfInsurance => "certificate_of_insurance",
            PageType::Unknown => "unknown",
        }
    }

    /// All variants in declaration order.
    pub fn all() -> &'static [PageType] {
        &[
            PageType::Declarations,
            PageType::Coverages,
            PageType::Conditions,
            PageType::Exclusions,
            PageType::Endorsement,
            PageType::Sov,
            PageType::LossRun,
            PageType::Invoice,
            PageType::Boilerplate,
            PageType::Duplicate,
            PageType::Definitions,
            PageType::TableOfContents,
            PageType::VehicleDetails,
            PageType::InsuredDeclaredValue,
            PageType::LiabilityCoverages,
            PageType::Deductibles,
            PageType::Premium,
            PageType::CoveragesContext,
            PageType::CoverageGrant,
            PageType::CoverageExtension,
            PageType::Limits,
            PageType::InsuredDefinition,
            PageType::AcordApplication,
            PageType::Proposal,
            PageType::CertificateOfInsurance,
            PageType::Unknown,
        ]
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageType::all()
            .iter()
            .find(|pt| pt.as_str() == s)
            .copied()
            .ok_or(())
    }
}

/// Canonical chunking/routing taxonomy.
///
/// Superset of the core ISO policy sections plus granular motor and
/// financial variants folded onto the cores by the mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Declarations,
    Coverages,
    Conditions,
    Exclusions,
    Endorsements,
    Sov,
    LossRun,
    Definitions,
    InsuringAgreement,
    PremiumSummary,
    FinancialStatement,
    VehicleDetails,
    InsuredDeclaredValue,
    LiabilityCoverages,
    Deductibles,
    Premium,
    CoveragesContext,
    CoverageGrant,
    CoverageExtension,
    Limits,
    InsuredDefinition,
    DriverInformation,
    CertificateOfInsurance,
    Unknown,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Declarations => "declarations",
            SectionType::Coverages => "coverages",
            SectionType::Conditions => "conditions",
            SectionType::Exclusions => "exclusions",
            SectionType::Endorsements => "endorsements",
            SectionType::Sov => "sov",
            SectionType::LossRun => "loss_run",
            SectionType::Definitions => "definitions",
            SectionType::InsuringAgreement => "insuring_agreement",
            SectionType::PremiumSummary => "premium_summary",
            SectionType::FinancialStatement => "financial_statement",
            SectionType::VehicleDetails => "vehicle_details",
            SectionType::InsuredDeclaredValue => "insured_declared_value",
            SectionType::LiabilityCoverages => "liability_coverages",
            SectionType::Deductibles => "deductibles",
            SectionType::Premium => "premium",
            SectionType::CoveragesContext => "coverages_context",
            SectionType::CoverageGrant => "coverage_grant",
            SectionType::CoverageExtension => "coverage_extension",
            SectionType::Limits => "limits",
            SectionType::InsuredDefinition => "insured_definition",
            SectionType::DriverInformation => "driver_information",
            SectionType::CertificateOfInsurance => "certificate_of_insurance",
            SectionType::Unknown => "unknown",
        }
    }

    pub fn all() -> &'static [SectionType] {
        &[
            SectionType::Declarations,
            SectionType::Coverages,
            SectionType::Conditions,
            SectionType::Exclusions,
            SectionType::Endorsements,
            SectionType::Sov,
            SectionType::LossRun,
            SectionType::Definitions,
            SectionType::InsuringAgreement,
            SectionType::PremiumSummary,
            SectionType::FinancialStatement,
            SectionType::VehicleDetails,
            SectionType::InsuredDeclaredValue,
            SectionType::LiabilityCoverages,
            SectionType::Deductibles,
            SectionType::Premium,
            SectionType::CoveragesContext,
            SectionType::CoverageGrant,
            SectionType::CoverageExtension,
            SectionType::Limits,
            SectionType::InsuredDefinition,
            SectionType::DriverInformation,
            SectionType::CertificateOfInsurance,
            SectionType::Unknown,
        ]
    }

    /// Human-readable display name, e.g. "Loss Run".
    pub fn display_name(&self) -> String {
        self.as_str()
            .split('_')
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionType::all()
            .iter()
            .find(|st| st.as_str() == s)
            .copied()
            .ok_or(())
    }
}

/// High-level semantic section concept, distinct from the visual page type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticSection {
    CertificateOfInsurance,
    Declarations,
    Coverages,
    #[serde(rename = "liability.coverage")]
    LiabilityCoverage,
    #[serde(rename = "liability.exclusions")]
    LiabilityExclusions,
    #[serde(rename = "physical_damage.coverage")]
    PhysicalDamageCoverage,
    #[serde(rename = "physical_damage.exclusions")]
    PhysicalDamageExclusions,
    MultiCoverage,
    Conditions,
    Definitions,
    Endorsement,
    Exclusions,
    Certificate,
    Boilerplate,
    Sov,
    LossRun,
    #[serde(rename = "toc")]
    TableOfContents,
    Unknown,
}

impl SemanticSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticSection::CertificateOfInsurance => "certificate_of_insurance",
            SemanticSection::Declarations => "declarations",
            SemanticSection::Coverages => "coverages",
            SemanticSection::LiabilityCoverage => "liability.coverage",
            SemanticSection::LiabilityExclusions => "liability.exclusions",
            SemanticSection::PhysicalDamageCoverage => "physical_damage.coverage",
            SemanticSection::PhysicalDamageExclusions => "physical_damage.exclusions",
            SemanticSection::MultiCoverage => "multi_coverage",
            SemanticSection::Conditions => "conditions",
            SemanticSection::Definitions => "definitions",
            SemanticSection::Endorsement => "endorsement",
            SemanticSection::Exclusions => "exclusions",
            SemanticSection::Certificate => "certificate",
            SemanticSection::Boilerplate => "boilerplate",
            SemanticSection::Sov => "sov",
            SemanticSection::LossRun => "loss_run",
            SemanticSection::TableOfContents => "toc",
            SemanticSection::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SemanticSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document-level classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Policy,
    PolicyBundle,
    Sov,
    LossRun,
    Endorsement,
    Quote,
    Submission,
    AcordApplication,
    Proposal,
    Invoice,
    Certificate,
    Correspondence,
    Financial,
    Audit,
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Policy => "policy",
            DocumentType::PolicyBundle => "policy_bundle",
            DocumentType::Sov => "sov",
            DocumentType::LossRun => "loss_run",
            DocumentType::Endorsement => "endorsement",
            DocumentType::Quote => "quote",
            DocumentType::Submission => "submission",
            DocumentType::AcordApplication => "acord_application",
            DocumentType::Proposal => "proposal",
            DocumentType::Invoice => "invoice",
            DocumentType::Certificate => "certificate",
            DocumentType::Correspondence => "correspondence",
            DocumentType::Financial => "financial",
            DocumentType::Audit => "audit",
            DocumentType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effect role of an endorsement-shaped fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticRole {
    CoverageModifier,
    ExclusionModifier,
    Both,
    AdministrativeOnly,
    InformationalOnly,
    CoverageGrant,
    CoverageExtension,
    Limits,
    InsuredDefinition,
    Definitions,
    Unknown,
}

impl SemanticRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticRole::CoverageModifier => "coverage_modifier",
            SemanticRole::ExclusionModifier => "exclusion_modifier",
            SemanticRole::Both => "both",
            SemanticRole::AdministrativeOnly => "administrative_only",
            SemanticRole::InformationalOnly => "informational_only",
            SemanticRole::CoverageGrant => "coverage_grant",
            SemanticRole::CoverageExtension => "coverage_extension",
            SemanticRole::Limits => "limits",
            SemanticRole::InsuredDefinition => "insured_definition",
            SemanticRole::Definitions => "definitions",
            SemanticRole::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SemanticRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Specific semantic effect on coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageEffect {
    AddsCoverage,
    ExpandsCoverage,
    LimitsCoverage,
    RestoresCoverage,
}

impl CoverageEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageEffect::AddsCoverage => "adds_coverage",
            CoverageEffect::ExpandsCoverage => "expands_coverage",
            CoverageEffect::LimitsCoverage => "limits_coverage",
            CoverageEffect::RestoresCoverage => "restores_coverage",
        }
    }
}

/// Specific semantic effect on exclusions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionEffect {
    IntroducesExclusion,
    NarrowsExclusion,
    RemovesExclusion,
}

impl ExclusionEffect {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionEffect::IntroducesExclusion => "introduces_exclusion",
            ExclusionEffect::NarrowsExclusion => "narrows_exclusion",
            ExclusionEffect::RemovesExclusion => "removes_exclusion",
        }
    }
}

/// Content shape of a hybrid chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkRole {
    Text,
    Table,
    Mixed,
}

impl ChunkRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkRole::Text => "text",
            ChunkRole::Table => "table",
            ChunkRole::Mixed => "mixed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_type_round_trip() {
        for pt in PageType::all() {
            assert_eq!(pt.as_str().parse::<PageType>().unwrap(), *pt);
        }
    }

    #[test]
    fn test_section_type_round_trip() {
        for st in SectionType::all() {
            assert_eq!(st.as_str().parse::<SectionType>().unwrap(), *st);
        }
    }

    #[test]
    fn test_semantic_section_wire_names() {
        assert_eq!(SemanticSection::LiabilityCoverage.as_str(), "liability.coverage");
        assert_eq!(SemanticSection::TableOfContents.as_str(), "toc");
        let json = serde_json::to_string(&SemanticSection::PhysicalDamageExclusions).unwrap();
        assert_eq!(json, "\"physical_damage.exclusions\"");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(SectionType::LossRun.display_name(), "Loss Run");
        assert_eq!(
            SectionType::CoveragesContext.display_name(),
            "Coverages Context"
        );
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&PageType::CertificateOfInsurance).unwrap();
        assert_eq!(json, "\"certificate_of_insurance\"");
        let back: PageType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PageType::CertificateOfInsurance);
    }
}
