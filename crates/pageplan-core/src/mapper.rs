//! Canonical conversions among the classification taxonomies.
//!
//! Single source of truth for `PageType` / `SectionType` / `SemanticSection`
//! conversions and for effective-type projection. Every function here is
//! total; unmapped inputs land on the `Unknown` variant of the target axis.

use crate::taxonomy::{DocumentType, PageType, SectionType, SemanticRole, SemanticSection};

/// Map a page type to its high-level semantic section.
pub fn page_to_semantic(page_type: PageType) -> SemanticSection {
    match page_type {
        PageType::Declarations => SemanticSection::Declarations,
        PageType::Coverages => SemanticSection::Coverages,
        PageType::Conditions => SemanticSection::Conditions,
        PageType::Exclusions => SemanticSection::Exclusions,
        PageType::Endorsement => SemanticSection::Endorsement,
        PageType::Sov => SemanticSection::Sov,
        PageType::LossRun => SemanticSection::LossRun,
        PageType::Definitions => SemanticSection::Definitions,
        PageType::Boilerplate => SemanticSection::Boilerplate,
        PageType::CertificateOfInsurance => SemanticSection::CertificateOfInsurance,
        PageType::LiabilityCoverages => SemanticSection::LiabilityCoverage,
        PageType::CoverageGrant
        | PageType::CoverageExtension
        | PageType::Limits
        | PageType::InsuredDefinition => SemanticSection::Coverages,
        PageType::VehicleDetails | PageType::InsuredDeclaredValue => SemanticSection::Declarations,
        PageType::TableOfContents => SemanticSection::TableOfContents,
        _ => SemanticSection::Unknown,
    }
}

/// Map a page type to the canonical chunking section type.
pub fn page_type_to_section_type(page_type: PageType) -> SectionType {
    match page_type {
        PageType::Declarations => SectionType::Declarations,
        PageType::Coverages => SectionType::Coverages,
        PageType::Conditions => SectionType::Conditions,
        PageType::Exclusions => SectionType::Exclusions,
        PageType::Endorsement => SectionType::Endorsements,
        PageType::Sov => SectionType::Sov,
        PageType::LossRun => SectionType::LossRun,
        PageType::Definitions => SectionType::Definitions,
        PageType::VehicleDetails => SectionType::VehicleDetails,
        PageType::InsuredDeclaredValue => SectionType::InsuredDeclaredValue,
        PageType::LiabilityCoverages => SectionType::LiabilityCoverages,
        PageType::Deductibles => SectionType::Deductibles,
        PageType::Premium => SectionType::Premium,
        PageType::CoveragesContext => SectionType::CoveragesContext,
        PageType::CoverageGrant => SectionType::CoverageGrant,
        PageType::CoverageExtension => SectionType::CoverageExtension,
        PageType::Limits => SectionType::Limits,
        PageType::InsuredDefinition => SectionType::InsuredDefinition,
        PageType::CertificateOfInsurance => SectionType::CertificateOfInsurance,
        // Invoice, boilerplate, duplicate, table of contents, and the
        // application/proposal page shapes have no chunking section.
        _ => SectionType::Unknown,
    }
}

/// Reverse mapping from section type to the canonical page type.
pub fn section_type_to_page_type(section_type: SectionType) -> PageType {
    match section_type {
        SectionType::Declarations => PageType::Declarations,
        SectionType::Coverages => PageType::Coverages,
        SectionType::Conditions => PageType::Conditions,
        SectionType::Exclusions => PageType::Exclusions,
        SectionType::Endorsements => PageType::Endorsement,
        SectionType::Sov => PageType::Sov,
        SectionType::LossRun => PageType::LossRun,
        SectionType::Definitions => PageType::Definitions,
        SectionType::VehicleDetails => PageType::VehicleDetails,
        SectionType::InsuredDeclaredValue => PageType::InsuredDeclaredValue,
        SectionType::LiabilityCoverages => PageType::LiabilityCoverages,
        SectionType::Deductibles => PageType::Deductibles,
        SectionType::Premium => PageType::Premium,
        SectionType::CoveragesContext => PageType::CoveragesContext,
        SectionType::CoverageGrant => PageType::CoverageGrant,
        SectionType::CoverageExtension => PageType::CoverageExtension,
        SectionType::Limits => PageType::Limits,
        SectionType::InsuredDefinition => PageType::InsuredDefinition,
        SectionType::CertificateOfInsurance => PageType::CertificateOfInsurance,
        SectionType::InsuringAgreement
        | SectionType::PremiumSummary
        | SectionType::FinancialStatement
        | SectionType::DriverInformation
        | SectionType::Unknown => PageType::Unknown,
    }
}

/// Normalize a free-form string (page type or section type value) to the
/// canonical section type. Tolerates a handful of aliases seen in manifests.
pub fn string_to_section_type(value: &str) -> SectionType {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "declarations" => SectionType::Declarations,
        "coverages" => SectionType::Coverages,
        "conditions" => SectionType::Conditions,
        "exclusions" => SectionType::Exclusions,
        "endorsement" | "endorsements" => SectionType::Endorsements,
        "sov" | "schedule_of_values" | "statement_of_values" => SectionType::Sov,
        "loss_run" => SectionType::LossRun,
        "definitions" => SectionType::Definitions,
        "insuring_agreement" => SectionType::InsuringAgreement,
        "premium_summary" => SectionType::PremiumSummary,
        "financial_statement" => SectionType::FinancialStatement,
        "vehicle_details" => SectionType::VehicleDetails,
        "insured_declared_value" => SectionType::InsuredDeclaredValue,
        "liability_coverages" => SectionType::LiabilityCoverages,
        "deductibles" => SectionType::Deductibles,
        "premium" => SectionType::Premium,
        "coverages_context" => SectionType::CoveragesContext,
        "coverage_grant" => SectionType::CoverageGrant,
        "coverage_extension" => SectionType::CoverageExtension,
        "limits" => SectionType::Limits,
        "insured_definition" => SectionType::InsuredDefinition,
        "driver_information" => SectionType::DriverInformation,
        "certificate_of_insurance" | "acord_certificate" => SectionType::CertificateOfInsurance,
        _ => SectionType::Unknown,
    }
}

/// Fold motor/financial granularity onto the core policy sections that have
/// extractors (e.g. `vehicle_details` rolls up to `coverages`).
pub fn normalize_to_core_section(section_type: SectionType) -> SectionType {
    match section_type {
        SectionType::VehicleDetails
        | SectionType::InsuredDeclaredValue
        | SectionType::LiabilityCoverages
        | SectionType::InsuringAgreement => SectionType::Coverages,
        SectionType::PremiumSummary | SectionType::FinancialStatement => {
            SectionType::Declarations
        }
        other => other,
    }
}

/// String-input variant of [`normalize_to_core_section`].
pub fn normalize_string_to_core_section(value: &str) -> SectionType {
    normalize_to_core_section(string_to_section_type(value))
}

/// Core product concept a section contributes to, when any.
pub fn product_concept(section_type: SectionType) -> Option<&'static str> {
    match section_type {
        SectionType::Declarations
        | SectionType::VehicleDetails
        | SectionType::InsuredDeclaredValue
        | SectionType::PremiumSummary
        | SectionType::FinancialStatement => Some("declarations"),
        SectionType::Coverages
        | SectionType::LiabilityCoverages
        | SectionType::InsuringAgreement
        | SectionType::CoveragesContext => Some("coverages"),
        SectionType::Conditions => Some("conditions"),
        SectionType::Exclusions => Some("exclusions"),
        SectionType::Endorsements => Some("endorsements"),
        SectionType::Definitions => Some("definitions"),
        SectionType::Sov => Some("sov"),
        SectionType::LossRun => Some("loss_run"),
        SectionType::Deductibles => Some("deductibles"),
        SectionType::Premium => Some("premium"),
        _ => None,
    }
}

/// Sorted, deduplicated product concepts for a set of section types.
pub fn product_concepts(section_types: &[SectionType]) -> Vec<String> {
    let mut concepts: Vec<String> = section_types
        .iter()
        .filter_map(|st| product_concept(*st))
        .map(String::from)
        .collect();
    concepts.sort();
    concepts.dedup();
    concepts
}

/// Document type a dominant page type implies (profile-builder fallback).
pub fn page_to_document_type(page_type: PageType) -> DocumentType {
    match page_type {
        PageType::Declarations
        | PageType::Coverages
        | PageType::Conditions
        | PageType::Exclusions
        | PageType::Definitions
        | PageType::CoveragesContext
        | PageType::CoverageGrant
        | PageType::CoverageExtension
        | PageType::Limits
        | PageType::InsuredDefinition
        | PageType::TableOfContents => DocumentType::Policy,
        PageType::Endorsement => DocumentType::Endorsement,
        PageType::Sov => DocumentType::Sov,
        PageType::LossRun => DocumentType::LossRun,
        PageType::Invoice => DocumentType::Invoice,
        PageType::AcordApplication => DocumentType::AcordApplication,
        PageType::Proposal => DocumentType::Proposal,
        PageType::CertificateOfInsurance => DocumentType::Certificate,
        _ => DocumentType::Unknown,
    }
}

/// Resolve a physical page type to its effective extraction type.
///
/// Certificates are never projected. Base policy sections and granular
/// coverage sections are authoritative. Endorsements project onto the
/// coverage/exclusion space according to their semantic role.
pub fn resolve_effective_section_type(
    page_type: PageType,
    semantic_role: Option<SemanticRole>,
) -> PageType {
    if page_type == PageType::CertificateOfInsurance {
        return PageType::CertificateOfInsurance;
    }

    match page_type {
        PageType::Coverages
        | PageType::Exclusions
        | PageType::Conditions
        | PageType::Definitions
        | PageType::Declarations
        | PageType::CoverageGrant
        | PageType::CoverageExtension
        | PageType::Limits
        | PageType::InsuredDefinition => return page_type,
        _ => {}
    }

    if page_type == PageType::Endorsement {
        match semantic_role {
            Some(SemanticRole::CoverageModifier) => return PageType::Coverages,
            Some(SemanticRole::ExclusionModifier) => return PageType::Exclusions,
            Some(SemanticRole::AdministrativeOnly) => return PageType::Endorsement,
            _ => {}
        }
    }

    page_type
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_page_to_semantic_is_total() {
        for pt in PageType::all() {
            // Must not panic and must land in the closed set.
            let _ = page_to_semantic(*pt);
        }
    }

    #[test]
    fn test_granular_coverage_types_fold_to_coverages() {
        assert_eq!(page_to_semantic(PageType::CoverageGrant), SemanticSection::Coverages);
        assert_eq!(page_to_semantic(PageType::Limits), SemanticSection::Coverages);
        assert_eq!(
            page_to_semantic(PageType::VehicleDetails),
            SemanticSection::Declarations
        );
    }

    #[test]
    fn test_string_to_section_type_aliases() {
        assert_eq!(string_to_section_type("endorsement"), SectionType::Endorsements);
        assert_eq!(string_to_section_type("ENDORSEMENTS"), SectionType::Endorsements);
        assert_eq!(string_to_section_type("schedule_of_values"), SectionType::Sov);
        assert_eq!(
            string_to_section_type("acord_certificate"),
            SectionType::CertificateOfInsurance
        );
        assert_eq!(string_to_section_type("garbage"), SectionType::Unknown);
    }

    #[test]
    fn test_normalize_to_core_section() {
        assert_eq!(
            normalize_to_core_section(SectionType::VehicleDetails),
            SectionType::Coverages
        );
        assert_eq!(
            normalize_to_core_section(SectionType::PremiumSummary),
            SectionType::Declarations
        );
        assert_eq!(
            normalize_to_core_section(SectionType::Exclusions),
            SectionType::Exclusions
        );
    }

    #[test]
    fn test_effective_type_projection() {
        assert_eq!(
            resolve_effective_section_type(
                PageType::Endorsement,
                Some(SemanticRole::CoverageModifier)
            ),
            PageType::Coverages
        );
        assert_eq!(
            resolve_effective_section_type(
                PageType::Endorsement,
                Some(SemanticRole::ExclusionModifier)
            ),
            PageType::Exclusions
        );
        assert_eq!(
            resolve_effective_section_type(
                PageType::Endorsement,
                Some(SemanticRole::AdministrativeOnly)
            ),
            PageType::Endorsement
        );
        // Authoritative sections ignore the role.
        assert_eq!(
            resolve_effective_section_type(
                PageType::Exclusions,
                Some(SemanticRole::CoverageModifier)
            ),
            PageType::Exclusions
        );
        // Certificates are never projected.
        assert_eq!(
            resolve_effective_section_type(
                PageType::CertificateOfInsurance,
                Some(SemanticRole::Both)
            ),
            PageType::CertificateOfInsurance
        );
    }

    #[test]
    fn test_product_concepts_sorted_unique() {
        let concepts = product_concepts(&[
            SectionType::Endorsements,
            SectionType::Coverages,
            SectionType::LiabilityCoverages,
            SectionType::Declarations,
        ]);
        assert_eq!(concepts, vec!["coverages", "declarations", "endorsements"]);
    }

    #[test]
    fn test_round_trip_through_page_type() {
        // Canonical section types round-trip back to their page type.
        for st in [
            SectionType::Declarations,
            SectionType::Coverages,
            SectionType::Exclusions,
            SectionType::Endorsements,
            SectionType::Sov,
        ] {
            let pt = section_type_to_page_type(st);
            assert_eq!(page_type_to_section_type(pt), st);
        }
    }

    proptest! {
        #[test]
        fn prop_section_type_strings_round_trip(index in 0..SectionType::all().len()) {
            let section = SectionType::all()[index];
            prop_assert_eq!(string_to_section_type(section.as_str()), section);
        }

        #[test]
        fn prop_string_to_section_type_is_total(value in "\\PC*") {
            // Arbitrary input lands in the closed set without panicking.
            let _ = string_to_section_type(&value);
        }

        #[test]
        fn prop_page_type_conversions_are_total(index in 0..PageType::all().len()) {
            let page_type = PageType::all()[index];
            let _ = page_to_semantic(page_type);
            let _ = page_to_document_type(page_type);
            let section = page_type_to_section_type(page_type);
            // Folding onto the core sections is idempotent.
            let core = normalize_to_core_section(section);
            prop_assert_eq!(normalize_to_core_section(core), core);
        }

        #[test]
        fn prop_certificates_never_project(role_index in 0..4usize) {
            let role = [
                SemanticRole::CoverageModifier,
                SemanticRole::ExclusionModifier,
                SemanticRole::Both,
                SemanticRole::AdministrativeOnly,
            ][role_index];
            prop_assert_eq!(
                resolve_effective_section_type(PageType::CertificateOfInsurance, Some(role)),
                PageType::CertificateOfInsurance
            );
        }
    }
}
