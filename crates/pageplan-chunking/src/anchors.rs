//! Section anchor patterns for content-based section detection.
//!
//! Anchors are header-shaped lines checked against the first few lines of
//! a paragraph or page. They are deliberately narrower than the
//! classifier's keyword tables: a body sentence mentioning "exclusions"
//! must not flip the chunker's section state.

use once_cell::sync::Lazy;
use pageplan_core::SectionType;
use regex::{Regex, RegexBuilder};

fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid static pattern {pattern:?}: {e}"))
}

static SECTION_ANCHOR_SOURCES: &[(SectionType, &[&str])] = &[
    (
        SectionType::Declarations,
        &[
            r"^\s*DECLARATIONS?\s*$",
            r"^\s*POLICY\s+DECLARATIONS?\s*$",
            r"^\s*COMMON\s+POLICY\s+DECLARATIONS?\s*$",
        ],
    ),
    (
        SectionType::Coverages,
        &[
            r"^\s*COVERAGES?\s*$",
            r"^\s*COVERAGE\s+FORM\s*$",
            r"^\s*COVERAGE\s+[A-Z]\s*[-:]",
            r"^\s*PROPERTY\s+COVERAGE\s*$",
            r"^\s*LIABILITY\s+COVERAGE\s*$",
        ],
    ),
    (
        SectionType::CoverageGrant,
        &[
            r"^\s*SECTION\s+II\s*[-–]\s*COVERED\s+AUTOS\s+LIABILITY\s+COVERAGE\s*$",
            r"^\s*PHYSICAL\s+DAMAGE\s+COVERAGE\s*$",
            r"^\s*SECTION\s+III\s*[-–]\s*PHYSICAL\s+DAMAGE\s+COVERAGE\s*$",
            r"^\s*WE\s+WILL\s+PAY\s*$",
            r"^\s*WE\s+WILL\s+ALSO\s+PAY\s*$",
        ],
    ),
    (
        SectionType::CoverageExtension,
        &[
            r"^\s*SUPPLEMENTARY\s+PAYMENTS\s*$",
            r"^\s*OUT-OF-STATE\s+COVERAGE\s+EXTENSIONS\s*$",
            r"^\s*TRANSPORTATION\s+EXPENSES\s*$",
            r"^\s*LOSS\s+OF\s+USE\s+EXPENSES\s*$",
            r"^\s*COVERAGE\s+EXTENSIONS\s*$",
        ],
    ),
    (
        SectionType::Limits,
        &[
            r"^\s*LIMIT\s+OF\s+INSURANCE\s*$",
            r"^\s*LIMITS\s+AND\s+DEDUCTIBLES\s*$",
        ],
    ),
    (
        SectionType::Conditions,
        &[
            r"^\s*CONDITIONS?\s*$",
            r"^\s*GENERAL\s+CONDITIONS?\s*$",
            r"^\s*POLICY\s+CONDITIONS?\s*$",
            r"^\s*COMMERCIAL\s+PROPERTY\s+CONDITIONS?\s*$",
        ],
    ),
    (
        SectionType::Exclusions,
        &[
            r"^\s*EXCLUSIONS?\s*$",
            r"^\s*GENERAL\s+EXCLUSIONS?\s*$",
            r"^\s*WHAT\s+IS\s+NOT\s+COVERED\s*$",
        ],
    ),
    (
        SectionType::Endorsements,
        &[
            r"^\s*ENDORSEMENTS?\s*$",
            r"^\s*ENDORSEMENT\s+NO\.?\s*\d*",
            r"^\s*POLICY\s+ENDORSEMENTS?\s*$",
            r"^\s*FORMS?\s+AND\s+ENDORSEMENTS?\s*$",
        ],
    ),
    (
        SectionType::Definitions,
        &[
            r"^\s*DEFINITIONS?\s*$",
            r"^\s*SECTION\s+[IVX]+[\.\:]\s*DEFINITIONS?\s*$",
        ],
    ),
    (
        SectionType::InsuredDefinition,
        &[r"^\s*WHO\s+IS\s+AN\s+INSURED\s*$"],
    ),
    (
        SectionType::Sov,
        &[
            r"^\s*SCHEDULE\s+OF\s+VALUES?\s*$",
            r"^\s*SOV\s*$",
            r"^\s*PROPERTY\s+SCHEDULE\s*$",
            r"^\s*LOCATION\s+SCHEDULE\s*$",
        ],
    ),
    (
        SectionType::LossRun,
        &[
            r"^\s*LOSS\s+RUN\s*$",
            r"^\s*LOSS\s+HISTORY\s*$",
            r"^\s*LOSS\s+EXPERIENCE\s*$",
            r"^\s*CLAIMS?\s+HISTORY\s*$",
        ],
    ),
    (
        SectionType::InsuringAgreement,
        &[r"^\s*INSURING\s+AGREEMENT\s*$", r"^\s*AGREEMENT\s*$"],
    ),
    (
        SectionType::PremiumSummary,
        &[
            r"^\s*PREMIUM\s+SUMMARY\s*$",
            r"^\s*PREMIUM\s+SCHEDULE\s*$",
            r"^\s*PREMIUM\s+BREAKDOWN\s*$",
        ],
    ),
    (
        SectionType::FinancialStatement,
        &[
            r"^\s*FINANCIAL\s+STATEMENT\s*$",
            r"^\s*FINANCIAL\s+INFORMATION\s*$",
        ],
    ),
    (
        SectionType::VehicleDetails,
        &[
            r"^\s*VEHICLE\s+DETAILS?\s*$",
            r"^\s*VEHICLE\s+SCHEDULE\s*$",
            r"^\s*COVERED\s+AUTOS?\s*$",
            r"^\s*SCHEDULE\s+OF\s+COVERED\s+AUTOS?\s*$",
        ],
    ),
    (
        SectionType::InsuredDeclaredValue,
        &[r"^\s*INSURED(?:'\s*S)?\s+DECLARED\s+VALUE\s*$", r"^\s*IDV\s*$"],
    ),
    (
        SectionType::LiabilityCoverages,
        &[r"^\s*LIABILITY\s+COVERAGES?\s*$", r"^\s*LIABILITY\s+LIMITS?\s*$"],
    ),
    (
        SectionType::DriverInformation,
        &[
            r"^\s*DRIVER(?:S|\s+INFORMATION)?\s*$",
            r"^\s*SCHEDULE\s+OF\s+DRIVERS?\s*$",
        ],
    ),
];

/// Compiled anchor tables in declaration order.
pub static SECTION_ANCHORS: Lazy<Vec<(SectionType, Vec<Regex>)>> = Lazy::new(|| {
    SECTION_ANCHOR_SOURCES
        .iter()
        .map(|(st, sources)| (*st, sources.iter().map(|p| compile(p)).collect()))
        .collect()
});

static MARKDOWN_HEADER_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#+\s*").expect("static pattern"));

/// Detect a section type from the first few lines of `text`, tolerating
/// markdown heading markers. Returns [`SectionType::Unknown`] when nothing
/// anchors.
pub fn detect_section_type(text: &str) -> SectionType {
    if text.is_empty() {
        return SectionType::Unknown;
    }

    for line in text.lines().take(3) {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.len() > 200 {
            continue;
        }
        let clean = MARKDOWN_HEADER_PREFIX.replace(stripped, "");

        for (section_type, anchor_table) in SECTION_ANCHORS.iter() {
            for pattern in anchor_table {
                if pattern.is_match(stripped) || pattern.is_match(&clean) {
                    return *section_type;
                }
            }
        }
    }

    SectionType::Unknown
}
