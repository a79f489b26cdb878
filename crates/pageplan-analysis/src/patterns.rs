//! Compiled regex assets, one table per classification axis.
//!
//! All tables are compiled once at first use and shared read-only across
//! documents. Pattern order inside a table matters only where a table is
//! scanned first-hit-wins (policy numbers, continuation text, triggers);
//! scoring tables count every matching pattern.

use once_cell::sync::Lazy;
use pageplan_core::{CoverageEffect, DocumentType, ExclusionEffect, PageType, SemanticRole};
use regex::{Regex, RegexBuilder};

fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid static pattern {pattern:?}: {e}"))
}

fn compile_multiline(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid static pattern {pattern:?}: {e}"))
}

fn compile_all(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| compile(p)).collect()
}

/// Keyword patterns per page type, ranked by specificity.
static SECTION_PATTERN_SOURCES: &[(PageType, &[&str])] = &[
    (
        PageType::Declarations,
        &[
            r"declarations?\s+page",
            r"^#?\s*DECLARATIONS?",
            r"policy\s+declarations?",
            r"common\s+policy\s+declarations?",
            r"policy\s+number\s*[:\-]",
            r"policy\s+number\s*[:\-]?\s*[A-Z0-9\-]+",
            r"named\s+insured\s*[:\-]",
            r"named\s+insured\s+and\s+mailing\s+address",
            r"policy\s+period\s*[:\-]",
            r"policy\s+period\s*:\s*from",
            r"effective\s+date\s*[:\-]",
            r"expiration\s+date\s*[:\-]",
            r"premium\s+[:\-]?\s*\$",
            r"term\s+premium\s*[:\-]?\s*\$",
            r"total\s+[:\-]?\s*\$",
            r"insured\s+name\s*[:\-]",
            r"mailing\s+address\s*[:\-]",
            r"producer\s+and\s+mailing\s+address",
            r"forms?\s+and\s+endorsements?\s+schedule",
            r"coverage\s+summary",
            r"schedule\s+of\s+forms",
            r"limits\s+of\s+liability",
            r"commercial\s+property\s+insurance\s+policy",
            r"insurance\s+policy\s+jacket",
            r"policy\s+schedule",
        ],
    ),
    (
        PageType::CertificateOfInsurance,
        &[
            r"certificate\s+of\s+insurance",
            r"evidence\s+of\s+property\s+insurance",
            r"certificate\s+holder",
            r"this\s+certificate\s+is\s+issued\s+as\s+a\s+matter\s+of\s+information",
            r"acord\s+25",
            r"acord\s+24",
        ],
    ),
    (
        PageType::Coverages,
        &[
            r"^#?\s*COVERAGES?",
            r"coverages?",
            r"coverage\s+form",
            r"coverage\s+part",
            r"coverage[s]?\s+[A-Z]\s*[-:]",
            r"insuring\s+agreement",
            r"covered\s+property",
            r"covered\s+causes?\s+of\s+loss",
            r"property\s+coverage",
            r"liability\s+coverage",
            r"special\s+coverage",
            r"blanket\s+coverage",
            r"building\s+coverage",
            r"business\s+personal\s+property",
            r"business\s+income",
            r"extra\s+expense",
            r"SECTION\s+[IVX]+\s*[-–—]\s*.*COVERAGES?",
        ],
    ),
    (
        PageType::CoverageGrant,
        &[
            r"SECTION\s+II\s*[-–—]\s*COVERED\s+AUTOS\s+LIABILITY\s+COVERAGE",
            r"SECTION\s+III\s*[-–—]\s*PHYSICAL\s+DAMAGE\s+COVERAGE",
            r"we\s+will\s+pay\s+all\s+sums",
            r"we\s+will\s+pay\s+for\s+loss\s+to",
            r"we\s+will\s+pay",
            r"we\s+will\s+also\s+pay",
        ],
    ),
    (
        PageType::CoverageExtension,
        &[
            r"coverage\s+extensions?",
            r"additional\s+coverage[s]?",
            r"optional\s+coverage[s]?",
            r"newly\s+acquired\s+autos",
            r"supplementary\s+payments",
            r"out-of-state\s+coverage\s+extensions",
            r"transportation\s+expenses",
            r"loss\s+of\s+use\s+expenses",
        ],
    ),
    (
        PageType::Limits,
        &[
            r"LIMIT\s+OF\s+INSURANCE",
            r"the\s+most\s+we\s+will\s+pay",
            r"regardless\s+of\s+the\s+number\s+of",
            r"limits?\s+and\s+deductibles?",
            r"limits?\s+of\s+insurance",
            r"we\s+will\s+pay\s+up\s+to",
        ],
    ),
    (
        PageType::InsuredDefinition,
        &[
            r"WHO\s+IS\s+AN\s+INSURED",
            r"the\s+following\s+are\s+insureds?",
        ],
    ),
    (
        PageType::Conditions,
        &[
            r"^#?\s*CONDITIONS?",
            r"SECTION\s+[IVX]+\s*[-–—]\s*CONDITIONS?",
            r"GENERAL\s+CONDITIONS",
            r"COMMON\s+POLICY\s+CONDITIONS",
            r"LOSS\s+CONDITIONS",
            r"conditions?\s+$",
            r"policy\s+conditions?",
            r"commercial\s+property\s+conditions?",
            r"general\s+conditions?",
            r"loss\s+conditions?",
            r"additional\s+conditions?",
            r"duties\s+in\s+the\s+event",
            r"your\s+duties",
            r"our\s+duties",
            r"transfer\s+of\s+rights",
            r"subrogation",
            r"other\s+insurance",
            r"appraisal",
            r"suit\s+against\s+us",
            r"cancellation",
            r"liberalization",
            r"mortgageholders?",
            r"loss\s+payment",
            r"recovered\s+property",
        ],
    ),
    (
        PageType::Exclusions,
        &[
            r"^#?\s*EXCLUSIONS?",
            r"SECTION\s+[IVX]+\s*[-–—]\s*EXCLUSIONS?",
            r"GENERAL\s+EXCLUSIONS",
            r"WHAT\s+IS\s+NOT\s+COVERED",
            r"EXCLUDED\s+CAUSES\s+OF\s+LOSS",
            r"exclusions?",
            r"general\s+exclusions?",
            r"property\s+not\s+covered",
            r"what\s+is\s+not\s+covered",
            r"we\s+(do\s+not|will\s+not)\s+cover",
            r"we\s+(do\s+not|will\s+not)\s+pay",
            r"this\s+insurance\s+does\s+not\s+apply",
            r#"we\s+will\s+not\s+pay\s+for\s+["']?loss["']?"#,
            r"expected\s+or\s+intended\s+injury",
            r"contractual\b",
            r"workers['\s]compensation",
            r"employee\s+indemnification",
            r"fellow\s+employee",
            r"care\s*,\s*custody\s+or\s+control",
            r"handling\s+of\s+property",
            r"mechanical\s+device",
            r"pollution\b",
            r"war\b",
            r"racing\b",
            r"nuclear\s+hazard",
            r"this\s+policy\s+does\s+not\s+cover",
            r"loss\s+or\s+damage\s+caused\s+by",
            r"the\s+following\s+are\s+excluded",
            r"excluded\s+causes\s+of\s+loss",
            r"not\s+covered",
            r"does\s+not\s+provide\s+coverage",
        ],
    ),
    (
        PageType::Endorsement,
        &[
            r"^#?\s*ENDORSEMENTS?",
            r"endorsements?\s*$",
            r"endorsements?\b",
            r"endorsement\s+no\.?\s*\d*",
            r"endorsement\s+#\s*\d*",
            r"this\s+endorsement\s+(changes|modifies)",
            r"attached\s+to\s+and\s+forms?\s+part",
            r"endorsement\s+schedule",
            r"policy\s+change\s+endorsement",
            r"amendatory\s+endorsement",
            r"additional\s+insured",
            r"waiver\s+of\s+subrogation",
            r"blanket\s+additional\s+insured",
            r"primary\s+and\s+non-?contributory",
            r"forms?\s+and\s+endorsements?",
            r"form\s+[A-Z]{1,4}\s*[\d\-]{2,}",
        ],
    ),
    (
        PageType::Sov,
        &[
            r"^#?\s*SCHEDULE OF VALUES",
            r"schedule\s+of\s+values",
            r"statement\s+of\s+values",
            r"location\s+schedule",
            r"building\s+schedule",
            r"property\s+schedule",
            r"equipment\s+schedule",
            r"scheduled\s+locations?",
            r"tiv\s*[:\-]",
            r"building\s+value",
            r"contents?\s+value",
            r"bi\s*/\s*ee",
        ],
    ),
    (
        PageType::LossRun,
        &[
            r"^#?\s*LOSS RUN REPORT",
            r"loss\s+history",
            r"loss\s+run",
            r"loss\s+experience",
            r"claims?\s+history",
            r"claims?\s+summary",
            r"loss\s+summary",
            r"incurred\s+losses?",
            r"paid\s+losses?",
            r"reserved?\s+losses?",
            r"date\s+of\s+loss",
            r"claim\s+number",
            r"claimant",
        ],
    ),
    (
        PageType::Invoice,
        &[
            r"invoice\s*(number|no\.?|#)",
            r"premium\s+invoice",
            r"amount\s+due\s*[:\-]?\s*\$",
            r"total\s+due\s*[:\-]?\s*\$",
            r"premium\s+summary",
            r"billing\s+statement",
            r"payment\s+due",
            r"installment\s+schedule",
        ],
    ),
    (
        PageType::Definitions,
        &[
            r"definitions?\s*$",
            r"section\s+[ivx]+[\.\:]\s*definitions?",
            r"the\s+following\s+definitions?\s+apply",
            r"as\s+used\s+in\s+this\s+policy",
            r"means?\s*[:\-]",
            r#""[A-Z][A-Za-z\s]+"\s+means"#,
            r"means\s+bodily\s+injury",
            r"means\s+property\s+damage",
        ],
    ),
    (
        PageType::TableOfContents,
        &[
            r"table\s+of\s+contents?",
            r"contents?\s*$",
            r"index\s*$",
            r"page\s+number",
        ],
    ),
    (
        PageType::Boilerplate,
        &[
            r"iso\s+properties",
            r"COPYRIGHT",
            r"copyright\s+iso",
            r"includes\s+copyrighted\s+material",
            r"commercial\s+general\s+liability\s+cg\s+\d{2}\s+\d{2}",
            r"cp\s+\d{2}\s+\d{2}",
            r"bp\s+\d{2}\s+\d{2}",
            r"il\s+\d{2}\s+\d{2}",
            r"all\s+rights\s+reserved",
            r"proprietary\s+information",
        ],
    ),
    (
        PageType::VehicleDetails,
        &[
            r"vehicle\s+details",
            r"particulars\s+of\s+(insured\s+)?vehicle",
            r"schedule\s+of\s+vehicles?",
            r"description\s+of\s+vehicles?",
            r"registration\s+no\.?",
            r"chassis\s+number",
            r"engine\s+number",
            r"make\s*/\s*model",
            r"year\s+of\s+manufacture",
        ],
    ),
    (
        PageType::InsuredDeclaredValue,
        &[
            r"insured'?s?\s+declared\s+value",
            r"idv\s*$",
            r"idv\s*[:\-]",
            r"sum\s+insured",
            r"total\s+sum\s+insured",
        ],
    ),
    (
        PageType::LiabilityCoverages,
        &[
            r"liability\s+coverage",
            r"third\s+party\s+liability",
            r"personal\s+accident\s+cover",
            r"limits?\s+of\s+liability",
            r"compulsory\s+pa\s+cover",
            r"liability\s+to\s+third\s+parties",
        ],
    ),
    (
        PageType::Deductibles,
        &[
            r"deductibles?\s+schedule",
            r"deductible\s+amount",
            r"retention\s*[:\-]",
            r"self-?insured\s+retention",
            r"sir\s*[:\-]",
            r"deductible\s+type",
            r"applies\s+to\s+deductible",
        ],
    ),
    (
        PageType::Premium,
        &[
            r"premium\s+summary",
            r"premium\s+schedule",
            r"total\s+premium\s*[:\-]?\s*\$",
            r"premium\s+calculation",
            r"taxes\s+and\s+fees",
            r"installment\s+plan",
            r"minimum\s+earned\s+premium",
        ],
    ),
    (
        PageType::CoveragesContext,
        &[
            r"scheduled\s+items",
            r"details\s+of\s+coverage",
            r"property\s+information",
            r"description\s+of\s+property",
            r"valuation\s+and\s+coinsurance",
            r"limits\s+and\s+deductibles",
            r"covered\s+auto\s+designation\s+symbols",
            r"item\s+two\s+of\s+the\s+declarations",
            r"symbol\s+description",
        ],
    ),
    (
        PageType::AcordApplication,
        &[
            r"acord\s+\d{2,4}",
            r"applicant\s+information",
            r"producer\s+information",
            r"requested\s+coverage",
            r"prior\s+carrier",
            r"loss\s+history",
            r"commercial\s+insurance\s+application",
        ],
    ),
    (
        PageType::Proposal,
        &[
            r"proposal\s+",
            r"we\s+recommend",
            r"our\s+recommendation",
            r"summary\s+of\s+coverage\s+options",
            r"presented\s+for\s+your\s+review",
            r"insurance\s+proposal",
            r"broker\s+recommendation",
        ],
    ),
];

/// Compiled per-type keyword tables, in source order.
pub static SECTION_PATTERNS: Lazy<Vec<(PageType, Vec<Regex>)>> = Lazy::new(|| {
    SECTION_PATTERN_SOURCES
        .iter()
        .map(|(pt, sources)| (*pt, compile_all(sources)))
        .collect()
});

pub fn patterns_for(page_type: PageType) -> Option<&'static [Regex]> {
    SECTION_PATTERNS
        .iter()
        .find(|(pt, _)| *pt == page_type)
        .map(|(_, patterns)| patterns.as_slice())
}

/// Canonical ISO base-policy section markers.
pub static BASE_POLICY_INDICATORS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"SECTION\s+I[-–—\s]+COVERED\s+AUTOS?",
        r"SECTION\s+II[-–—\s]+.*LIABILITY\s+COVERAGE",
        r"SECTION\s+III[-–—\s]+PHYSICAL\s+DAMAGE",
        r"SECTION\s+IV[-–—\s]+.*CONDITIONS",
        r"SECTION\s+V[-–—\s]+DEFINITIONS",
        r"BUSINESS\s+AUTO\s+COVERAGE\s+FORM",
        r"COMMERCIAL\s+GENERAL\s+LIABILITY\s+FORM",
        r"COMMERCIAL\s+PROPERTY\s+COVERAGE\s+FORM",
    ])
});

/// Structural (not semantic) exclusion headers; these score 0.95 directly.
pub static STRUCTURAL_EXCLUSION_HEADERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"^##?\s*B\.\s*Exclusions?\s*$",
        r"^##?\s*EXCLUSIONS?\s*$",
        r"^##?\s*\d+\.\s*Exclusions?\s*$",
        r"SECTION\s+[IVX]+\s*[-–—]\s*EXCLUSIONS?",
    ])
});

/// ISO symbol-table headers; these score 0.90 directly.
pub static COVERAGE_CONTEXT_TABLE_HEADERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"covered\s+auto\s+designation\s+symbols?",
        r"description\s+of\s+covered\s+auto\s+designation\s+symbols",
    ])
});

/// Hard-override markers for ACORD certificates.
pub static ACORD_CERTIFICATE_OVERRIDES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"this\s+certificate\s+is\s+issued\s+as\s+a\s+matter\s+of\s+information",
        r"acord\s+2[45]",
        r"certificate\s+of\s+liability\s+insurance",
        r"certificate\s+of\s+property\s+insurance",
    ])
});

/// Hard-override marker for the standard ISO endorsement header.
pub static ENDORSEMENT_HEADER_OVERRIDES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"this\s+endorsement\s+changes\s+the\s+policy\.?\s*please\s+read\s+it\s+carefully",
    ])
});

/// Phrase-level endorsement markers that beat structural sections when the
/// document hint allows it.
pub static ENDORSEMENT_DIRECT_PHRASES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"this\s+endorsement\s+(changes|modifies)",
        r"endorsement\s+no\.?\s*\d*",
    ])
});

/// Direct role patterns consulted when no effect patterns fire.
pub static SEMANTIC_ROLE_PATTERNS: Lazy<Vec<(SemanticRole, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            SemanticRole::CoverageModifier,
            compile_all(&[
                r"adds?\s+coverage",
                r"additional\s+coverage",
                r"extension\s+of\s+coverage",
                r"expands?\s+coverage",
                r"modifies\s+coverage",
                r"amends?\s+coverage",
                r"changes\s+the\s+policy",
                r"restores?\s+coverage",
                r"section\s+(ii|iii|iv)\b.*(is\s+amended|is\s+replaced)",
                r"paragraph\s+[a-z]\.\s+(is|are)\s+(replaced|amended)",
            ]),
        ),
        (
            SemanticRole::ExclusionModifier,
            compile_all(&[
                r"removes?\s+coverage",
                r"exclusion\s+of",
                r"deletion\s+of",
                r"limitation\s+of",
                r"restrictive\s+endorsement",
                r"introduces?\s+exclusion",
                r"narrows?\s+exclusion",
                r"removes?\s+exclusion",
                r"does\s+not\s+apply\s+to\s+one\s+or\s+more",
                r"exclusion\s+[a-z0-9\.\(\)]+\s+does\s+not\s+apply",
                r"does\s+not\s+apply\s+to.*?(only|unless|provided\s+that|if)",
                r"(the\s+following\s+replaces).*?exclusion",
                r"replaces\s+paragraph\s+[a-z0-9\.\(\)]+\s*,?\s*exclusions?",
                r"only\s+applies\s+if",
                r"only\s+to\s+the\s+extent",
            ]),
        ),
        (
            SemanticRole::AdministrativeOnly,
            compile_all(&[
                r"administrative\s+change",
                r"notice\s+of\s+information",
                r"reporting\s+provision",
                r"notice\s+requirement",
                r"notice\s+of\s+cancellation",
                r"mailing\s+address",
                r"named\s+insured\s+is\s+changed\s+to",
            ]),
        ),
    ]
});

/// Structural exclusion references that weight toward `ExclusionModifier`.
pub static STRUCTURAL_EXCLUSION_REFERENCES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"section\s+iii.*exclusions?",
        r"paragraph\s+b\.3\.,\s+exclusions",
    ])
});

/// Carve-back phrasing; overrides coverage signals during role resolution.
pub static CARVE_BACK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"exclusion\s+[a-z0-9\.\(\)]+\s+does\s+not\s+apply",
        r"does\s+not\s+apply\s+to\s+one\s+or\s+more",
    ])
});

pub static COVERAGE_EFFECT_PATTERNS: Lazy<Vec<(CoverageEffect, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            CoverageEffect::AddsCoverage,
            compile_all(&[
                r"adds?\s+coverage",
                r"additional\s+coverage",
                r"the\s+following\s+(is|are)\s+added\s+to",
                r"is\s+amended\s+to\s+include",
                r"is\s+extended\s+to\s+include",
                r"who\s+is\s+an\s+insured.*?is\s+changed\s+to\s+include",
                r"who\s+is\s+an\s+insured\s+(is|are)\s+(amended|revised|modified)",
                r"include\s+as\s+an\s+.{0,20}insured",
                r"this\s+insurance\s+applies\s+to",
                r"coverage\s+is\s+provided\s+for",
                r"(is\s+)?primary\s+(to\s+)?and\s+non-contributory",
                r"primary\s+and\s+noncontributory",
                r"additional\s+insured",
                r"blanket\s+additional\s+insured",
            ]),
        ),
        (
            CoverageEffect::ExpandsCoverage,
            compile_all(&[
                r"expands?\s+coverage",
                r"extension\s+of\s+coverage",
                r"endorsement\s+broadens\s+coverage",
                r"this\s+endorsement\s+broadens\s+coverage",
                r"section\s+(ii|iii|iv)\b.*?\b(coverage|insured|supplementary\s+payments)",
                r"the\s+following\s+replaces\s+paragraph",
                r"the\s+following\s+replaces\s+subparagraph",
            ]),
        ),
        (
            CoverageEffect::LimitsCoverage,
            compile_all(&[
                r"limits?\s+coverage",
                r"limitation\s+of",
                r"restrictive",
                r"restricts?\s+coverage",
                r"applies\s+only\s+if",
                r"only\s+applies\s+when",
                r"subject\s+to\s+the\s+following",
                r"limited\s+to",
                r"not\s+exceed",
                r"no\s+greater\s+than",
                r"but\s+only\s+for\s+damages",
                r"only\s+to\s+the\s+extent",
            ]),
        ),
        (
            CoverageEffect::RestoresCoverage,
            compile_all(&[r"restores?\s+coverage", r"coverage.*?(is\s+)?restored"]),
        ),
    ]
});

pub static EXCLUSION_EFFECT_PATTERNS: Lazy<Vec<(ExclusionEffect, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            ExclusionEffect::IntroducesExclusion,
            compile_all(&[
                r"introduces?\s+exclusion",
                r"exclusion\s+of",
                r"adds?\s+(an\s+)?exclusion",
                r"excludes?\b",
                r"this\s+insurance\s+does\s+not\s+apply\s+to",
                r"coverage\s+does\s+not\s+apply\s+to",
                r"exclusion.*?(is\s+)?added",
            ]),
        ),
        (
            ExclusionEffect::NarrowsExclusion,
            compile_all(&[
                r"narrows?\s+exclusion",
                r"exclusion.*?(is\s+)?narrowed",
                r"exclusion\s+[a-z0-9\.\(\)]+\s+does\s+not\s+apply",
                r"does\s+not\s+apply\s+to.*?(only|unless|provided\s+that|if)",
                r"exclusion\s+[a-z0-9\.]+\s+(is|are)\s+(added|revised|replaced)",
                r"(no|none\s+of\s+the|does\s+not)\s+.*?\bwill\s+apply\b",
            ]),
        ),
        (
            ExclusionEffect::RemovesExclusion,
            compile_all(&[
                r"removes?\s+exclusion",
                r"deletion\s+of\s+exclusion",
                r"exclusion.*?(is\s+)?removed",
                r"exclusion.*?is\s+deleted",
                r"is\s+replaced\s+by\s+the\s+following",
                r"deleted\s+and\s+replaced\s+with",
                r"(the\s+following\s+replaces).*?exclusion",
                r"replaces\s+paragraph\s+[a-z0-9\.\(\)]+\s*,?\s*exclusions?",
                r"waives?\s+any\s+right\s+of\s+recovery",
            ]),
        ),
    ]
});

/// Page types considered for intra-page span anchors, in detection order.
pub static SPAN_TARGET_TYPES: &[PageType] = &[
    PageType::Declarations,
    PageType::Coverages,
    PageType::Exclusions,
    PageType::Endorsement,
    PageType::Definitions,
    PageType::CertificateOfInsurance,
    PageType::CoveragesContext,
    PageType::VehicleDetails,
    PageType::LiabilityCoverages,
    PageType::InsuredDeclaredValue,
    PageType::CoverageGrant,
    PageType::CoverageExtension,
    PageType::Limits,
    PageType::InsuredDefinition,
];

/// Span anchors: the per-type keyword patterns anchored to a line start,
/// allowing optional markdown hash and list-label prefixes ("## C. ...").
pub static SPAN_ANCHOR_PATTERNS: Lazy<Vec<(PageType, Vec<Regex>)>> = Lazy::new(|| {
    SPAN_TARGET_TYPES
        .iter()
        .filter_map(|pt| {
            SECTION_PATTERN_SOURCES
                .iter()
                .find(|(candidate, _)| candidate == pt)
                .map(|(_, sources)| {
                    let anchored: Vec<Regex> = sources
                        .iter()
                        .map(|p| compile(&format!(r"^\s*#*\s*(?:[a-z\d]{{1,2}}[\.\)]\s+)*{p}")))
                        .collect();
                    (*pt, anchored)
                })
        })
        .collect()
});

/// Policy number forms; the capture is canonicalized to upper-hyphenated.
pub static POLICY_NUMBER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"Policy\s*(?:Number|No\.?)[:\s]+([A-Z]{2}[-\s]?\d?[A-Z]?\d{6,})",
        r"POLICY\s*NUMBER[:\s]+([A-Z]{2}[-\s]?\d?[A-Z]?\d{6,})",
        r"Policy\s*#[:\s]*([A-Z0-9\-]+)",
    ])
});

/// ISO form number forms (e.g. "CA T3 53 02 15").
pub static FORM_NUMBER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"(?:Form\s+)?([A-Z]{2}\s+[A-Z]?\d\s+\d{2}\s+\d{2}\s+\d{2})",
        r"([A-Z]{2}\s+[A-Z]\d\s+\d{2}\s+\d{2}\s+\d{2})",
    ])
});

/// Section labels ("## A. BROAD FORM", "- B. ...", "## 1. ..."), multiline.
pub static SECTION_LABEL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^##?\s*([A-Z])\.?\s+[A-Z]",
        r"^-?\s*([A-Z])\.?\s+[A-Z]",
        r"^##?\s*(\d+)\.?\s+[A-Z]",
    ]
    .iter()
    .map(|p| compile_multiline(p))
    .collect()
});

/// ISO endorsement header markers.
pub static ENDORSEMENT_HEADER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"THIS\s+ENDORSEMENT\s+CHANGES\s+THE\s+POLICY",
        r"PLEASE\s+READ\s+(THIS\s+ENDORSEMENT\s+)?CAREFULLY",
        r"THIS\s+ENDORSEMENT\s+MODIFIES\s+INSURANCE",
        r"ATTACHED\s+TO\s+AND\s+FORMS?\s+PART\s+OF",
    ])
});

/// Explicit continuation text.
pub static EXPLICIT_CONTINUATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_all(&[
        r"\(CONTINUED\s+ON\s+[^)]+\)",
        r"CONTINUATION\s+OF\s+(?:FORM\s+)?[A-Z\d\s]+",
        r"(?:continued|cont['.]?d)\s+(?:from|on)\s+(?:previous|next)",
    ])
});

/// Leading conjunction marking a mid-sentence page start.
pub static MID_SENTENCE_CONJUNCTION: Lazy<Regex> =
    Lazy::new(|| compile(r"^(and|or|but|however|therefore|moreover|furthermore|also)\b"));

/// Markdown table separator row.
pub static TABLE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| compile(r"\|[-:\s|]+\|"));

/// Anchor phrases recorded into signal metadata.
pub static ANCHOR_PHRASES: &[&str] = &[
    "DECLARATIONS",
    "POLICY NUMBER",
    "INSURED",
    "PREMIUM",
    "COVERAGE",
    "LIMITS OF LIABILITY",
    "DEDUCTIBLE",
    "CONDITIONS",
    "EXCLUSIONS",
    "ENDORSEMENT",
    "SCHEDULE OF VALUES",
    "SOV",
    "LOSS RUN",
    "CLAIMS HISTORY",
    "DEFINITIONS",
    "TABLE OF CONTENTS",
];

/// Keyword sets for the whole-document type preview.
pub static DOCUMENT_TYPE_KEYWORDS: &[(DocumentType, &[&str])] = &[
    (
        DocumentType::Policy,
        &[
            "DECLARATIONS",
            "COVERAGE",
            "LIMITS OF LIABILITY",
            "POLICY NUMBER",
            "EFFECTIVE DATE",
            "EXPIRATION DATE",
        ],
    ),
    (
        DocumentType::Sov,
        &[
            "SCHEDULE OF VALUES",
            "SOV",
            "PROPERTY VALUATION",
            "BUILDING VALUE",
            "CONTENTS VALUE",
        ],
    ),
    (
        DocumentType::LossRun,
        &[
            "LOSS HISTORY",
            "CLAIMS",
            "LOSS RUN",
            "CLAIM DATE",
            "LOSS DATE",
            "AMOUNT PAID",
        ],
    ),
    (
        DocumentType::Endorsement,
        &["ENDORSEMENT", "AMENDMENT", "RIDER", "ATTACHMENT"],
    ),
    (
        DocumentType::AcordApplication,
        &[
            "ACORD",
            "APPLICANT INFORMATION",
            "PRODUCER INFORMATION",
            "REQUESTED COVERAGE",
            "PRIOR CARRIER",
            "LOSS HISTORY",
        ],
    ),
    (
        DocumentType::Proposal,
        &[
            "PROPOSAL",
            "WE RECOMMEND",
            "OUR RECOMMENDATION",
            "SUMMARY OF COVERAGE OPTIONS",
            "PRESENTED FOR YOUR REVIEW",
        ],
    ),
];

/// Structural-context triggers for base-policy inheritance, checked in
/// reverse numeral order so "SECTION V" is not shadowed by "SECTION I".
pub static POLICY_SECTION_TRIGGERS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (compile(r"SECTION\s+V\b"), "definitions"),
        (compile(r"SECTION\s+IV\b"), "conditions"),
        (compile(r"SECTION\s+III\b"), "physical_damage"),
        (compile(r"SECTION\s+II\b"), "liability"),
        (compile(r"SECTION\s+I\b"), "covered_autos"),
    ]
});

pub(crate) fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

pub(crate) fn count_matches(patterns: &[Regex], text: &str) -> usize {
    patterns.iter().filter(|p| p.is_match(text)).count()
}
