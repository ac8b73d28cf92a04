use std::sync::OnceLock;

use regex::{Regex, RegexSet};

use super::{PhraseRule, RuleStage, contains_any};
use crate::model::{Category, forms};

pub const INSTRUCTION_PHRASES: &[&str] = &[
    // W-2 "Instructions for Employee"
    "box 1. enter this amount on the wages line of your tax return",
    "box 2. enter this amount on the federal income tax withheld line",
    "box 5. you may be required to report this amount on form 8959",
    "box 6. this amount includes the 1.45% medicare tax withheld",
    "box 8. this amount is not included in box 1, 3, 5, or 7",
    "you must file form 4137",
    "box 10. this amount includes the total dependent care benefits",
    "instructions for form 8949",
    "regulations section 1.6045-1",
    "recipient's taxpayer identification number",
    "fatca filing requirement",
    "payer’s routing transit number",
    "payer's routing transit number",
    "refer to the form 1040 instructions",
    "earned income credit",
    "if your name, ssn, or address is incorrect",
    "corrected wage and tax statement",
    "credit for excess taxes",
    "instructions for employee (continued from back of copy c)",
    "box 12 (continued)",
    "f—elective deferrals under a section 408(k)(6) salary reduction sep",
    "deferrals) to a section 457(b) deferred compensation plan",
    "j—nontaxable sick pay (information only, not included in box 1, 3, or 5)",
    "k—20% excise tax on excess golden parachute payments",
    "l—substantiated employee business expense reimbursements",
    "q—nontaxable combat pay. see the form 1040 instructions for details",
    // 1099-INT instructions
    "box 1. shows taxable interest",
    "box 2. shows interest or principal forfeited",
    "box 3. shows interest on u.s. savings bonds",
    "box 4. shows backup withholding",
    "box 5. any amount shown is your share",
    "box 6. shows foreign tax paid",
    "box 7. shows the country or u.s. territory",
    "box 8. shows tax-exempt interest",
    "box 9. shows tax-exempt interest subject",
    "box 10. for a taxable or tax-exempt covered security",
    "box 11. for a taxable covered security",
    "box 12. for a u.s. treasury obligation",
    "box 13. for a tax-exempt covered security",
    "box 14. shows cusip number",
    "boxes 15-17. state tax withheld",
    // 1098-T instructions
    "you, or the person who can claim you as a dependent, may be able to claim an education credit",
    "student’s taxpayer identification number (tin)",
    "student's taxpayer identification number (tin)",
    "box 1. shows the total payments received by an eligible educational institution",
    "box 2. reserved for future use",
    "box 3. reserved for future use",
    "box 4. shows any adjustment made by an eligible educational institution",
    "box 5. shows the total of all scholarships or grants",
    "tip: you may be able to increase the combined value of an education credit",
    "box 6. shows adjustments to scholarships or grants for a prior year",
    "box 7. shows whether the amount in box 1 includes amounts",
    "box 8. shows whether you are considered to be carrying at least one-half",
    "box 9. shows whether you are considered to be enrolled in a program leading",
    "box 10. shows the total amount of reimbursements or refunds",
    "future developments. for the latest information about developments related to form 1098-t",
];

pub const W2_HEADER_PHRASES: &[&str] = &["wages, tips, other compensation"];

pub const DIV_HEADER_PHRASES: &[&str] = &[
    "form 1099-div",
    "dividends and distributions",
    "1a total ordinary dividends",
    "1b qualified dividends",
    "2a total capital gain distr",
    "2b unrecap. sec",
    "2c section 1202 gain",
];

pub const INT_FRONT_PHRASES: &[&str] = &[
    "3 interest on u.s. savings bonds and treasury obligations",
    "tax-exempt interest",
    "ond premium on treasury obligations",
    "withdrawal penalty",
];

pub const INT_UNUSED_PHRASES: &[&str] = &[
    "if you are registered in the account",
    "subject to reporting when paid regardless",
    "if we are required to withhold tax",
];

pub const MORTGAGE_FRONT_PHRASES: &[&str] = &[
    "refund of overpaid interest",
    "mortgage insurance premiums",
    "mortgage origination date",
    "number of properties securing the mortgage",
    "number of properties securing the morgage",
    "address or description of property securing",
    "form 1098 mortgage",
    "limits based on the loan amount",
    "1 mortgage interest received from",
];

pub const MORTGAGE_UNUSED_PHRASES: &[&str] = &[
    "instructions for payer/borrower",
    "payer’s/borrower’s taxpayer identification number",
    "payer's/borrower's taxpayer identification number",
    "box 1. shows the mortgage interest received",
    "box 3. shows the date of the mortgage origination",
    "box 5. if an amount is reported in this box",
    "box 8. shows the address or description",
    "this information is being provided to you as",
    "we’re providing the mortgage insurance",
    "we're providing the mortgage insurance",
    "if you received this statement as the payer of",
    "if your mortgage payments were subsidized",
];

pub const K1_PHRASES: &[&str] = &[
    "additional information from schedule k-1",
    "qbi or qualified ptp items subject to partner",
];

pub const PROPERTY_TAX_PHRASES: &[&str] = &[
    "total allowable community college",
    "school district property tax paid",
    "district property tax paid",
    "parcel id",
    "homestead exempt",
    "real property tax",
    "property assessment",
];

pub const MARKETPLACE_1095_PHRASES: &[&str] = &["form 1095-a", "health insurance marketplace statement"];

pub const COVERAGE_1095_PHRASES: &[&str] = &["form 1095-b"];

pub const EMPLOYER_COVERAGE_1095_PHRASES: &[&str] = &[
    "form 1095-c",
    "employer-provided health insurance offer",
    "employee offer of coverage",
];

pub const RETIREMENT_UNUSED_PHRASES: &[&str] = &[
    "fees and interest earnings are not considered contributions",
    "contact a competent tax advisor or the irs",
    "retirement plans for small business",
    "civil service retirement benefits",
    "general rule for pensions and annuities",
    "hsas and other tax-favored health plan",
];

pub const RETIREMENT_FRONT_PHRASES: &[&str] = &[
    "taxable amount iras",
    "contrib or insurance premiums",
    "6 net unrealized appreciation",
    "total employee contributions the irs",
    "2b taxable amount total copy b",
];

pub const GOVERNMENT_1099_PHRASES: &[&str] = &["1099-g", "form 1099 g", "certain government payments"];

pub const CHILD_CARE_PHRASES: &[&str] = &[
    "child care",
    "day care",
    "provider information",
    "total payments paid by",
    "preschool tuition payments",
    "the student named above has",
];

pub const PLAN_529_PHRASES: &[&str] = &[
    "indiana 529",
    "529 direct savings plan",
    "education savings authority",
    "college savings",
    "qualified tuition program",
    "investment allocations",
    "investment portfolio",
    "funding information",
    "recurring contribution",
    "bank information",
    "electronic bank transfer",
    "indiana education savings",
    "contribution ebt",
];

const K1_SCHEDULE_PATTERN: &str = r"(?s)schedule\s*k[-–]?\s*1.*form\s*1065";

const HSA_5498_PATTERNS: &[&str] = &[
    r"form\s+[s§5]\s*498-?\s*sa",
    r"total\s+contributions\s+made\s+in\s+\d{4}",
    r"fair\s+market\s+value\s+of\s+(account|hsa)",
    r"\b2[.\-)]?\s*rollover\s+contributions",
    r"\b7[.\-)]?\s*ira\s+type",
    r"\b11[.\-)]?\s*required\s+minimum\s+distribution.*\d{4}",
];

static K1_SCHEDULE: OnceLock<Option<Regex>> = OnceLock::new();
static HSA_5498_FRONT: OnceLock<Option<RegexSet>> = OnceLock::new();

pub fn is_schedule_k1(folded: &str) -> bool {
    let schedule = K1_SCHEDULE
        .get_or_init(|| Regex::new(K1_SCHEDULE_PATTERN).ok())
        .as_ref();
    schedule.is_some_and(|pattern| pattern.is_match(folded))
        || (folded.contains("statement a") && folded.contains("qbi"))
        || contains_any(folded, K1_PHRASES)
}

/// OCR regularly reads the leading 5 of "5498" as "s" or "§".
pub fn is_hsa_5498(folded: &str) -> bool {
    HSA_5498_FRONT
        .get_or_init(|| RegexSet::new(HSA_5498_PATTERNS).ok())
        .as_ref()
        .is_some_and(|patterns| patterns.is_match(folded))
}

pub fn is_529_plan(folded: &str) -> bool {
    let clean = folded
        .chars()
        .filter(|character| character.is_ascii_alphanumeric() || character.is_whitespace())
        .collect::<String>();
    clean.contains("529") && contains_any(&clean, PLAN_529_PHRASES)
}

pub const GENERIC_FALLBACKS: &[PhraseRule] = &[
    PhraseRule::new("w-2", Category::Income, forms::W2),
    PhraseRule::new("w2", Category::Income, forms::W2),
    PhraseRule::new("1099-int", Category::Income, forms::INT_1099),
    PhraseRule::new("interest income", Category::Income, forms::INT_1099),
    PhraseRule::new("1099-div", Category::Income, forms::DIV_1099),
    PhraseRule::new("1098-t", Category::Expenses, forms::TUITION_1098),
    PhraseRule::new("1099", Category::Income, forms::OTHER_1099),
    PhraseRule::new("donation", Category::Expenses, forms::DONATION),
];

pub const CASCADE: &[RuleStage] = &[
    RuleStage::AnyOf {
        phrases: W2_HEADER_PHRASES,
        category: Category::Income,
        form_type: forms::W2,
    },
    RuleStage::AllOf {
        phrases: &["employer's name", "address"],
        category: Category::Income,
        form_type: forms::W2,
    },
    RuleStage::AnyOf {
        phrases: INSTRUCTION_PHRASES,
        category: Category::Others,
        form_type: forms::UNUSED,
    },
    RuleStage::AnyOf {
        phrases: DIV_HEADER_PHRASES,
        category: Category::Income,
        form_type: forms::DIV_1099,
    },
    RuleStage::FrontOrUnused {
        front: INT_FRONT_PHRASES,
        unused: INT_UNUSED_PHRASES,
        category: Category::Income,
        form_type: forms::INT_1099,
    },
    RuleStage::FrontOrUnused {
        front: MORTGAGE_FRONT_PHRASES,
        unused: MORTGAGE_UNUSED_PHRASES,
        category: Category::Expenses,
        form_type: forms::MORTGAGE_1098,
    },
    RuleStage::Detector {
        detect: is_schedule_k1,
        category: Category::Income,
        form_type: forms::K1,
    },
    RuleStage::AnyOf {
        phrases: PROPERTY_TAX_PHRASES,
        category: Category::Expenses,
        form_type: forms::PROPERTY_TAX,
    },
    RuleStage::AnyOf {
        phrases: MARKETPLACE_1095_PHRASES,
        category: Category::Expenses,
        form_type: forms::MARKETPLACE_1095,
    },
    RuleStage::AnyOf {
        phrases: COVERAGE_1095_PHRASES,
        category: Category::Expenses,
        form_type: forms::COVERAGE_1095,
    },
    RuleStage::AnyOf {
        phrases: EMPLOYER_COVERAGE_1095_PHRASES,
        category: Category::Expenses,
        form_type: forms::EMPLOYER_COVERAGE_1095,
    },
    RuleStage::AnyOf {
        phrases: RETIREMENT_UNUSED_PHRASES,
        category: Category::Others,
        form_type: forms::UNUSED,
    },
    RuleStage::AnyOf {
        phrases: RETIREMENT_FRONT_PHRASES,
        category: Category::Income,
        form_type: forms::RETIREMENT_1099,
    },
    RuleStage::AnyOf {
        phrases: GOVERNMENT_1099_PHRASES,
        category: Category::Income,
        form_type: forms::GOVERNMENT_1099,
    },
    RuleStage::AnyOf {
        phrases: CHILD_CARE_PHRASES,
        category: Category::Expenses,
        form_type: forms::CHILD_CARE,
    },
    RuleStage::Detector {
        detect: is_529_plan,
        category: Category::Expenses,
        form_type: forms::PLAN_529,
    },
    RuleStage::Detector {
        detect: is_hsa_5498,
        category: Category::Expenses,
        form_type: forms::HSA_5498,
    },
    RuleStage::FirstPhrase(GENERIC_FALLBACKS),
];
