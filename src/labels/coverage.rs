use crate::model::forms;

pub fn employer_coverage_title(text: &str) -> String {
    let lower = text.to_lowercase();
    if lower.contains("employer-provided health insurance") || lower.contains("form 1095-c") {
        "1095-C – Employer-Provided Coverage".to_string()
    } else {
        forms::EMPLOYER_COVERAGE_1095.to_string()
    }
}
