use anyhow::{Context, Result};
use regex::Regex;

use crate::model::forms;

mod coverage;
mod dividend;
mod hsa;
mod interest;
mod mortgage;
mod retirement;
#[cfg(test)]
mod tests;
mod w2;

pub use coverage::employer_coverage_title;
pub use dividend::DividendPayer;
pub use hsa::HsaTrustee;
pub use interest::InterestPayer;
pub use mortgage::MortgageLender;
pub use retirement::RetirementPayer;
pub use w2::{W2Info, W2Parser};

pub type Strategy<T, R> = fn(&T, &[&str]) -> Option<R>;

pub fn first_match<T, R>(
    extractor: &T,
    strategies: &[Strategy<T, R>],
    lines: &[&str],
    keep: impl Fn(&R) -> bool,
) -> Option<R> {
    strategies
        .iter()
        .find_map(|strategy| strategy(extractor, lines).filter(|result| keep(result)))
}

pub fn first_label<T>(extractor: &T, strategies: &[Strategy<T, String>], lines: &[&str]) -> Option<String> {
    first_match(extractor, strategies, lines, |label| !label.trim().is_empty())
}

#[derive(Debug, Clone, Copy)]
pub enum OverrideLabel {
    Fixed(&'static str),
    Matched,
    Line,
}

#[derive(Debug, Clone)]
pub struct InstitutionOverride {
    pattern: Regex,
    label: OverrideLabel,
}

impl InstitutionOverride {
    pub fn new(pattern: &str, label: OverrideLabel) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)
                .with_context(|| format!("failed to compile institution pattern {pattern:?}"))?,
            label,
        })
    }
}

pub fn apply_overrides(overrides: &[InstitutionOverride], lines: &[&str]) -> Option<String> {
    overrides.iter().find_map(|entry| {
        lines.iter().find_map(|line| {
            let found = entry.pattern.find(line)?;
            Some(match entry.label {
                OverrideLabel::Fixed(label) => label.to_string(),
                OverrideLabel::Matched => found.as_str().trim().to_string(),
                OverrideLabel::Line => strip_trailing_punctuation(line),
            })
        })
    })
}

pub struct LabelExtractors {
    w2: W2Parser,
    interest: InterestPayer,
    dividend: DividendPayer,
    mortgage: MortgageLender,
    retirement: RetirementPayer,
    hsa: HsaTrustee,
}

impl LabelExtractors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            w2: W2Parser::new()?,
            interest: InterestPayer::new()?,
            dividend: DividendPayer::new(),
            mortgage: MortgageLender::new()?,
            retirement: RetirementPayer::new()?,
            hsa: HsaTrustee::new()?,
        })
    }

    pub fn entity_label(&self, form_type: &str, text: &str) -> Option<String> {
        let label = match form_type {
            forms::W2 => self.w2.bookmark(text),
            forms::INT_1099 => self.interest.bookmark(text),
            forms::DIV_1099 => self.dividend.bookmark(text),
            forms::MORTGAGE_1098 => self.mortgage.bookmark(text),
            forms::RETIREMENT_1099 => self.retirement.bookmark(text),
            forms::HSA_5498 => self.hsa.bookmark(text),
            forms::EMPLOYER_COVERAGE_1095 => employer_coverage_title(text),
            _ => return None,
        };

        let label = label.trim();
        (!label.is_empty() && label != form_type).then(|| label.to_string())
    }
}

pub fn next_non_blank<'a>(lines: &[&'a str], start: usize) -> Option<(usize, &'a str)> {
    lines
        .iter()
        .enumerate()
        .skip(start)
        .map(|(index, line)| (index, line.trim()))
        .find(|(_, line)| !line.is_empty())
}

pub fn strip_trailing_punctuation(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|character: char| {
            !character.is_alphanumeric() && character != '_' && !character.is_whitespace()
        })
        .trim()
        .to_string()
}

pub fn normalize_quotes(raw: &str) -> String {
    raw.replace(['‘', '’', '`'], "'").replace('\u{00A0}', " ")
}

pub fn alphabetic_count(raw: &str) -> usize {
    raw.chars().filter(|character| character.is_alphabetic()).count()
}
