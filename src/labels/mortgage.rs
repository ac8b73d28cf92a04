use anyhow::{Context, Result};
use regex::Regex;

use super::{
    InstitutionOverride, OverrideLabel, Strategy, apply_overrides, first_label, next_non_blank,
    normalize_quotes, strip_trailing_punctuation,
};
use crate::model::forms;

pub struct MortgageLender {
    overrides: Vec<InstitutionOverride>,
    interest_tail: Regex,
    conjunction: Regex,
    fcu_name: Regex,
    doing_business_as: Regex,
    recipient_lender: Regex,
}

impl MortgageLender {
    const STRATEGIES: &'static [Strategy<Self, String>] = &[
        Self::known_lender,
        Self::after_loan_limits_caption,
        Self::credit_union_line,
        Self::after_payer_borrower_header,
        Self::after_recipient_lender_header,
    ];

    pub fn new() -> Result<Self> {
        Ok(Self {
            overrides: vec![
                InstitutionOverride::new(
                    r"(?i)\bdovenmuehle\s+mortgage(?:,?\s*inc)?",
                    OverrideLabel::Matched,
                )?,
                InstitutionOverride::new(
                    r"(?i)\b(?:the\s+)?huntington\s+national\s+bank\b",
                    OverrideLabel::Matched,
                )?,
                InstitutionOverride::new(
                    r"(?i)\bunited\s+nations\s+fcu\b",
                    OverrideLabel::Fixed("UNITED NATIONS FCU"),
                )?,
                InstitutionOverride::new(
                    r"(?i)\bloan\s*depot(?:\.|\s)*com(?:,?\s*llc)?\b",
                    OverrideLabel::Matched,
                )?,
            ],
            interest_tail: Regex::new(r"(?i)\binterest\b.*$")
                .context("failed to compile interest-tail regex")?,
            conjunction: Regex::new(r"(?i)\band\b").context("failed to compile conjunction regex")?,
            fcu_name: Regex::new(r"(?i)(.*?\bFCU)\b").context("failed to compile FCU regex")?,
            doing_business_as: Regex::new(r"(?i)\s+d/b/a\s+.*$")
                .context("failed to compile d/b/a regex")?,
            recipient_lender: Regex::new(r"(?i)recipient.?s\s*/\s*lender.?s")
                .context("failed to compile recipient/lender regex")?,
        })
    }

    pub fn bookmark(&self, text: &str) -> String {
        let lines = text.lines().collect::<Vec<&str>>();
        first_label(self, Self::STRATEGIES, &lines)
            .unwrap_or_else(|| forms::MORTGAGE_1098.to_string())
    }

    fn clean_bookmark(&self, raw: &str) -> String {
        self.interest_tail.replace(raw, "").trim().to_string()
    }

    fn known_lender(&self, lines: &[&str]) -> Option<String> {
        apply_overrides(&self.overrides, lines).map(|label| self.clean_bookmark(&label))
    }

    fn after_loan_limits_caption(&self, lines: &[&str]) -> Option<String> {
        let caption_index = lines
            .iter()
            .position(|line| line.to_lowercase().contains("limits based on the loan amount"))?;
        let (_, raw) = next_non_blank(lines, caption_index + 1)?;

        let normalized = normalize_quotes(raw);
        let without_interest = self.interest_tail.replace(&normalized, "");
        let first_clause = self
            .conjunction
            .split(&without_interest)
            .next()
            .unwrap_or_default();
        Some(self.clean_bookmark(&strip_trailing_punctuation(first_clause)))
    }

    fn credit_union_line(&self, lines: &[&str]) -> Option<String> {
        lines.iter().find_map(|line| {
            let captures = self.fcu_name.captures(line)?;
            let name = captures.get(1)?.as_str();
            Some(self.clean_bookmark(name))
        })
    }

    fn after_payer_borrower_header(&self, lines: &[&str]) -> Option<String> {
        let header_index = lines.iter().position(|line| {
            let lower = line.to_lowercase();
            lower.contains("payer") && lower.contains("borrower")
        })?;

        lines
            .iter()
            .skip(header_index + 1)
            .map(|line| line.trim())
            .filter(|line| is_name_candidate(line))
            .map(|line| {
                let raw = strip_trailing_punctuation(line);
                let raw = self.doing_business_as.replace(&raw, "");
                self.clean_bookmark(&raw)
            })
            .find(|name| !name.is_empty())
    }

    fn after_recipient_lender_header(&self, lines: &[&str]) -> Option<String> {
        let header_index = lines
            .iter()
            .position(|line| self.recipient_lender.is_match(line))?;
        let (_, raw) = next_non_blank(lines, header_index + 1)?;
        Some(self.clean_bookmark(&strip_trailing_punctuation(raw)))
    }
}

fn is_name_candidate(line: &str) -> bool {
    let mut characters = line.chars();
    let Some(first) = characters.next() else {
        return false;
    };
    if characters.all(|character| character == first) {
        return false;
    }
    !line.chars().any(|character| character.is_ascii_digit() || character == '$')
        && !line.to_lowercase().contains("page")
}
