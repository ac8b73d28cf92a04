use anyhow::{Context, Result};
use regex::Regex;

use super::{
    InstitutionOverride, OverrideLabel, Strategy, alphabetic_count, apply_overrides, first_label,
    strip_trailing_punctuation,
};
use crate::model::forms;

const PAYER_HEADERS: &[&str] = &[
    "interest income income",
    "zip or foreign postal code, and telephone no.",
    "federal id number:",
];

const SKIPPED_PHRASES: &[&str] = &[
    "copy b",
    "account number",
    "payer's",
    "payer’s",
    "recipient's",
    "recipient’s",
    "federal id",
];

const SERVICER_PHRASES: &[&str] = &["mortgage", "servicer"];

const HEADER_LOOKAHEAD: usize = 3;

pub struct InterestPayer {
    overrides: Vec<InstitutionOverride>,
    id_token: Regex,
    form_suffix: Regex,
    na_suffix: Regex,
    dangling_character: Regex,
}

impl InterestPayer {
    const STRATEGIES: &'static [Strategy<Self, String>] = &[Self::known_payer, Self::payer_block];

    pub fn new() -> Result<Self> {
        Ok(Self {
            overrides: vec![
                InstitutionOverride::new(
                    r"(?i)\bu\.?\s?s{1,2}\.?\s+bank\s+n\.?\s?a\b",
                    OverrideLabel::Fixed("US Bank NA"),
                )?,
                InstitutionOverride::new(r"(?i)\bcapital\s+one\b", OverrideLabel::Fixed("Capital One NA"))?,
                InstitutionOverride::new(r"(?i)\bbank\s+of\s+america\b", OverrideLabel::Line)?,
            ],
            id_token: Regex::new(r"(?i)\b(?:tin|rtn)\b").context("failed to compile TIN regex")?,
            form_suffix: Regex::new(r"(?i)\s*reel\s+form\s+1099-?int\b.*$")
                .context("failed to compile form-suffix regex")?,
            na_suffix: Regex::new(r"(?i),\s*n\.a\.?$").context("failed to compile N.A. regex")?,
            dangling_character: Regex::new(r"\b\w\b$")
                .context("failed to compile dangling-character regex")?,
        })
    }

    pub fn bookmark(&self, text: &str) -> String {
        let lines = text.lines().collect::<Vec<&str>>();
        first_label(self, Self::STRATEGIES, &lines).unwrap_or_else(|| forms::INT_1099.to_string())
    }

    fn known_payer(&self, lines: &[&str]) -> Option<String> {
        apply_overrides(&self.overrides, lines)
    }

    fn payer_block(&self, lines: &[&str]) -> Option<String> {
        lines
            .iter()
            .enumerate()
            .filter(|(_, line)| {
                let lower = line.to_lowercase();
                PAYER_HEADERS.iter().any(|header| lower.contains(header))
            })
            .find_map(|(header_index, _)| {
                lines
                    .iter()
                    .skip(header_index + 1)
                    .take(HEADER_LOOKAHEAD)
                    .map(|line| line.trim())
                    .filter(|line| self.is_payer_candidate(line))
                    .map(|line| self.clean_payer(line))
                    .find(|name| !name.is_empty())
            })
    }

    fn is_payer_candidate(&self, line: &str) -> bool {
        if line.is_empty() || alphabetic_count(line) < 3 {
            return false;
        }
        let lower = line.to_lowercase();
        !SERVICER_PHRASES.iter().any(|phrase| lower.contains(phrase))
            && !SKIPPED_PHRASES.iter().any(|phrase| lower.contains(phrase))
            && !self.id_token.is_match(&lower)
    }

    fn clean_payer(&self, line: &str) -> String {
        let cleaned = self.form_suffix.replace(line, "");
        let cleaned = self.na_suffix.replace(cleaned.trim(), "");
        let cleaned = strip_trailing_punctuation(&cleaned);
        self.dangling_character
            .replace(&cleaned, "")
            .trim()
            .to_string()
    }
}
