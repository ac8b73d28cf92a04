use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use super::{
    InstitutionOverride, OverrideLabel, Strategy, alphabetic_count, apply_overrides, first_match,
    next_non_blank,
};
use crate::model::forms;

const JUNK_PHRASES: &[&str] = &[
    "omb no",
    "control number",
    "payrol",
    "allocated tips",
    "social security wages",
    "social security tax withheld",
];

const LOOKAHEAD_LINES: usize = 3;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct W2Info {
    pub ssn: Option<String>,
    pub ein: Option<String>,
    pub employer_name: Option<String>,
    pub employer_address: Option<String>,
}

impl W2Info {
    pub fn ein_or_na(&self) -> &str {
        self.ein.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn address_or_na(&self) -> &str {
        self.employer_address.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EmployerBlock {
    name: String,
    address: Option<String>,
}

pub struct W2Parser {
    overrides: Vec<InstitutionOverride>,
    ssn: Regex,
    ein: Regex,
    employer_marker: Regex,
    payroll_marker: Regex,
    employer_box_tail: Regex,
    tax_withheld_suffix: Regex,
    trailing_numbers: Regex,
}

impl W2Parser {
    const STRATEGIES: &'static [Strategy<Self, EmployerBlock>] = &[
        Self::known_employer,
        Self::employer_marker_block,
        Self::employer_name_caption,
        Self::payroll_provider_block,
    ];

    pub fn new() -> Result<Self> {
        Ok(Self {
            overrides: vec![
                InstitutionOverride::new(
                    r"(?i)\bsalesforce[, ]+inc\b",
                    OverrideLabel::Fixed("SALESFORCE, INC"),
                )?,
                InstitutionOverride::new(r"(?i)\bfca\s?us,?\s+llc\b", OverrideLabel::Fixed("FCA US LLC"))?,
            ],
            ssn: Regex::new(r"\b(\d{3}-\d{2}-\d{4})\b").context("failed to compile SSN regex")?,
            ein: Regex::new(r"\b(\d{2}-\d{7})\b").context("failed to compile EIN regex")?,
            employer_marker: Regex::new(
                r"(?i)employer[’'`]?s\s+name,?\s+address,?\s+and\s+zip\s+code",
            )
            .context("failed to compile employer marker regex")?,
            payroll_marker: Regex::new(r"(?i).+\s*-\s*PAYROL")
                .context("failed to compile payroll marker regex")?,
            employer_box_tail: Regex::new(r"(?i)\bb\s*employer.*$")
                .context("failed to compile employer box regex")?,
            tax_withheld_suffix: Regex::new(r"(?i)\s*TAX WITHHELD\s*$")
                .context("failed to compile tax-withheld regex")?,
            trailing_numbers: Regex::new(r"(?:\s+\d+(?:[.,]\d+)*)+\s*$")
                .context("failed to compile trailing-number regex")?,
        })
    }

    pub fn parse(&self, text: &str) -> W2Info {
        let lines = text.lines().collect::<Vec<&str>>();
        let block = first_match(self, Self::STRATEGIES, &lines, |block| {
            !block.name.trim().is_empty()
        });

        W2Info {
            ssn: self
                .ssn
                .captures(text)
                .and_then(|captures| captures.get(1))
                .map(|value| value.as_str().to_string()),
            ein: self
                .ein
                .captures(text)
                .and_then(|captures| captures.get(1))
                .map(|value| value.as_str().to_string()),
            employer_name: block.as_ref().map(|block| block.name.clone()),
            employer_address: block.and_then(|block| block.address),
        }
    }

    pub fn bookmark(&self, text: &str) -> String {
        let info = self.parse(text);
        debug!(
            ssn_found = info.ssn.is_some(),
            ein = info.ein_or_na(),
            employer_address = info.address_or_na(),
            "parsed W-2 fields"
        );
        info.employer_name
            .unwrap_or_else(|| forms::W2.to_string())
    }

    fn known_employer(&self, lines: &[&str]) -> Option<EmployerBlock> {
        apply_overrides(&self.overrides, lines).map(|name| EmployerBlock {
            name,
            address: None,
        })
    }

    fn employer_marker_block(&self, lines: &[&str]) -> Option<EmployerBlock> {
        let marker_index = lines
            .iter()
            .position(|line| self.employer_marker.is_match(line))?;
        let (name_index, raw) = self.next_name_line(lines, marker_index + 1)?;

        let name = self.normalize_entity_name(&dedupe_tokens(raw));
        Some(EmployerBlock {
            name,
            address: self.next_name_line(lines, name_index + 1).map(|(_, line)| line.to_string()),
        })
    }

    fn employer_name_caption(&self, lines: &[&str]) -> Option<EmployerBlock> {
        let caption_index = lines.iter().position(|line| {
            let lower = line.to_lowercase();
            lower.contains("employer") && lower.contains("name")
        })?;
        let (name_index, raw) = next_non_blank(lines, caption_index + 1)?;

        let part = raw.split('|').map(str::trim).find(|part| {
            !part.is_empty()
                && part.chars().any(char::is_alphabetic)
                && !part.starts_with(|character: char| character.is_ascii_digit())
        })?;

        let mut seen = Vec::<String>::new();
        let name = self
            .normalize_entity_name(part)
            .split_whitespace()
            .filter(|word| {
                if seen.iter().any(|previous| previous == word) {
                    return false;
                }
                seen.push(word.to_string());
                true
            })
            .collect::<Vec<&str>>()
            .join(" ")
            .trim_end_matches(['\\', '/'])
            .to_string();

        Some(EmployerBlock {
            name,
            address: next_non_blank(lines, name_index + 1).map(|(_, line)| line.to_string()),
        })
    }

    fn payroll_provider_block(&self, lines: &[&str]) -> Option<EmployerBlock> {
        let marker_index = lines
            .iter()
            .position(|line| self.payroll_marker.is_match(line))?;
        let (_, raw) = self.next_name_line(lines, marker_index + 1)?;
        let raw = self.employer_box_tail.replace(raw, "");

        Some(EmployerBlock {
            name: self.normalize_entity_name(raw.trim()),
            address: None,
        })
    }

    fn next_name_line<'a>(&self, lines: &[&'a str], start: usize) -> Option<(usize, &'a str)> {
        lines
            .iter()
            .enumerate()
            .skip(start)
            .map(|(index, line)| (index, line.trim()))
            .filter(|(_, line)| !line.is_empty())
            .take(LOOKAHEAD_LINES)
            .find(|(_, line)| {
                let lower = line.to_lowercase();
                !self.employer_marker.is_match(line)
                    && !JUNK_PHRASES.iter().any(|phrase| lower.contains(phrase))
                    && alphabetic_count(line) >= 2
            })
    }

    pub fn normalize_entity_name(&self, raw: &str) -> String {
        let without_ids = self.ein.replace_all(&self.ssn.replace_all(raw, ""), "").into_owned();

        let words = without_ids.split_whitespace().collect::<Vec<&str>>();
        let words = collapse_whole_line_repeat(&words);
        let mut name = collapse_adjacent_repeats(words).join(" ");

        loop {
            let stripped = self.tax_withheld_suffix.replace(&name, "");
            let stripped = self.trailing_numbers.replace(&stripped, "").into_owned();
            if stripped == name {
                break;
            }
            name = stripped;
        }

        name.split_whitespace().collect::<Vec<&str>>().join(" ")
    }
}

fn dedupe_tokens(raw: &str) -> String {
    let mut seen = Vec::<String>::new();
    let mut tokens = Vec::<&str>::new();
    for part in raw.split(['|', '[', ']', '{', '}']) {
        for word in part.split_whitespace() {
            let folded = word.to_lowercase();
            if !seen.contains(&folded) {
                seen.push(folded);
                tokens.push(word);
            }
        }
    }
    tokens.join(" ")
}

fn same_words(left: &[&str], right: &[&str]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(a, b)| a.to_lowercase() == b.to_lowercase())
}

fn collapse_whole_line_repeat<'a>(words: &[&'a str]) -> Vec<&'a str> {
    let count = words.len();
    for unit in 1..=count / 2 {
        if count % unit != 0 {
            continue;
        }
        let first = &words[..unit];
        if words.chunks(unit).all(|chunk| same_words(chunk, first)) {
            return first.to_vec();
        }
    }
    words.to_vec()
}

fn collapse_adjacent_repeats(words: Vec<&str>) -> Vec<&str> {
    let mut collapsed = Vec::with_capacity(words.len());
    let mut index = 0usize;

    while index < words.len() {
        let remaining = words.len() - index;
        let mut advanced = false;

        for unit in 1..=remaining / 2 {
            let run = &words[index..index + unit];
            let mut next = index + unit;
            while next + unit <= words.len() && same_words(run, &words[next..next + unit]) {
                next += unit;
            }
            if next > index + unit {
                collapsed.extend_from_slice(run);
                index = next;
                advanced = true;
                break;
            }
        }

        if !advanced {
            collapsed.push(words[index]);
            index += 1;
        }
    }

    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_line_repeat_collapses_to_one_copy() {
        assert_eq!(
            collapse_whole_line_repeat(&["Acme", "Corp", "ACME", "CORP", "acme", "corp"]),
            vec!["Acme", "Corp"]
        );
        assert_eq!(
            collapse_whole_line_repeat(&["Acme", "Corp", "Inc"]),
            vec!["Acme", "Corp", "Inc"]
        );
    }

    #[test]
    fn adjacent_repeats_collapse_single_and_multi_word_runs() {
        assert_eq!(
            collapse_adjacent_repeats(vec!["ACME", "ACME", "CORP"]),
            vec!["ACME", "CORP"]
        );
        assert_eq!(
            collapse_adjacent_repeats(vec!["BIG", "CO", "BIG", "CO", "LLC"]),
            vec!["BIG", "CO", "LLC"]
        );
    }

    #[test]
    fn dedupe_tokens_splits_on_border_glyphs() {
        assert_eq!(dedupe_tokens("ACME CORP | acme corp |[ ACME"), "ACME CORP");
    }
}
