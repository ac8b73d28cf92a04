use anyhow::{Context, Result};
use regex::Regex;

use super::{Strategy, first_label};
use crate::model::forms;

const PAYER_LOOKAHEAD: usize = 5;

pub struct RetirementPayer {
    section_end: Regex,
    retirement_or: Regex,
    noise: Vec<Regex>,
    address: Regex,
    continuation_blocker: Regex,
    continuation_shape: Regex,
}

impl RetirementPayer {
    const STRATEGIES: &'static [Strategy<Self, String>] = &[Self::payer_block];

    pub fn new() -> Result<Self> {
        let noise = [
            r"\s*(?i:retirement\s*or)\s*$",
            r"\$?\d.*$",
            r"(?i)\bform\s*1099.*$",
            r"(?i)\bcontracts.*$",
            r"(?i)\binsurance.*$",
        ]
        .iter()
        .map(|pattern| {
            Regex::new(pattern).with_context(|| format!("failed to compile 1099-R noise pattern {pattern:?}"))
        })
        .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            section_end: Regex::new(r"(?i)recipient's|account number|department|form\s*1099|treasury|omb\s*no")
                .context("failed to compile 1099-R section-end regex")?,
            retirement_or: Regex::new(r"(?i)^retirement\s*or$").context("failed to compile retirement regex")?,
            noise,
            address: Regex::new(r"(?i)\b(?:street|city|state|zip|address|drive|road|way|blvd)\b")
                .context("failed to compile address regex")?,
            continuation_blocker: Regex::new(r"(?i)\d|\b(?:city|state|zip|address|form|recipient|account)\b")
                .context("failed to compile continuation regex")?,
            continuation_shape: Regex::new(r"^[A-Z][A-Z\s&.,'-]{3,}$")
                .context("failed to compile continuation-shape regex")?,
        })
    }

    pub fn bookmark(&self, text: &str) -> String {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<&str>>();
        first_label(self, Self::STRATEGIES, &lines).unwrap_or_else(|| forms::RETIREMENT_1099.to_string())
    }

    fn payer_block(&self, lines: &[&str]) -> Option<String> {
        let header = lines.iter().position(|line| {
            let lower = line.to_lowercase();
            (lower.contains("country") && lower.contains("telephone"))
                || (lower.contains("payer") && lower.contains("name"))
        })?;

        for offset in 1..=PAYER_LOOKAHEAD {
            let index = header + offset;
            let candidate = lines.get(index)?;
            if self.section_end.is_match(candidate) {
                return None;
            }
            if self.retirement_or.is_match(candidate) {
                continue;
            }

            let mut name = candidate.to_string();
            for pattern in &self.noise {
                name = pattern.replace(&name, "").trim().to_string();
            }
            if name.is_empty() || self.address.is_match(&name) {
                continue;
            }

            let continuation = lines.get(index + 1).filter(|next| {
                !self.continuation_blocker.is_match(next) && self.continuation_shape.is_match(next)
            });
            if let Some(next) = continuation {
                name = format!("{name} {next}");
            }

            if name.split_whitespace().count() >= 2 && !name.chars().any(|character| character.is_ascii_digit()) {
                return Some(title_case(&name));
            }
        }
        None
    }
}

pub fn title_case(raw: &str) -> String {
    let mut titled = String::with_capacity(raw.len());
    let mut previous_alphabetic = false;
    for character in raw.chars() {
        if character.is_alphabetic() {
            if previous_alphabetic {
                titled.extend(character.to_lowercase());
            } else {
                titled.extend(character.to_uppercase());
            }
            previous_alphabetic = true;
        } else {
            titled.push(character);
            previous_alphabetic = false;
        }
    }
    titled
}
