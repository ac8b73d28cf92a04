use anyhow::{Context, Result};
use regex::Regex;

use super::{
    InstitutionOverride, OverrideLabel, Strategy, apply_overrides, first_label, next_non_blank,
    strip_trailing_punctuation,
};
use crate::model::forms;

pub struct HsaTrustee {
    cut_marks: Regex,
    overrides: Vec<InstitutionOverride>,
    optum_financial: Regex,
    institution: Regex,
    two_digits: Regex,
}

impl HsaTrustee {
    const FLATTENED: &'static [Strategy<Self, String>] =
        &[Self::known_trustee, Self::optum_financial, Self::institution_name];
    const STRUCTURAL: &'static [Strategy<Self, String>] = &[Self::after_postal_caption];

    pub fn new() -> Result<Self> {
        Ok(Self {
            cut_marks: Regex::new(
                r"(?i)\b(?:do\s+not\s+cut|separate\s+forms?\s+on\s+this\s+page|see\s+instructions\s+on\s+back)\W*",
            )
            .context("failed to compile cut-mark regex")?,
            overrides: vec![InstitutionOverride::new(
                r"(?i)\b(?:optum|optun|optm|otum|tum)\s*ba(?:nk|nc|mk)\b",
                OverrideLabel::Fixed("Optum Bank"),
            )?],
            optum_financial: Regex::new(r"(?i)optum\s*financial").context("failed to compile Optum regex")?,
            institution: Regex::new(
                r"\b([A-Z][A-Za-z& ]{2,40}?(?:Care|Corporate|Corporation|Bank|Trust|LLC|Inc|Financial))\b",
            )
            .context("failed to compile trustee regex")?,
            two_digits: Regex::new(r"\d{2,}").context("failed to compile digit regex")?,
        })
    }

    pub fn bookmark(&self, text: &str) -> String {
        let flattened = text.replace('\n', " ").replace("  ", " ");
        let flattened = self.cut_marks.replace_all(&flattened, "").trim().to_string();
        let lines = text.lines().collect::<Vec<&str>>();
        first_label(self, Self::FLATTENED, &[flattened.as_str()])
            .or_else(|| first_label(self, Self::STRUCTURAL, &lines))
            .unwrap_or_else(|| forms::HSA_5498.to_string())
    }

    fn known_trustee(&self, lines: &[&str]) -> Option<String> {
        apply_overrides(&self.overrides, lines)
    }

    fn optum_financial(&self, lines: &[&str]) -> Option<String> {
        let flattened = lines.first()?;
        self.optum_financial.is_match(flattened).then(|| {
            if flattened.to_lowercase().contains("bank") {
                "Optum Bank".to_string()
            } else {
                "Optum Financial".to_string()
            }
        })
    }

    fn institution_name(&self, lines: &[&str]) -> Option<String> {
        let captures = self.institution.captures(lines.first()?)?;
        Some(captures.get(1)?.as_str().trim().to_string())
    }

    fn after_postal_caption(&self, lines: &[&str]) -> Option<String> {
        let header = lines.iter().position(|line| {
            let lower = line.to_lowercase();
            lower.contains("foreign postal code") && lower.contains("telephone")
        })?;

        let mut start = header + 1;
        while let Some((index, line)) = next_non_blank(lines, start) {
            start = index + 1;
            if self.two_digits.is_match(line) || line.to_lowercase().contains("contribution") {
                continue;
            }
            let name = strip_trailing_punctuation(line);
            if !name.is_empty() {
                return Some(name);
            }
        }
        None
    }
}
