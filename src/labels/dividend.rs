use super::{Strategy, first_label, next_non_blank, normalize_quotes, strip_trailing_punctuation};
use crate::model::forms;

const PAYER_CAPTION: &str = "payer's name, street address, city or town, state or province, \
                             country, zip or foreign postal code, and telephone no.";

#[derive(Debug, Default)]
pub struct DividendPayer;

impl DividendPayer {
    const STRATEGIES: &'static [Strategy<Self, String>] = &[
        Self::after_payer_caption,
        Self::after_payer_header,
        Self::after_recipient_header,
    ];

    pub fn new() -> Self {
        Self
    }

    pub fn bookmark(&self, text: &str) -> String {
        let normalized = normalize_quotes(text);
        let lines = normalized.lines().collect::<Vec<&str>>();
        first_label(self, Self::STRATEGIES, &lines).unwrap_or_else(|| forms::DIV_1099.to_string())
    }

    fn after_payer_caption(&self, lines: &[&str]) -> Option<String> {
        line_after(lines, |lower| lower.contains(PAYER_CAPTION))
    }

    fn after_payer_header(&self, lines: &[&str]) -> Option<String> {
        line_after(lines, |lower| {
            lower.contains("payer's name") && lower.contains("street address")
        })
    }

    fn after_recipient_header(&self, lines: &[&str]) -> Option<String> {
        line_after(lines, |lower| {
            lower.contains("recipient's name") && lower.contains("street address")
        })
    }
}

fn line_after(lines: &[&str], is_header: impl Fn(&str) -> bool) -> Option<String> {
    let header_index = lines
        .iter()
        .position(|line| is_header(line.to_lowercase().as_str()))?;
    next_non_blank(lines, header_index + 1).map(|(_, line)| strip_trailing_punctuation(line))
}
