use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

pub const DEFAULT_OCR_MIN_CHARS: usize = 80;
pub const DEFAULT_OCR_DPI: u32 = 260;
pub const DEFAULT_OCR_LANG: &str = "eng";
pub const DEFAULT_OCR_PSM: u32 = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionConfig {
    pub ocr_min_chars: usize,
    pub ocr_dpi: u32,
    pub ocr_lang: String,
    pub ocr_psm: u32,
    pub poppler_dir: Option<PathBuf>,
    pub tesseract_cmd: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_min_chars: DEFAULT_OCR_MIN_CHARS,
            ocr_dpi: DEFAULT_OCR_DPI,
            ocr_lang: DEFAULT_OCR_LANG.to_string(),
            ocr_psm: DEFAULT_OCR_PSM,
            poppler_dir: None,
            tesseract_cmd: "tesseract".to_string(),
        }
    }
}

impl ExtractionConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        Ok(Self {
            ocr_min_chars: parse_or(value("TAXMERGE_OCR_MIN_CHARS"), "TAXMERGE_OCR_MIN_CHARS", defaults.ocr_min_chars)?,
            ocr_dpi: parse_or(value("TAXMERGE_OCR_DPI"), "TAXMERGE_OCR_DPI", defaults.ocr_dpi)?,
            ocr_lang: value("TAXMERGE_OCR_LANG").unwrap_or(defaults.ocr_lang),
            ocr_psm: parse_or(value("TAXMERGE_OCR_PSM"), "TAXMERGE_OCR_PSM", defaults.ocr_psm)?,
            poppler_dir: value("TAXMERGE_POPPLER_PATH")
                .or_else(|| value("POPPLER_PATH"))
                .map(PathBuf::from),
            tesseract_cmd: value("TAXMERGE_TESSERACT").unwrap_or(defaults.tesseract_cmd),
        })
    }

    pub fn poppler_program(&self, program: &str) -> PathBuf {
        match &self.poppler_dir {
            Some(dir) => dir.join(program),
            None => PathBuf::from(program),
        }
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<String, String>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ExtractionConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ExtractionConfig::default());
        assert_eq!(config.ocr_min_chars, 80);
        assert_eq!(config.ocr_dpi, 260);
        assert_eq!(config.ocr_psm, 6);
    }

    #[test]
    fn overrides_are_applied_and_poppler_path_falls_back() {
        let config = ExtractionConfig::from_lookup(lookup_from(&[
            ("TAXMERGE_OCR_MIN_CHARS", "120"),
            ("TAXMERGE_OCR_DPI", " 300 "),
            ("TAXMERGE_OCR_LANG", "eng+spa"),
            ("POPPLER_PATH", "/opt/poppler/bin"),
        ]))
        .unwrap();

        assert_eq!(config.ocr_min_chars, 120);
        assert_eq!(config.ocr_dpi, 300);
        assert_eq!(config.ocr_lang, "eng+spa");
        assert_eq!(
            config.poppler_program("pdftotext"),
            PathBuf::from("/opt/poppler/bin/pdftotext")
        );
    }

    #[test]
    fn invalid_number_names_the_variable() {
        let err = ExtractionConfig::from_lookup(lookup_from(&[("TAXMERGE_OCR_DPI", "high")]))
            .unwrap_err();
        assert!(err.to_string().contains("TAXMERGE_OCR_DPI"));
    }
}
