use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};

use super::TextBackend;
use crate::config::ExtractionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdftotextMode {
    Layout,
    Raw,
}

#[derive(Debug, Clone)]
pub struct Pdftotext {
    program: PathBuf,
    mode: PdftotextMode,
}

impl Pdftotext {
    pub fn new(config: &ExtractionConfig, mode: PdftotextMode) -> Self {
        Self {
            program: config.poppler_program("pdftotext"),
            mode,
        }
    }
}

impl TextBackend for Pdftotext {
    fn name(&self) -> &'static str {
        match self.mode {
            PdftotextMode::Layout => "pdftotext-layout",
            PdftotextMode::Raw => "pdftotext-raw",
        }
    }

    fn extract(&mut self, pdf_path: &Path, page_index: usize) -> Result<String> {
        let page_number = (page_index + 1).to_string();
        let mode_flag = match self.mode {
            PdftotextMode::Layout => "-layout",
            PdftotextMode::Raw => "-raw",
        };

        let output = Command::new(&self.program)
            .arg(mode_flag)
            .arg("-enc")
            .arg("UTF-8")
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg(pdf_path)
            .arg("-")
            .output()
            .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftotext returned non-zero exit status for {} page {}: {}",
                pdf_path.display(),
                page_number,
                stderr.trim()
            );
        }

        Ok(clean_command_text(&output.stdout))
    }
}

pub(crate) fn clean_command_text(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .chars()
        .filter(|character| *character != '\u{0000}' && *character != '\u{000C}')
        .collect()
}
