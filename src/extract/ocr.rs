use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};

use super::OcrEngine;
use super::poppler::clean_command_text;
use crate::config::ExtractionConfig;

#[derive(Debug, Clone)]
pub struct TesseractOcr {
    pdftoppm: PathBuf,
    tesseract: String,
    lang: String,
    psm: u32,
}

impl TesseractOcr {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            pdftoppm: config.poppler_program("pdftoppm"),
            tesseract: config.tesseract_cmd.clone(),
            lang: config.ocr_lang.clone(),
            psm: config.ocr_psm,
        }
    }

    fn run_tesseract(&self, image_path: &Path) -> Result<String> {
        let output = Command::new(&self.tesseract)
            .arg(image_path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.lang)
            .arg("--psm")
            .arg(self.psm.to_string())
            .output()
            .with_context(|| format!("failed to execute tesseract for {}", image_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "tesseract returned non-zero exit status for {}: {}",
                image_path.display(),
                stderr.trim()
            );
        }

        Ok(clean_command_text(&output.stdout))
    }
}

impl OcrEngine for TesseractOcr {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn recognize_pdf_page(
        &mut self,
        pdf_path: &Path,
        page_index: usize,
        dpi: u32,
    ) -> Result<String> {
        let page_number = (page_index + 1).to_string();
        let scratch = tempfile::Builder::new()
            .prefix("taxmerge_ocr_")
            .tempdir()
            .context("failed to create OCR scratch directory")?;
        let output_root = scratch.path().join("page");
        let png_path = scratch.path().join("page.png");

        let pdftoppm_output = Command::new(&self.pdftoppm)
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-f")
            .arg(&page_number)
            .arg("-l")
            .arg(&page_number)
            .arg("-singlefile")
            .arg("-png")
            .arg(pdf_path)
            .arg(&output_root)
            .output()
            .with_context(|| format!("failed to execute pdftoppm for {}", pdf_path.display()))?;

        if !pdftoppm_output.status.success() {
            let stderr = String::from_utf8_lossy(&pdftoppm_output.stderr);
            bail!(
                "pdftoppm returned non-zero exit status for {} page {}: {}",
                pdf_path.display(),
                page_number,
                stderr.trim()
            );
        }

        if !png_path.exists() {
            bail!(
                "pdftoppm did not produce expected image for {} page {}",
                pdf_path.display(),
                page_number
            );
        }

        self.run_tesseract(&png_path)
    }

    fn recognize_image(&mut self, image_path: &Path) -> Result<String> {
        self.run_tesseract(image_path)
    }
}
