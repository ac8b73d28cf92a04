use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use tracing::{debug, warn};

use crate::config::ExtractionConfig;
use crate::model::{DocumentKind, PageRef, SourceDocument};
use crate::util::non_whitespace_char_count;

mod lopdf_text;
mod ocr;
mod poppler;

pub use lopdf_text::LopdfText;
pub use ocr::TesseractOcr;
pub use poppler::{Pdftotext, PdftotextMode};

pub const NO_BACKEND: &str = "none";

pub trait TextBackend {
    fn name(&self) -> &'static str;

    fn extract(&mut self, pdf_path: &Path, page_index: usize) -> Result<String>;

    fn finish_document(&mut self, _pdf_path: &Path) {}
}

pub trait OcrEngine {
    fn name(&self) -> &'static str;

    fn recognize_pdf_page(&mut self, pdf_path: &Path, page_index: usize, dpi: u32)
    -> Result<String>;

    fn recognize_image(&mut self, image_path: &Path) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub text: String,
    pub backend: &'static str,
}

impl ExtractionResult {
    fn empty() -> Self {
        Self {
            text: String::new(),
            backend: NO_BACKEND,
        }
    }

    pub fn char_count(&self) -> usize {
        non_whitespace_char_count(&self.text)
    }

    fn offer(&mut self, backend: &'static str, text: String) -> bool {
        if non_whitespace_char_count(&text) > self.char_count() {
            self.text = text;
            self.backend = backend;
            return true;
        }
        false
    }
}

pub struct PageTextExtractor {
    backends: Vec<Box<dyn TextBackend>>,
    ocr: Box<dyn OcrEngine>,
    ocr_min_chars: usize,
    ocr_dpi: u32,
    cache: HashMap<PageRef, ExtractionResult>,
}

impl PageTextExtractor {
    pub fn new(
        backends: Vec<Box<dyn TextBackend>>,
        ocr: Box<dyn OcrEngine>,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            backends,
            ocr,
            ocr_min_chars: config.ocr_min_chars,
            ocr_dpi: config.ocr_dpi,
            cache: HashMap::new(),
        }
    }

    pub fn with_system_tools(config: &ExtractionConfig) -> Self {
        let backends: Vec<Box<dyn TextBackend>> = vec![
            Box::new(Pdftotext::new(config, PdftotextMode::Layout)),
            Box::new(Pdftotext::new(config, PdftotextMode::Raw)),
            Box::new(LopdfText::default()),
        ];
        Self::new(backends, Box::new(TesseractOcr::new(config)), config)
    }

    pub fn page_text(&mut self, document: &SourceDocument, page_index: usize) -> &ExtractionResult {
        let page = document.page(page_index);
        if !self.cache.contains_key(&page) {
            let result = match document.kind {
                DocumentKind::Pdf => self.extract_pdf_page(&document.path, page_index),
                DocumentKind::Image => self.extract_image(&document.path),
            };
            debug!(
                page = %page,
                backend = result.backend,
                chars = result.char_count(),
                "extracted page text"
            );
            self.cache.insert(page.clone(), result);
        }

        &self.cache[&page]
    }

    pub fn finish_document(&mut self, document: &SourceDocument) {
        for backend in &mut self.backends {
            backend.finish_document(&document.path);
        }
    }

    fn extract_pdf_page(&mut self, pdf_path: &Path, page_index: usize) -> ExtractionResult {
        let mut best = ExtractionResult::empty();

        for backend in &mut self.backends {
            match backend.extract(pdf_path, page_index) {
                Ok(text) => {
                    best.offer(backend.name(), text);
                }
                Err(error) => {
                    debug!(
                        backend = backend.name(),
                        file = %pdf_path.display(),
                        page = page_index + 1,
                        error = %error,
                        "text backend failed"
                    );
                }
            }
        }

        if best.char_count() >= self.ocr_min_chars {
            return best;
        }

        debug!(
            file = %pdf_path.display(),
            page = page_index + 1,
            chars = best.char_count(),
            threshold = self.ocr_min_chars,
            dpi = self.ocr_dpi,
            "text layer below threshold; running OCR"
        );
        match self
            .ocr
            .recognize_pdf_page(pdf_path, page_index, self.ocr_dpi)
        {
            Ok(text) => {
                if best.offer(self.ocr.name(), text) {
                    debug!(chars = best.char_count(), "adopted OCR text");
                }
            }
            Err(error) => {
                warn!(
                    file = %pdf_path.display(),
                    page = page_index + 1,
                    error = %error,
                    "OCR fallback failed"
                );
            }
        }

        best
    }

    fn extract_image(&mut self, image_path: &Path) -> ExtractionResult {
        let mut best = ExtractionResult::empty();
        match self.ocr.recognize_image(image_path) {
            Ok(text) => {
                best.offer(self.ocr.name(), text);
            }
            Err(error) => {
                warn!(file = %image_path.display(), error = %error, "image OCR failed");
            }
        }
        best
    }
}
