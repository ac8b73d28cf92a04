use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lopdf::Document;

use super::TextBackend;

#[derive(Default)]
pub struct LopdfText {
    loaded: Option<(PathBuf, Document)>,
}

impl LopdfText {
    fn document(&mut self, pdf_path: &Path) -> Result<&Document> {
        let reload = !matches!(&self.loaded, Some((loaded, _)) if loaded == pdf_path);
        if reload {
            self.loaded = None;
            let document = Document::load(pdf_path)
                .with_context(|| format!("failed to parse {}", pdf_path.display()))?;
            self.loaded = Some((pdf_path.to_path_buf(), document));
        }

        let (_, document) = self
            .loaded
            .as_ref()
            .with_context(|| format!("no document loaded for {}", pdf_path.display()))?;
        Ok(document)
    }
}

impl TextBackend for LopdfText {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract(&mut self, pdf_path: &Path, page_index: usize) -> Result<String> {
        let page_number = u32::try_from(page_index + 1)
            .with_context(|| format!("page index out of range: {page_index}"))?;
        let document = self.document(pdf_path)?;
        document.extract_text(&[page_number]).with_context(|| {
            format!(
                "lopdf text extraction failed for {} page {}",
                pdf_path.display(),
                page_number
            )
        })
    }

    fn finish_document(&mut self, pdf_path: &Path) {
        if matches!(&self.loaded, Some((loaded, _)) if loaded == pdf_path) {
            self.loaded = None;
        }
    }
}
