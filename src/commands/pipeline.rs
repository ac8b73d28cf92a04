use std::collections::HashMap;
use std::path::Path;

use tracing::{error, info, warn};

use crate::classify::classify;
use crate::commands::inventory::Inventory;
use crate::extract::PageTextExtractor;
use crate::grouping::OutlinePlan;
use crate::labels::LabelExtractors;
use crate::model::{
    Classification, ClassifiedPage, DocumentKind, DuplicateFile, DuplicatePage, PageRef, PageReportRow,
    RunReport, SkippedFile, SourceDocument, display_name,
};
use crate::pdf_merge::pdf_page_count;
use crate::util::{now_utc_string, sha256_text};

const UNEXTRACTED_BACKEND: &str = "none";

const REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Default)]
pub struct ClassifiedRun {
    pub pages: Vec<ClassifiedPage>,
    pub processed: Vec<SourceDocument>,
    pub skipped: Vec<SkippedFile>,
    pub duplicate_files: Vec<DuplicateFile>,
    pub duplicate_pages: Vec<DuplicatePage>,
}

impl ClassifiedRun {
    fn open(&mut self, document: &SourceDocument) -> Option<usize> {
        match document_page_count(document) {
            Ok(page_count) => Some(page_count),
            Err(err) => {
                error!(file = %document.file_name(), error = %err, "failed to open document; skipping");
                self.skipped.push(SkippedFile {
                    file_name: document.file_name(),
                    reason: format!("unreadable: {err}"),
                });
                None
            }
        }
    }
}

pub fn classify_documents(
    inventory: &Inventory,
    extractor: &mut PageTextExtractor,
    labels: &LabelExtractors,
) -> ClassifiedRun {
    let mut run = ClassifiedRun {
        skipped: inventory.skipped.clone(),
        ..ClassifiedRun::default()
    };
    let mut seen_text: HashMap<String, PageRef> = HashMap::new();

    for document in &inventory.documents {
        let Some(page_count) = run.open(document) else {
            continue;
        };

        for page_index in 0..page_count {
            let (page, duplicate_of) =
                classify_page(document, page_index, extractor, labels, &mut seen_text);
            if let Some(first) = duplicate_of {
                run.duplicate_pages.push(DuplicatePage {
                    file_name: document.file_name(),
                    page: page_index + 1,
                    duplicate_of: first.to_string(),
                });
            }
            run.pages.push(page);
        }
        extractor.finish_document(document);
        run.processed.push(document.clone());
    }

    for duplicate in &inventory.duplicates {
        let document = &duplicate.document;
        let Some(page_count) = run.open(document) else {
            continue;
        };

        info!(
            file = %document.file_name(),
            duplicate_of = %duplicate.duplicate_of,
            pages = page_count,
            "filing duplicate file under Duplicate"
        );
        run.pages.extend((0..page_count).map(|page_index| ClassifiedPage {
            page: document.page(page_index),
            classification: Classification::duplicate(),
            entity_label: None,
            backend: UNEXTRACTED_BACKEND,
            text_chars: 0,
        }));
        run.duplicate_files.push(duplicate.record());
        run.processed.push(document.clone());
    }

    run
}

fn document_page_count(document: &SourceDocument) -> anyhow::Result<usize> {
    match document.kind {
        DocumentKind::Pdf => pdf_page_count(&document.path),
        DocumentKind::Image => Ok(1),
    }
}

/// The classified page, plus the earlier page it repeats when its text is a
/// duplicate. Blank pages are never treated as duplicates.
fn classify_page(
    document: &SourceDocument,
    page_index: usize,
    extractor: &mut PageTextExtractor,
    labels: &LabelExtractors,
    seen_text: &mut HashMap<String, PageRef>,
) -> (ClassifiedPage, Option<PageRef>) {
    let extracted = extractor.page_text(document, page_index);
    let page = document.page(page_index);

    let duplicate_of = if extracted.char_count() == 0 {
        None
    } else {
        let digest = sha256_text(&extracted.text);
        match seen_text.get(&digest) {
            Some(first) => Some(first.clone()),
            None => {
                seen_text.insert(digest, page.clone());
                None
            }
        }
    };

    let (classification, entity_label) = match &duplicate_of {
        Some(first) => {
            warn!(page = %page, duplicate_of = %first, "duplicate page text; filing under Duplicate");
            (Classification::duplicate(), None)
        }
        None => {
            let classification = classify(&extracted.text);
            let entity_label = labels.entity_label(&classification.form_type, &extracted.text);
            (classification, entity_label)
        }
    };

    info!(
        file = %document.file_name(),
        page = page_index + 1,
        category = %classification.category,
        form = %classification.form_type,
        backend = extracted.backend,
        label = entity_label.as_deref().unwrap_or("-"),
        "classified page"
    );

    let classified = ClassifiedPage {
        page,
        classification,
        entity_label,
        backend: extracted.backend,
        text_chars: extracted.char_count(),
    };
    (classified, duplicate_of)
}

pub fn build_report(
    input_dir: &Path,
    output_pdf: Option<&Path>,
    output_page_count: Option<usize>,
    run: &ClassifiedRun,
    plan: &OutlinePlan,
) -> RunReport {
    let pages = run
        .pages
        .iter()
        .map(|page| PageReportRow {
            file_name: display_name(&page.page.document),
            page: page.page.page_index + 1,
            category: page.classification.category,
            form_type: page.classification.form_type.clone(),
            label: plan
                .label_for(&page.page)
                .unwrap_or(&page.classification.form_type)
                .to_string(),
            backend: page.backend.to_string(),
            text_chars: page.text_chars,
        })
        .collect();

    RunReport {
        report_version: REPORT_VERSION,
        generated_at: now_utc_string(),
        input_dir: input_dir.display().to_string(),
        output_pdf: output_pdf.map(|path| path.display().to_string()),
        output_page_count,
        skipped_files: run.skipped.clone(),
        duplicate_files: run.duplicate_files.clone(),
        duplicate_pages: run.duplicate_pages.clone(),
        pages,
    }
}
