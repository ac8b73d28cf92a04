use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub mod forms {
    pub const W2: &str = "W-2";
    pub const INT_1099: &str = "1099-INT";
    pub const DIV_1099: &str = "1099-DIV";
    pub const OTHER_1099: &str = "1099-Other";
    pub const MORTGAGE_1098: &str = "1098-Mortgage";
    pub const TUITION_1098: &str = "1098-T";
    pub const DONATION: &str = "Donation";
    pub const RETIREMENT_1099: &str = "1099-R";
    pub const GOVERNMENT_1099: &str = "1099-G";
    pub const K1: &str = "K-1";
    pub const HSA_5498: &str = "5498-SA";
    pub const MARKETPLACE_1095: &str = "1095-A";
    pub const COVERAGE_1095: &str = "1095-B";
    pub const EMPLOYER_COVERAGE_1095: &str = "1095-C";
    pub const PROPERTY_TAX: &str = "Property Tax";
    pub const PLAN_529: &str = "529-Plan";
    pub const CHILD_CARE: &str = "Child Care Expenses";
    pub const UNUSED: &str = "Unused";
    pub const DUPLICATE: &str = "Duplicate";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DocumentKind {
    Pdf,
    Image,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "pdf" => Some(Self::Pdf),
            "png" | "jpg" | "jpeg" | "tiff" => Some(Self::Image),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub kind: DocumentKind,
}

impl SourceDocument {
    pub fn file_name(&self) -> String {
        display_name(&self.path)
    }

    pub fn page(&self, page_index: usize) -> PageRef {
        PageRef::new(self.path.clone(), page_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageRef {
    pub document: PathBuf,
    pub page_index: usize,
}

impl PageRef {
    pub fn new(document: impl Into<PathBuf>, page_index: usize) -> Self {
        Self {
            document: document.into(),
            page_index,
        }
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} p{}", display_name(&self.document), self.page_index + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Income,
    Expenses,
    Others,
    Unknown,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expenses => "Expenses",
            Self::Others => "Others",
            Self::Unknown => "Unknown",
        }
    }

    pub fn bucket(self) -> Self {
        match self {
            Self::Unknown => Self::Others,
            other => other,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Classification {
    pub category: Category,
    pub form_type: String,
}

impl Classification {
    pub fn new(category: Category, form_type: &str) -> Self {
        Self {
            category,
            form_type: form_type.to_string(),
        }
    }

    pub fn unused() -> Self {
        Self::new(Category::Others, forms::UNUSED)
    }

    pub fn duplicate() -> Self {
        Self::new(Category::Others, forms::DUPLICATE)
    }
}

#[derive(Debug, Clone)]
pub struct ClassifiedPage {
    pub page: PageRef,
    pub classification: Classification,
    pub entity_label: Option<String>,
    pub backend: &'static str,
    pub text_chars: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub file_name: String,
    pub reason: String,
}

/// An input whose bytes match an earlier input. Its pages are merged under
/// Others / Duplicate without being classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateFile {
    pub file_name: String,
    pub duplicate_of: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicatePage {
    pub file_name: String,
    pub page: usize,
    pub duplicate_of: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReportRow {
    pub file_name: String,
    pub page: usize,
    pub category: Category,
    pub form_type: String,
    pub label: String,
    pub backend: String,
    pub text_chars: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub report_version: u32,
    pub generated_at: String,
    pub input_dir: String,
    pub output_pdf: Option<String>,
    pub output_page_count: Option<usize>,
    pub skipped_files: Vec<SkippedFile>,
    pub duplicate_files: Vec<DuplicateFile>,
    pub duplicate_pages: Vec<DuplicatePage>,
    pub pages: Vec<PageReportRow>,
}

pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
