use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, warn};

use crate::grouping::OutlinePlan;
use crate::model::PageRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookmarkId(pub usize);

/// Receives pages and bookmarks in output order. `page_number` is the
/// zero-based position in the merged output.
pub trait MergeSink {
    fn append_page(&mut self, page: &PageRef) -> Result<()>;

    fn add_bookmark(&mut self, title: &str, page_number: usize, parent: Option<BookmarkId>) -> BookmarkId;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineSummary {
    pub page_count: usize,
    pub bookmark_count: usize,
    pub failed_pages: Vec<PageRef>,
}

struct OutlineAssembler<'a, S: MergeSink> {
    sink: &'a mut S,
    next_page: usize,
    placed: HashMap<PageRef, usize>,
    summary: OutlineSummary,
}

impl<'a, S: MergeSink> OutlineAssembler<'a, S> {
    fn new(sink: &'a mut S) -> Self {
        Self {
            sink,
            next_page: 0,
            placed: HashMap::new(),
            summary: OutlineSummary::default(),
        }
    }

    fn node(&mut self, title: &str, parent: Option<BookmarkId>) -> BookmarkId {
        self.summary.bookmark_count += 1;
        self.sink.add_bookmark(title, self.next_page, parent)
    }

    fn append_and_bookmark(&mut self, page: &PageRef, parent: BookmarkId, title: &str) {
        let page_number = match self.placed.get(page).copied() {
            Some(existing) => existing,
            None => {
                if let Err(err) = self.sink.append_page(page) {
                    warn!(page = %page, error = %err, "failed to append page; skipping");
                    self.summary.failed_pages.push(page.clone());
                    return;
                }
                let page_number = self.next_page;
                self.placed.insert(page.clone(), page_number);
                self.next_page += 1;
                page_number
            }
        };

        debug!(page = %page, output_page = page_number + 1, title, "bookmark");
        self.summary.bookmark_count += 1;
        self.sink.add_bookmark(title, page_number, Some(parent));
    }

    fn finish(mut self) -> OutlineSummary {
        self.summary.page_count = self.next_page;
        self.summary
    }
}

pub fn assemble<S: MergeSink>(plan: &OutlinePlan, sink: &mut S) -> OutlineSummary {
    let mut assembler = OutlineAssembler::new(sink);

    for section in &plan.sections {
        let root = assembler.node(section.category.as_str(), None);
        for group in &section.groups {
            let node = assembler.node(&group.form_type, Some(root));
            for leaf in &group.leaves {
                assembler.append_and_bookmark(&leaf.page, node, &leaf.label);
            }
        }
    }

    assembler.finish()
}
