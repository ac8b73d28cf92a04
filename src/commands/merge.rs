use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::MergeArgs;
use crate::commands::inventory::{self, Inventory};
use crate::commands::pipeline::{ClassifiedRun, build_report, classify_documents};
use crate::config::ExtractionConfig;
use crate::extract::PageTextExtractor;
use crate::grouping::{OutlinePlan, build_plan};
use crate::labels::LabelExtractors;
use crate::model::SourceDocument;
use crate::outline::{OutlineSummary, assemble};
use crate::pdf_merge::{LopdfMerger, MergeOutcome};
use crate::util::write_json_pretty;

pub fn run(args: MergeArgs) -> Result<()> {
    let config = ExtractionConfig::from_env()?;
    let output_pdf = inventory::resolve_output_path(&args.input_dir, &args.output_pdf)?;
    let inventory = inventory::build_inventory(&args.input_dir, Some(&output_pdf))?;

    let mut extractor = PageTextExtractor::with_system_tools(&config);
    let labels = LabelExtractors::new()?;
    let merged = merge_inventory(&inventory, &output_pdf, &mut extractor, &labels)?;

    if let Some(report_path) = &args.report_path {
        let report = build_report(
            &inventory.input_dir,
            Some(&output_pdf),
            Some(merged.outcome.page_count),
            &merged.run,
            &merged.plan,
        );
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote run report");
    }

    if args.delete_inputs {
        delete_inputs(&merged.deletable_inputs());
    }

    Ok(())
}

#[derive(Debug)]
pub struct MergedRun {
    pub run: ClassifiedRun,
    pub plan: OutlinePlan,
    pub summary: OutlineSummary,
    pub outcome: MergeOutcome,
}

impl MergedRun {
    pub fn deletable_inputs(&self) -> Vec<PathBuf> {
        let failed = self
            .summary
            .failed_pages
            .iter()
            .map(|page| page.document.as_path())
            .collect::<HashSet<&Path>>();
        self.run
            .processed
            .iter()
            .filter(|document| !failed.contains(document.path.as_path()))
            .map(|document: &SourceDocument| document.path.clone())
            .collect()
    }
}

pub fn merge_inventory(
    inventory: &Inventory,
    output_pdf: &Path,
    extractor: &mut PageTextExtractor,
    labels: &LabelExtractors,
) -> Result<MergedRun> {
    let run = classify_documents(inventory, extractor, labels);
    let plan = build_plan(&run.pages);

    let mut merger = LopdfMerger::new();
    let summary = assemble(&plan, &mut merger);
    let outcome = merger.save(output_pdf)?;

    info!(
        output = %output_pdf.display(),
        pages = outcome.page_count,
        bookmarks = outcome.bookmark_count,
        failed_pages = summary.failed_pages.len(),
        "merged pdf written"
    );

    Ok(MergedRun {
        run,
        plan,
        summary,
        outcome,
    })
}

fn delete_inputs(paths: &[PathBuf]) {
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => info!(file = %path.display(), "deleted input"),
            Err(err) => warn!(file = %path.display(), error = %err, "failed to delete input"),
        }
    }
}
