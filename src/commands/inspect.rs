use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::InspectArgs;
use crate::commands::inventory;
use crate::commands::pipeline::{build_report, classify_documents};
use crate::config::ExtractionConfig;
use crate::extract::PageTextExtractor;
use crate::grouping::{OutlinePlan, build_plan};
use crate::labels::LabelExtractors;

pub fn run(args: InspectArgs) -> Result<()> {
    let config = ExtractionConfig::from_env()?;
    let inventory = inventory::build_inventory(&args.input_dir, None)?;

    let mut extractor = PageTextExtractor::with_system_tools(&config);
    let labels = LabelExtractors::new()?;
    let run = classify_documents(&inventory, &mut extractor, &labels);
    let plan = build_plan(&run.pages);

    info!(
        pages = run.pages.len(),
        bookmarks = plan.leaf_count(),
        "inspection complete"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    if args.json {
        let report = build_report(&inventory.input_dir, None, None, &run, &plan);
        serde_json::to_writer_pretty(&mut output, &report)
            .context("failed to serialize inspection report")?;
        writeln!(output)?;
    } else {
        write_outline(&mut output, &plan)?;
    }
    output.flush()?;
    Ok(())
}

pub fn write_outline<W: Write>(output: &mut W, plan: &OutlinePlan) -> Result<()> {
    for section in &plan.sections {
        writeln!(output, "{}", section.category)?;
        for group in &section.groups {
            writeln!(output, "  {}", group.form_type)?;
            for leaf in &group.leaves {
                writeln!(
                    output,
                    "    {}\t{} p{}",
                    leaf.label, leaf.file_name, leaf.page_number
                )?;
            }
        }
    }
    Ok(())
}
