use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "taxmerge",
    version,
    about = "Classify scanned tax documents and merge them into one bookmarked PDF"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge every supported file in a folder into one PDF with a category outline.
    Merge(MergeArgs),
    /// Show the outline a merge would produce without writing anything.
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct MergeArgs {
    /// Folder containing the PDFs and images to merge.
    pub input_dir: PathBuf,

    /// Path of the merged PDF. Relocated next to the input folder if it points inside it.
    pub output_pdf: PathBuf,

    /// Delete the processed input files after the merged PDF has been written.
    #[arg(long, default_value_t = false)]
    pub delete_inputs: bool,

    /// Write a JSON report of every page's classification and bookmark label.
    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Folder containing the PDFs and images to inspect.
    pub input_dir: PathBuf,

    /// Print the full page report as JSON instead of the outline tree.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
