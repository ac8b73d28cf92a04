use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::model::{DocumentKind, DuplicateFile, SkippedFile, SourceDocument, display_name};
use crate::util::sha256_file;

#[derive(Debug, Clone)]
pub struct Inventory {
    pub input_dir: PathBuf,
    pub documents: Vec<SourceDocument>,
    pub duplicates: Vec<DuplicateDocument>,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone)]
pub struct DuplicateDocument {
    pub document: SourceDocument,
    pub duplicate_of: String,
}

impl DuplicateDocument {
    pub fn record(&self) -> DuplicateFile {
        DuplicateFile {
            file_name: self.document.file_name(),
            duplicate_of: self.duplicate_of.clone(),
        }
    }
}

pub fn resolve_output_path(input_dir: &Path, output_pdf: &Path) -> Result<PathBuf> {
    let input_abs = resolve_path(input_dir)?;
    let output_abs = resolve_path(output_pdf)?;

    if !output_abs.starts_with(&input_abs) {
        return Ok(output_abs);
    }

    let file_name = output_abs
        .file_name()
        .with_context(|| format!("output path has no file name: {}", output_pdf.display()))?;
    let relocated = input_abs
        .parent()
        .unwrap_or(&input_abs)
        .join(file_name);
    warn!(
        requested = %output_abs.display(),
        relocated = %relocated.display(),
        "output path is inside the input folder; relocating"
    );
    Ok(relocated)
}

fn resolve_path(path: &Path) -> Result<PathBuf> {
    let absolute =
        std::path::absolute(path).with_context(|| format!("failed to resolve {}", path.display()))?;
    if let Ok(canonical) = absolute.canonicalize() {
        return Ok(canonical);
    }
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => Ok(resolve_path(parent)?.join(name)),
        _ => Ok(absolute),
    }
}

pub fn build_inventory(input_dir: &Path, output_pdf: Option<&Path>) -> Result<Inventory> {
    let excluded_name = output_pdf.and_then(Path::file_name);

    let mut candidates = discover_inputs(input_dir)?;
    candidates.retain(|(path, _)| path.file_name() != excluded_name);
    candidates.sort_by(|(left, _), (right, _)| left.file_name().cmp(&right.file_name()));

    let mut documents = Vec::with_capacity(candidates.len());
    let mut duplicates = Vec::new();
    let mut skipped = Vec::new();
    let mut seen_hashes: HashMap<String, String> = HashMap::new();

    for (path, kind) in candidates {
        let file_name = display_name(&path);
        let size = fs::metadata(&path)
            .with_context(|| format!("failed to inspect {}", path.display()))?
            .len();
        if size == 0 {
            warn!(file = %file_name, "skipping zero-byte file");
            skipped.push(SkippedFile {
                file_name,
                reason: "zero-byte file".to_string(),
            });
            continue;
        }

        let sha256 = match sha256_file(&path) {
            Ok(sha256) => sha256,
            Err(err) => {
                warn!(file = %file_name, error = %err, "skipping unreadable file");
                skipped.push(SkippedFile {
                    file_name,
                    reason: format!("unreadable: {err}"),
                });
                continue;
            }
        };
        let document = SourceDocument { path, kind };
        if let Some(original) = seen_hashes.get(&sha256) {
            warn!(file = %file_name, duplicate_of = %original, "duplicate file; merging under Duplicate");
            duplicates.push(DuplicateDocument {
                document,
                duplicate_of: original.clone(),
            });
            continue;
        }
        seen_hashes.insert(sha256, file_name);

        documents.push(document);
    }

    if documents.is_empty() {
        bail!("no usable PDF or image files found in {}", input_dir.display());
    }

    info!(
        input_dir = %input_dir.display(),
        documents = documents.len(),
        duplicates = duplicates.len(),
        skipped = skipped.len(),
        "discovered input documents"
    );

    Ok(Inventory {
        input_dir: input_dir.to_path_buf(),
        documents,
        duplicates,
        skipped,
    })
}

fn discover_inputs(input_dir: &Path) -> Result<Vec<(PathBuf, DocumentKind)>> {
    let mut inputs = Vec::new();

    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("failed to read {}", input_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", input_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        if let Some(kind) = DocumentKind::from_path(&path) {
            inputs.push((path, kind));
        }
    }

    Ok(inputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::write_pdf;

    #[test]
    fn inventory_filters_sorts_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        write_pdf(&dir.path().join("b.PDF"), &["second"]);
        write_pdf(&dir.path().join("a.pdf"), &["first"]);
        fs::write(dir.path().join("empty.pdf"), b"").unwrap();
        fs::write(dir.path().join("notes.txt"), b"not a document").unwrap();
        fs::copy(dir.path().join("a.pdf"), dir.path().join("c.pdf")).unwrap();
        fs::write(dir.path().join("scan.JPEG"), b"jpeg bytes").unwrap();
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let inventory = build_inventory(dir.path(), None).unwrap();

        let names = inventory
            .documents
            .iter()
            .map(SourceDocument::file_name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a.pdf", "b.PDF", "scan.JPEG"]);
        assert_eq!(inventory.documents[2].kind, DocumentKind::Image);

        let skipped = inventory
            .skipped
            .iter()
            .map(|file| (file.file_name.as_str(), file.reason.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(skipped, vec![("empty.pdf", "zero-byte file")]);

        let duplicates = inventory
            .duplicates
            .iter()
            .map(DuplicateDocument::record)
            .collect::<Vec<_>>();
        assert_eq!(
            duplicates,
            vec![DuplicateFile {
                file_name: "c.pdf".to_string(),
                duplicate_of: "a.pdf".to_string(),
            }]
        );
    }

    #[test]
    fn output_file_name_is_excluded_from_inputs() {
        let dir = tempfile::tempdir().unwrap();
        write_pdf(&dir.path().join("a.pdf"), &["first"]);
        write_pdf(&dir.path().join("merged.pdf"), &["previous output"]);

        let inventory = build_inventory(dir.path(), Some(Path::new("/elsewhere/merged.pdf"))).unwrap();
        assert_eq!(inventory.documents.len(), 1);
        assert_eq!(inventory.documents[0].file_name(), "a.pdf");
    }

    #[test]
    fn folder_without_usable_files_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty.pdf"), b"").unwrap();
        assert!(build_inventory(dir.path(), None).is_err());
    }

    #[test]
    fn output_inside_input_folder_moves_to_parent() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scans");
        fs::create_dir(&input).unwrap();

        let root = dir.path().canonicalize().unwrap();

        let relocated = resolve_output_path(&input, &input.join("merged.pdf")).unwrap();
        assert_eq!(relocated, root.join("merged.pdf"));

        let outside = dir.path().join("out").join("merged.pdf");
        assert_eq!(
            resolve_output_path(&input, &outside).unwrap(),
            root.join("out").join("merged.pdf")
        );
    }

    #[test]
    fn parent_segments_do_not_hide_an_output_inside_the_input_folder() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scans");
        fs::create_dir(&input).unwrap();
        let root = dir.path().canonicalize().unwrap();

        let sneaky = input.join("..").join("scans").join("merged.pdf");
        assert_eq!(
            resolve_output_path(&input, &sneaky).unwrap(),
            root.join("merged.pdf")
        );

        let sibling = input.join("..").join("merged.pdf");
        assert_eq!(
            resolve_output_path(&input, &sibling).unwrap(),
            root.join("merged.pdf")
        );
    }
}
