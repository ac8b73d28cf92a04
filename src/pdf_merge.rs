use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::model::{DocumentKind, PageRef};
use crate::outline::{BookmarkId, MergeSink};
use crate::util::ensure_directory;

const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

const DEFAULT_MEDIA_BOX: [i64; 4] = [0, 0, 612, 792];

const IMAGE_PAGE_DPI: f32 = 300.0;

const MAX_TREE_DEPTH: usize = 64;

pub fn pdf_page_count(pdf_path: &Path) -> Result<usize> {
    let document = Document::load(pdf_path)
        .with_context(|| format!("failed to open {}", pdf_path.display()))?;
    Ok(document.get_pages().len())
}

#[derive(Debug, Clone)]
struct OutlineEntry {
    title: String,
    page_number: usize,
    parent: Option<BookmarkId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    pub page_count: usize,
    pub bookmark_count: usize,
}

pub struct LopdfMerger {
    output: Document,
    pages_id: ObjectId,
    imported: HashMap<PathBuf, Vec<ObjectId>>,
    kids: Vec<ObjectId>,
    outline: Vec<OutlineEntry>,
}

impl Default for LopdfMerger {
    fn default() -> Self {
        Self::new()
    }
}

impl LopdfMerger {
    pub fn new() -> Self {
        let mut output = Document::with_version("1.7");
        let pages_id = output.new_object_id();
        Self {
            output,
            pages_id,
            imported: HashMap::new(),
            kids: Vec::new(),
            outline: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    fn imported_pages(&mut self, pdf_path: &Path) -> Result<&[ObjectId]> {
        if !self.imported.contains_key(pdf_path) {
            let page_ids = self.import_document(pdf_path)?;
            self.imported.insert(pdf_path.to_path_buf(), page_ids);
        }

        self.imported
            .get(pdf_path)
            .map(Vec::as_slice)
            .with_context(|| format!("document not imported: {}", pdf_path.display()))
    }

    fn import_document(&mut self, pdf_path: &Path) -> Result<Vec<ObjectId>> {
        let mut source = Document::load(pdf_path)
            .with_context(|| format!("failed to open {}", pdf_path.display()))?;

        let source_pages = source.get_pages().into_values().collect::<Vec<ObjectId>>();
        for page_id in &source_pages {
            materialize_inherited(&mut source, *page_id).with_context(|| {
                format!(
                    "failed to resolve page attributes in {}",
                    pdf_path.display()
                )
            })?;
        }

        source.renumber_objects_with(self.output.max_id + 1);
        let page_ids = source.get_pages().into_values().collect::<Vec<ObjectId>>();

        self.output.max_id = self.output.max_id.max(source.max_id);
        self.output.objects.extend(source.objects);

        Ok(page_ids)
    }

    fn append_pdf_page(&mut self, page: &PageRef) -> Result<()> {
        let page_id = self
            .imported_pages(&page.document)?
            .get(page.page_index)
            .copied()
            .with_context(|| format!("page {page} does not exist"))?;
        self.kids.push(page_id);
        Ok(())
    }

    fn append_image_page(&mut self, page: &PageRef) -> Result<()> {
        if page.page_index != 0 {
            bail!("image {} has a single page, requested {}", page.document.display(), page);
        }

        let image = image::open(&page.document)
            .with_context(|| format!("failed to decode image {}", page.document.display()))?
            .to_rgb8();
        let (width, height) = image.dimensions();

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(image.as_raw())
            .with_context(|| format!("failed to compress image {}", page.document.display()))?;
        let compressed = encoder
            .finish()
            .with_context(|| format!("failed to compress image {}", page.document.display()))?;

        let image_id = self.output.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        ));

        let page_width = width as f32 * 72.0 / IMAGE_PAGE_DPI;
        let page_height = height as f32 * 72.0 / IMAGE_PAGE_DPI;
        let content = format!("q {page_width:.2} 0 0 {page_height:.2} 0 0 cm /Im0 Do Q");
        let content_id = self
            .output
            .add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let page_id = self.output.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), Object::Real(page_width), Object::Real(page_height)],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        self.kids.push(page_id);
        Ok(())
    }

    pub fn save(mut self, output_path: &Path) -> Result<MergeOutcome> {
        for kid in &self.kids {
            self.output
                .get_object_mut(*kid)
                .and_then(Object::as_dict_mut)
                .with_context(|| format!("page object {kid:?} is not a dictionary"))?
                .set("Parent", self.pages_id);
        }

        let kids = self
            .kids
            .iter()
            .map(|kid| Object::Reference(*kid))
            .collect::<Vec<Object>>();
        self.output.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.kids.len() as i64,
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        };
        if let Some(outlines_id) = self.write_outline() {
            catalog.set("Outlines", outlines_id);
            catalog.set("PageMode", Object::Name(b"UseOutlines".to_vec()));
        }
        let catalog_id = self.output.add_object(catalog);
        self.output.trailer.set("Root", catalog_id);

        self.output.prune_objects();

        if let Some(parent) = output_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            ensure_directory(parent)?;
        }
        self.output
            .save(output_path)
            .with_context(|| format!("failed to write merged pdf {}", output_path.display()))?;

        Ok(MergeOutcome {
            page_count: self.kids.len(),
            bookmark_count: self.outline.len(),
        })
    }

    fn write_outline(&mut self) -> Option<ObjectId> {
        let last_page = self.kids.len().checked_sub(1)?;
        if self.outline.is_empty() {
            return None;
        }

        let outlines_id = self.output.new_object_id();
        let item_ids = self
            .outline
            .iter()
            .map(|_| self.output.new_object_id())
            .collect::<Vec<ObjectId>>();

        let children = |parent: Option<BookmarkId>| {
            self.outline
                .iter()
                .enumerate()
                .filter(|(_, entry)| entry.parent == parent)
                .map(|(index, _)| index)
                .collect::<Vec<usize>>()
        };
        let child_lists = self
            .outline
            .iter()
            .enumerate()
            .map(|(index, _)| children(Some(BookmarkId(index))))
            .collect::<Vec<Vec<usize>>>();
        let roots = children(None);

        let mut descendants = vec![0i64; self.outline.len()];
        for index in (0..self.outline.len()).rev() {
            descendants[index] = child_lists[index]
                .iter()
                .map(|child| 1 + descendants[*child])
                .sum();
        }

        let mut items = Vec::with_capacity(self.outline.len());
        for (index, entry) in self.outline.iter().enumerate() {
            let page_id = self.kids[entry.page_number.min(last_page)];
            let parent_id = entry
                .parent
                .map_or(outlines_id, |BookmarkId(parent)| item_ids[parent]);
            let siblings = match entry.parent {
                Some(BookmarkId(parent)) => &child_lists[parent],
                None => &roots,
            };

            let mut item = dictionary! {
                "Title" => pdf_text_string(&entry.title),
                "Parent" => parent_id,
                "Dest" => vec![Object::Reference(page_id), Object::Name(b"Fit".to_vec())],
            };
            if let Some(position) = siblings.iter().position(|sibling| *sibling == index) {
                if position > 0 {
                    item.set("Prev", item_ids[siblings[position - 1]]);
                }
                if let Some(next) = siblings.get(position + 1) {
                    item.set("Next", item_ids[*next]);
                }
            }
            if let (Some(first), Some(last)) = (child_lists[index].first(), child_lists[index].last()) {
                item.set("First", item_ids[*first]);
                item.set("Last", item_ids[*last]);
                item.set("Count", descendants[index]);
            }
            items.push((item_ids[index], item));
        }

        for (item_id, item) in items {
            self.output.objects.insert(item_id, Object::Dictionary(item));
        }

        let total = roots.iter().map(|root| 1 + descendants[*root]).sum::<i64>();
        let mut outlines = dictionary! {
            "Type" => "Outlines",
            "Count" => total,
        };
        if let (Some(first), Some(last)) = (roots.first(), roots.last()) {
            outlines.set("First", item_ids[*first]);
            outlines.set("Last", item_ids[*last]);
        }
        self.output
            .objects
            .insert(outlines_id, Object::Dictionary(outlines));

        Some(outlines_id)
    }
}

impl MergeSink for LopdfMerger {
    fn append_page(&mut self, page: &PageRef) -> Result<()> {
        match DocumentKind::from_path(&page.document) {
            Some(DocumentKind::Image) => self.append_image_page(page),
            _ => self.append_pdf_page(page),
        }
    }

    fn add_bookmark(&mut self, title: &str, page_number: usize, parent: Option<BookmarkId>) -> BookmarkId {
        self.outline.push(OutlineEntry {
            title: title.to_string(),
            page_number,
            parent,
        });
        BookmarkId(self.outline.len() - 1)
    }
}

fn materialize_inherited(document: &mut Document, page_id: ObjectId) -> Result<()> {
    let page = document.get_dictionary(page_id)?;
    let mut missing = INHERITABLE_KEYS
        .iter()
        .copied()
        .filter(|key| !page.has(key))
        .collect::<Vec<&[u8]>>();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut inherited = Vec::<(&[u8], Object)>::new();

    let mut depth = 0usize;
    while let Some(node_id) = parent {
        if missing.is_empty() || depth >= MAX_TREE_DEPTH {
            break;
        }
        let node = document.get_dictionary(node_id)?;
        missing.retain(|key| match node.get(key) {
            Ok(value) => {
                inherited.push((*key, value.clone()));
                false
            }
            Err(_) => true,
        });
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    let needs_media_box = missing.contains(&b"MediaBox".as_slice());
    let page = document.get_object_mut(page_id)?.as_dict_mut()?;
    for (key, value) in inherited {
        page.set(key, value);
    }
    if needs_media_box {
        page.set(
            "MediaBox",
            DEFAULT_MEDIA_BOX
                .iter()
                .map(|value| Object::Integer(*value))
                .collect::<Vec<Object>>(),
        );
    }
    Ok(())
}

fn pdf_text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{outline_titles, write_pdf};

    #[test]
    fn merged_pages_keep_order_and_outline_nests() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.pdf");
        let second = dir.path().join("b.pdf");
        write_pdf(&first, &["alpha one", "alpha two"]);
        write_pdf(&second, &["beta one"]);

        let mut merger = LopdfMerger::new();
        merger.append_page(&PageRef::new(&second, 0)).unwrap();
        merger.append_page(&PageRef::new(&first, 1)).unwrap();
        let root = merger.add_bookmark("Income", 0, None);
        let form = merger.add_bookmark("W-2", 0, Some(root));
        merger.add_bookmark("ACME CORP", 0, Some(form));
        merger.add_bookmark("Globex", 1, Some(form));

        let output = dir.path().join("out").join("merged.pdf");
        let outcome = merger.save(&output).unwrap();
        assert_eq!(
            outcome,
            MergeOutcome {
                page_count: 2,
                bookmark_count: 4
            }
        );

        let merged = Document::load(&output).unwrap();
        assert_eq!(merged.get_pages().len(), 2);
        assert_eq!(merged.extract_text(&[1]).unwrap().trim(), "beta one");
        assert_eq!(merged.extract_text(&[2]).unwrap().trim(), "alpha two");
        assert_eq!(
            outline_titles(&merged),
            vec![
                (0, "Income".to_string(), 1),
                (1, "W-2".to_string(), 1),
                (2, "ACME CORP".to_string(), 1),
                (2, "Globex".to_string(), 2),
            ]
        );
    }

    #[test]
    fn missing_page_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.pdf");
        write_pdf(&source, &["only page"]);

        let mut merger = LopdfMerger::new();
        assert!(merger.append_page(&PageRef::new(&source, 3)).is_err());
        assert_eq!(merger.page_count(), 0);
    }

    #[test]
    fn image_inputs_become_full_pages() {
        let dir = tempfile::tempdir().unwrap();
        let scan = dir.path().join("scan.png");
        image::RgbImage::from_pixel(600, 300, image::Rgb([255, 255, 255]))
            .save(&scan)
            .unwrap();

        let mut merger = LopdfMerger::new();
        merger.append_page(&PageRef::new(&scan, 0)).unwrap();
        merger.add_bookmark("Others", 0, None);
        let output = dir.path().join("merged.pdf");
        merger.save(&output).unwrap();

        let merged = Document::load(&output).unwrap();
        let pages = merged.get_pages();
        assert_eq!(pages.len(), 1);
        let page = merged.get_dictionary(pages[&1]).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_float().unwrap(), 144.0);
        assert_eq!(media_box[3].as_float().unwrap(), 72.0);
    }

    #[test]
    fn non_ascii_titles_are_utf16() {
        assert_eq!(
            pdf_text_string("ACME"),
            Object::String(b"ACME".to_vec(), StringFormat::Literal)
        );
        assert_eq!(
            pdf_text_string("Café"),
            Object::String(
                vec![0xFE, 0xFF, 0x00, b'C', 0x00, b'a', 0x00, b'f', 0x00, 0xE9],
                StringFormat::Hexadecimal
            )
        );
    }
}
