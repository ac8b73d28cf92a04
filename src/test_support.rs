use std::collections::HashMap;
use std::path::Path;

use anyhow::{Result, bail};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use crate::config::ExtractionConfig;
use crate::extract::{OcrEngine, PageTextExtractor, TextBackend};
use crate::model::display_name;

pub fn write_pdf(path: &Path, page_texts: &[&str]) {
    let mut document = Document::with_version("1.5");
    let pages_id = document.new_object_id();
    let font_id = document.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = document.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in page_texts {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id =
            document.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    document.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = document.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    document.trailer.set("Root", catalog_id);
    document.save(path).unwrap();
}

pub fn outline_titles(document: &Document) -> Vec<(usize, String, usize)> {
    let page_numbers = document
        .get_pages()
        .into_iter()
        .map(|(number, id)| (id, number as usize))
        .collect::<HashMap<ObjectId, usize>>();

    let catalog = document.catalog().unwrap();
    let outlines_id = catalog.get(b"Outlines").unwrap().as_reference().unwrap();
    let outlines = document.get_dictionary(outlines_id).unwrap();

    let mut titles = Vec::new();
    if let Ok(first) = outlines.get(b"First").and_then(Object::as_reference) {
        collect_outline(document, first, 0, &page_numbers, &mut titles);
    }
    titles
}

fn collect_outline(
    document: &Document,
    first: ObjectId,
    depth: usize,
    page_numbers: &HashMap<ObjectId, usize>,
    titles: &mut Vec<(usize, String, usize)>,
) {
    let mut current = Some(first);
    while let Some(item_id) = current {
        let item = document.get_dictionary(item_id).unwrap();
        let title = match item.get(b"Title").unwrap() {
            Object::String(bytes, _) if bytes.starts_with(&[0xFE, 0xFF]) => {
                let units = bytes[2..]
                    .chunks(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect::<Vec<u16>>();
                String::from_utf16(&units).unwrap()
            }
            Object::String(bytes, _) => String::from_utf8(bytes.clone()).unwrap(),
            other => panic!("unexpected title object {other:?}"),
        };
        let dest = item.get(b"Dest").unwrap().as_array().unwrap();
        let page_id = dest[0].as_reference().unwrap();
        titles.push((depth, title, page_numbers[&page_id]));

        if let Ok(child) = item.get(b"First").and_then(Object::as_reference) {
            collect_outline(document, child, depth + 1, page_numbers, titles);
        }
        current = item.get(b"Next").and_then(Object::as_reference).ok();
    }
}

pub struct ScriptedBackend {
    pub name: &'static str,
    pub pages: HashMap<(String, usize), String>,
}

impl TextBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn extract(&mut self, pdf_path: &Path, page_index: usize) -> Result<String> {
        match self.pages.get(&(display_name(pdf_path), page_index)) {
            Some(text) => Ok(text.clone()),
            None => bail!("no scripted text for {} page {}", pdf_path.display(), page_index),
        }
    }
}

pub struct ScriptedOcr {
    pub pages: HashMap<(String, usize), String>,
}

impl OcrEngine for ScriptedOcr {
    fn name(&self) -> &'static str {
        "scripted-ocr"
    }

    fn recognize_pdf_page(&mut self, pdf_path: &Path, page_index: usize, _dpi: u32) -> Result<String> {
        match self.pages.get(&(display_name(pdf_path), page_index)) {
            Some(text) => Ok(text.clone()),
            None => bail!("no scripted OCR for {}", pdf_path.display()),
        }
    }

    fn recognize_image(&mut self, image_path: &Path) -> Result<String> {
        self.recognize_pdf_page(image_path, 0, 0)
    }
}

fn scripted(entries: &[(&str, usize, &str)]) -> HashMap<(String, usize), String> {
    entries
        .iter()
        .map(|(file, page, text)| ((file.to_string(), *page), text.to_string()))
        .collect()
}

pub fn scripted_extractor(
    text_layer: &[(&str, usize, &str)],
    ocr: &[(&str, usize, &str)],
) -> PageTextExtractor {
    let backends: Vec<Box<dyn TextBackend>> = vec![Box::new(ScriptedBackend {
        name: "scripted-text",
        pages: scripted(text_layer),
    })];
    PageTextExtractor::new(
        backends,
        Box::new(ScriptedOcr {
            pages: scripted(ocr),
        }),
        &ExtractionConfig::default(),
    )
}
