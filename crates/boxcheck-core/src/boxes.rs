use crate::cache;
use crate::error::BoxcheckError;
use crate::extraction::{BBox, PageContent, PdfExtractor, Word};
use crate::model::{BoxResult, ExtractionRecord, Template};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Words whose bounding box overlaps `rect`, in reading order
/// (top-to-bottom, then left-to-right).
pub fn words_in_box<'a>(words: &'a [Word], rect: &BBox) -> Vec<&'a Word> {
    let mut selected: Vec<&Word> = words.iter().filter(|w| rect.intersects(&w.bbox)).collect();
    selected.sort_by(|a, b| {
        a.top()
            .total_cmp(&b.top())
            .then_with(|| a.x0().total_cmp(&b.x0()))
    });
    selected
}

/// Apply a template to already-extracted pages.
pub fn extract_boxes(
    doc_path: &str,
    pages: &[PageContent],
    template: &Template,
) -> Result<ExtractionRecord, BoxcheckError> {
    let lookup = |page_num: usize| {
        pages
            .iter()
            .find(|p| p.page_index == page_num)
            .ok_or(BoxcheckError::PageOutOfRange {
                page: page_num,
                page_count: pages.len(),
            })
    };

    let mut text_parts = Vec::with_capacity(template.pages.len());
    let mut boxes = BTreeMap::new();

    for page_template in &template.pages {
        let page = lookup(page_template.page_num)?;
        text_parts.push(page.text.as_str());

        for field in &page_template.fields {
            let rect = field.bbox.denormalize(page.width, page.height);
            let in_box = words_in_box(&page.words, &rect);
            let raw_text = in_box
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
                .trim()
                .to_string();

            tracing::debug!(
                field = %field.name,
                page = page.page_index,
                words = in_box.len(),
                "extracted box"
            );

            boxes.insert(
                field.name.clone(),
                BoxResult {
                    page: page.page_index,
                    raw_text,
                    count_words: in_box.len(),
                    box_denorm: rect,
                },
            );
        }
    }

    Ok(ExtractionRecord {
        doc_path: doc_path.to_string(),
        doc_type: template.doc_type.clone(),
        boxes,
        full_text: text_parts.join("\n"),
    })
}

/// Read a target PDF and apply a template to it.
pub fn extract_boxes_from_pdf(
    pdf_path: &Path,
    template: &Template,
    extractor: &dyn PdfExtractor,
) -> Result<ExtractionRecord, BoxcheckError> {
    cache::require_file(pdf_path)?;
    let pdf_bytes = std::fs::read(pdf_path)?;
    let pages = extractor.extract_pages(&pdf_bytes)?;
    let doc_path = std::fs::canonicalize(pdf_path).unwrap_or_else(|_| pdf_path.to_path_buf());
    let record = extract_boxes(&doc_path.display().to_string(), &pages, template)?;
    tracing::info!(
        pdf = %pdf_path.display(),
        backend = extractor.backend_name(),
        boxes = record.boxes.len(),
        "extracted boxes"
    );
    Ok(record)
}

/// `<json_dir>/<pdf stem>.first_half.json`; `json_dir` must exist.
pub fn default_output_path(json_dir: &Path, pdf_path: &Path) -> Result<PathBuf, BoxcheckError> {
    cache::require_dir(json_dir)?;
    Ok(json_dir.join(extraction_file_name(pdf_path)))
}

pub fn extraction_file_name(pdf_path: &Path) -> String {
    format!("{}.first_half.json", cache::file_stem(pdf_path))
}

/// Write an extraction record, auto-suffixing unless `overwrite` is set.
pub fn write_extraction(
    record: &ExtractionRecord,
    path: &Path,
    overwrite: bool,
) -> Result<PathBuf, BoxcheckError> {
    let written = cache::write_json(record, path, overwrite)?;
    tracing::info!(path = %written.display(), "wrote extraction JSON");
    Ok(written)
}

pub fn load_extraction(path: &Path) -> Result<ExtractionRecord, BoxcheckError> {
    cache::load_json(path)
}
