use crate::cache;
use crate::error::BoxcheckError;
use crate::extraction::{BBox, PageDrawings, PdfExtractor};
use crate::model::{AnnotationType, FieldBox, FieldExtractor, PageTemplate, Template, Units};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
pub struct TemplateOptions {
    /// Only the first `max_pages` pages are scanned for boxes.
    pub max_pages: usize,
    /// Rectangles smaller than this (in square page units) are treated as
    /// underlines or rules and ignored.
    pub min_area: f64,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        TemplateOptions {
            max_pages: 2,
            min_area: 1500.0,
        }
    }
}

/// Build a template from the drawn rectangles of an annotated document.
///
/// A shape becomes a field when its path contains a `re` primitive, it is
/// stroked (outlined box rather than a filled highlight) and its area is at
/// least `min_area`. Field names are `box_<page>_<shape index>`.
pub fn build_template(
    doc_type: &str,
    drawings: &[PageDrawings],
    options: &TemplateOptions,
) -> Template {
    let pages = drawings
        .iter()
        .take(options.max_pages)
        .map(|page| build_page(page, options))
        .collect();

    Template {
        doc_type: doc_type.to_string(),
        units: Units::Normalized,
        pages,
    }
}

fn build_page(page: &PageDrawings, options: &TemplateOptions) -> PageTemplate {
    let mut fields = Vec::new();

    if page.width <= 0.0 || page.height <= 0.0 {
        tracing::warn!(page = page.page_index, "page has no area, skipping");
    } else {
        let frame = BBox::new(0.0, 0.0, page.width, page.height);
        for shape in &page.shapes {
            if !shape.has_rect() || !shape.is_stroked() {
                continue;
            }
            // Rectangles overhanging the page edge keep only their visible part.
            let Some(visible) = shape.bbox.clip(&frame) else {
                tracing::debug!(
                    page = page.page_index,
                    shape = shape.index,
                    "rectangle lies outside the page"
                );
                continue;
            };
            if visible.area() < options.min_area {
                tracing::debug!(
                    page = page.page_index,
                    shape = shape.index,
                    area = visible.area(),
                    "rectangle below minimum area"
                );
                continue;
            }
            fields.push(FieldBox {
                name: format!("box_{}_{}", page.page_index, shape.index),
                annotation_type: AnnotationType::RectangleDrawn,
                bbox: visible.normalize(page.width, page.height),
                extractor: FieldExtractor::Words,
                parsers: Vec::new(),
            });
        }
    }

    tracing::debug!(page = page.page_index, fields = fields.len(), "template page built");

    PageTemplate {
        page_num: page.page_index,
        fields,
        tables: Vec::new(),
    }
}

/// Read an annotated PDF and build its template. `doc_type` is the file stem.
pub fn build_template_from_pdf(
    pdf_path: &Path,
    extractor: &dyn PdfExtractor,
    options: &TemplateOptions,
) -> Result<Template, BoxcheckError> {
    cache::require_file(pdf_path)?;
    let pdf_bytes = std::fs::read(pdf_path)?;
    let drawings = extractor.extract_drawings(&pdf_bytes)?;
    let template = build_template(&cache::file_stem(pdf_path), &drawings, options);
    tracing::info!(
        pdf = %pdf_path.display(),
        backend = extractor.backend_name(),
        fields = template.field_count(),
        "built template"
    );
    Ok(template)
}

/// `<pdf stem>_template.json`
pub fn template_file_name(pdf_path: &Path) -> String {
    format!("{}_template.json", cache::file_stem(pdf_path))
}

/// Write a template into `out_dir`, which must already exist.
pub fn write_template(
    template: &Template,
    out_dir: &Path,
    file_name: &str,
) -> Result<PathBuf, BoxcheckError> {
    cache::require_dir(out_dir)?;
    write_template_to(template, &out_dir.join(file_name))
}

/// Write a template to an explicit path, replacing any previous version.
pub fn write_template_to(template: &Template, path: &Path) -> Result<PathBuf, BoxcheckError> {
    let written = cache::write_json(template, path, true)?;
    tracing::info!(path = %written.display(), "wrote template");
    Ok(written)
}

/// Load a template JSON file and check its invariants.
pub fn load_template(path: &Path) -> Result<Template, BoxcheckError> {
    let template: Template = cache::load_json(path)?;
    validate_template(&template)?;
    Ok(template)
}

/// Boxes must be non-degenerate and inside the unit square; names unique per page.
pub fn validate_template(template: &Template) -> Result<(), BoxcheckError> {
    let mut seen_pages = HashSet::new();
    for page in &template.pages {
        if !seen_pages.insert(page.page_num) {
            return Err(BoxcheckError::TemplateInvalid(format!(
                "page {} is listed more than once",
                page.page_num
            )));
        }

        let mut names = HashSet::new();
        for field in &page.fields {
            if field.name.is_empty() {
                return Err(BoxcheckError::TemplateInvalid(format!(
                    "page {} has a field without a name",
                    page.page_num
                )));
            }
            if !names.insert(field.name.as_str()) {
                return Err(BoxcheckError::TemplateInvalid(format!(
                    "page {} has duplicate field name '{}'",
                    page.page_num, field.name
                )));
            }
            let b = &field.bbox;
            let in_unit = [b.x_min, b.y_min, b.x_max, b.y_max]
                .iter()
                .all(|v| (0.0..=1.0).contains(v));
            if !b.is_valid() || !in_unit {
                return Err(BoxcheckError::TemplateInvalid(format!(
                    "field '{}' has box {:?}; expected 0 <= x0 < x1 <= 1 and 0 <= y0 < y1 <= 1",
                    field.name,
                    <[f64; 4]>::from(*b)
                )));
            }
        }
    }
    Ok(())
}
