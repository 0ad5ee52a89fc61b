pub mod boxes;
pub mod cache;
pub mod error;
pub mod expectations;
pub mod extraction;
pub mod layout;
pub mod model;
pub mod report;
pub mod template;
pub mod validate;

use error::BoxcheckError;
use expectations::schema::ExpectationSet;
use extraction::PdfExtractor;
use model::{DocumentLayout, ExtractionRecord, Template};
use validate::{BoxCheckOptions, ValidationReport};

/// Validate an extraction record against an expectation set.
///
/// Cross-validation runs only when the set defines a section and a layout
/// is supplied.
pub fn validate_extraction(
    set: &ExpectationSet,
    record: &ExtractionRecord,
    layout: Option<&DocumentLayout>,
    options: &BoxCheckOptions,
) -> ValidationReport {
    let checks = validate::run_checks(set, record, layout, options);
    ValidationReport::new(Some(record.doc_path.clone()), checks)
}

/// Main API entry point: apply a template to a PDF and validate the result.
///
/// A PDF that cannot be read does not abort: the report carries a single
/// failing `document__readable` check instead. Other errors propagate.
pub fn validate_pdf(
    pdf_bytes: &[u8],
    doc_path: &str,
    extractor: &dyn PdfExtractor,
    template: &Template,
    set: &ExpectationSet,
    options: &BoxCheckOptions,
) -> Result<ValidationReport, BoxcheckError> {
    let pages = match extractor.extract_pages(pdf_bytes) {
        Ok(pages) => pages,
        Err(e) if e.is_unreadable_pdf() => return Ok(unreadable_report(doc_path, &e)),
        Err(e) => return Err(e),
    };

    let record = boxes::extract_boxes(doc_path, &pages, template)?;

    let layout = set.section.as_ref().map(|section| {
        let layout_options = layout::LayoutOptions {
            section_start_page: section.start_page,
            ..Default::default()
        };
        layout::build_document_layout(doc_path, &pages, &layout_options)
    });

    Ok(validate_extraction(set, &record, layout.as_ref(), options))
}

/// Report for a document whose PDF could not be opened or parsed.
pub fn unreadable_report(doc_path: &str, err: &BoxcheckError) -> ValidationReport {
    tracing::warn!(doc = doc_path, error = %err, "PDF unreadable");
    ValidationReport::new(
        Some(doc_path.to_string()),
        vec![validate::unreadable_check(&err.to_string())],
    )
}
