use boxcheck_core::error::BoxcheckError;
use boxcheck_core::extraction::pdftotext::PdftotextExtractor;
use boxcheck_core::layout::{self, LayoutOptions};
use std::path::{Path, PathBuf};

use crate::output;

pub fn run(
    pdf: &Path,
    section_start: usize,
    line_tolerance: f64,
    out: Option<PathBuf>,
) -> Result<(), BoxcheckError> {
    let options = LayoutOptions {
        line_tolerance,
        section_start_page: section_start,
    };
    let extractor = PdftotextExtractor::new();
    let doc = layout::build_document_layout_from_pdf(pdf, &extractor, &options)?;

    match out {
        Some(path) => {
            let written = layout::write_document_layout(&doc, &path)?;
            println!("{}", written.display());
        }
        None => output::json::print(&doc)?,
    }
    Ok(())
}
