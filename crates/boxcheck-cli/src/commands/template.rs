use boxcheck_core::error::BoxcheckError;
use boxcheck_core::extraction::pdftotext::PdftotextExtractor;
use boxcheck_core::template::{self, TemplateOptions};
use std::path::Path;

pub fn run(pdf: &Path, out_dir: &Path) -> Result<(), BoxcheckError> {
    let extractor = PdftotextExtractor::new();
    let tpl = template::build_template_from_pdf(pdf, &extractor, &TemplateOptions::default())?;
    let written = template::write_template(&tpl, out_dir, &template::template_file_name(pdf))?;

    eprintln!(
        "Template '{}': {} box(es) on {} page(s)",
        tpl.doc_type,
        tpl.field_count(),
        tpl.pages.len()
    );
    println!("{}", written.display());
    Ok(())
}
