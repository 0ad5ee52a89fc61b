use boxcheck_core::boxes;
use boxcheck_core::error::BoxcheckError;
use boxcheck_core::extraction::pdftotext::PdftotextExtractor;
use std::path::{Path, PathBuf};

pub fn run(
    pdf: &Path,
    template: &Path,
    json_dir: &Path,
    out: Option<PathBuf>,
    overwrite: bool,
) -> Result<(), BoxcheckError> {
    let tpl = boxcheck_core::template::load_template(template)?;

    // Resolve the destination before touching the PDF so a missing folder
    // fails fast.
    let out_path = match out {
        Some(path) => path,
        None => boxes::default_output_path(json_dir, pdf)?,
    };

    let extractor = PdftotextExtractor::new();
    let record = boxes::extract_boxes_from_pdf(pdf, &tpl, &extractor)?;
    let written = boxes::write_extraction(&record, &out_path, overwrite)?;

    for (name, result) in &record.boxes {
        eprintln!("  {:<10} {:>3} word(s)  {}", name, result.count_words, result.raw_text);
    }
    println!("{}", written.display());
    Ok(())
}
