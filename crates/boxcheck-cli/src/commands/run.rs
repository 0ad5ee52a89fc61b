use boxcheck_core::error::BoxcheckError;
use boxcheck_core::extraction::pdftotext::PdftotextExtractor;
use boxcheck_core::extraction::{PageContent, PdfExtractor};
use boxcheck_core::layout::{self, LayoutOptions};
use boxcheck_core::model::{DocumentLayout, ExtractionRecord, Template};
use boxcheck_core::template::{self, TemplateOptions};
use boxcheck_core::validate::{self, BoxCheckOptions, NoticePolicy, ValidationReport};
use boxcheck_core::{boxes, cache, report};
use std::path::{Path, PathBuf};

use crate::output;

/// Artifact locations for one document inside a work folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPaths {
    pub json_dir: PathBuf,
    pub template: PathBuf,
    pub extraction: PathBuf,
    pub layout: PathBuf,
    pub boxes_pdf: PathBuf,
}

impl WorkPaths {
    pub fn resolve(pdf: &Path, work_dir: &Path) -> Self {
        let doc = cache::file_stem(pdf);
        let json_dir = work_dir.join("json_files");
        let boxes_pdf = work_dir
            .join("sample_pdfs")
            .join(format!("{}_boxes.pdf", doc));
        WorkPaths {
            template: json_dir.join(template::template_file_name(&boxes_pdf)),
            extraction: json_dir.join(boxes::extraction_file_name(pdf)),
            layout: json_dir.join(layout::layout_file_name(pdf)),
            boxes_pdf,
            json_dir,
        }
    }
}

enum Pages {
    Read(Vec<PageContent>),
    Unreadable(BoxcheckError),
}

fn read_pages(pdf: &Path, extractor: &dyn PdfExtractor) -> Result<Pages, BoxcheckError> {
    let bytes = std::fs::read(pdf)?;
    match extractor.extract_pages(&bytes) {
        Ok(pages) => Ok(Pages::Read(pages)),
        Err(e) if e.is_unreadable_pdf() => Ok(Pages::Unreadable(e)),
        Err(e) => Err(e),
    }
}

/// Load the cached template, building it from the annotated PDF if absent.
fn ensure_template(
    paths: &WorkPaths,
    extractor: &dyn PdfExtractor,
) -> Result<Template, BoxcheckError> {
    if paths.template.exists() {
        tracing::info!(path = %paths.template.display(), "using cached template");
        return template::load_template(&paths.template);
    }
    if !paths.boxes_pdf.exists() {
        return Err(BoxcheckError::NoTemplate {
            template: paths.template.clone(),
            boxes_pdf: paths.boxes_pdf.clone(),
        });
    }
    let tpl =
        template::build_template_from_pdf(&paths.boxes_pdf, extractor, &TemplateOptions::default())?;
    template::write_template_to(&tpl, &paths.template)?;
    Ok(tpl)
}

/// Returns whether every check passed under the notice policy.
pub fn run(
    pdf: &Path,
    work_dir: &Path,
    expectations_file: Option<PathBuf>,
    preset: Option<String>,
    refresh: bool,
    output_format: &str,
    allow_notices: bool,
) -> Result<bool, BoxcheckError> {
    let extractor = PdftotextExtractor::new();
    let result = evaluate(pdf, work_dir, expectations_file, preset, refresh, &extractor)?;

    eprint!("{}", report::format_summary(&result.checks));
    eprintln!("{}", report::summarize_full_doc(&result.checks));

    match output_format {
        "flat" => output::json::print(&report::flat_results(&result.checks))?,
        _ => output::json::print(&result)?,
    }

    let policy = if allow_notices {
        NoticePolicy::Allow
    } else {
        NoticePolicy::Fail
    };
    Ok(result.is_success(policy))
}

/// Resolve, build or reuse every artifact, then validate.
pub fn evaluate(
    pdf: &Path,
    work_dir: &Path,
    expectations_file: Option<PathBuf>,
    preset: Option<String>,
    refresh: bool,
    extractor: &dyn PdfExtractor,
) -> Result<ValidationReport, BoxcheckError> {
    let set = super::load_expectation_set(expectations_file, preset)?;
    let paths = WorkPaths::resolve(pdf, work_dir);
    cache::require_dir(&paths.json_dir)?;
    cache::require_file(pdf)?;

    let doc_path = std::fs::canonicalize(pdf)
        .unwrap_or_else(|_| pdf.to_path_buf())
        .display()
        .to_string();
    let tpl = ensure_template(&paths, extractor)?;

    let mut pages = None;
    let cached: Option<ExtractionRecord> = if refresh {
        None
    } else {
        cache::load_json_if_exists(&paths.extraction)?
    };
    let record = match cached {
        Some(record) => {
            tracing::info!(path = %paths.extraction.display(), "using cached extraction");
            record
        }
        None => {
            let read = match read_pages(pdf, extractor)? {
                Pages::Read(read) => read,
                Pages::Unreadable(e) => return Ok(boxcheck_core::unreadable_report(&doc_path, &e)),
            };
            let record = boxes::extract_boxes(&doc_path, &read, &tpl)?;
            boxes::write_extraction(&record, &paths.extraction, true)?;
            pages = Some(read);
            record
        }
    };

    let mut document_layout: Option<DocumentLayout> = None;
    let mut unreadable: Option<BoxcheckError> = None;
    if let Some(ref section) = set.section {
        let cached: Option<DocumentLayout> = if refresh {
            None
        } else {
            cache::load_json_if_exists(&paths.layout)?
        };
        document_layout = match cached {
            Some(l) if l.section_start_page == section.start_page => Some(l),
            _ => {
                let read = match pages.take() {
                    Some(read) => Some(read),
                    None => match read_pages(pdf, extractor)? {
                        Pages::Read(read) => Some(read),
                        Pages::Unreadable(e) => {
                            // The cached extraction is still checked without a layout.
                            tracing::warn!("cannot rebuild layout: {e}");
                            unreadable = Some(e);
                            None
                        }
                    },
                };
                match read {
                    Some(read) => {
                        let options = LayoutOptions {
                            section_start_page: section.start_page,
                            ..Default::default()
                        };
                        let filename = pdf
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        let doc = layout::build_document_layout(&filename, &read, &options);
                        layout::write_document_layout(&doc, &paths.layout)?;
                        Some(doc)
                    }
                    None => None,
                }
            }
        };
    }

    let mut result = boxcheck_core::validate_extraction(
        &set,
        &record,
        document_layout.as_ref(),
        &BoxCheckOptions::default(),
    );
    if let Some(e) = unreadable {
        result.checks.push(validate::unreadable_check(&e.to_string()));
    }
    Ok(result)
}
