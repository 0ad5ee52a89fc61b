use boxcheck_core::error::BoxcheckError;
use boxcheck_core::validate::{BoxCheckOptions, NoticePolicy};
use std::path::{Path, PathBuf};

use crate::output;

/// Returns whether every check passed under the notice policy.
pub fn run(
    extraction: &Path,
    expectations_file: Option<PathBuf>,
    preset: Option<String>,
    layout: Option<PathBuf>,
    output_format: &str,
    allow_notices: bool,
) -> Result<bool, BoxcheckError> {
    let set = super::load_expectation_set(expectations_file, preset)?;
    let record = boxcheck_core::boxes::load_extraction(extraction)?;
    let layout = layout
        .map(|path| boxcheck_core::layout::load_document_layout(&path))
        .transpose()?;

    let report = boxcheck_core::validate_extraction(
        &set,
        &record,
        layout.as_ref(),
        &BoxCheckOptions::default(),
    );

    match output_format {
        "json" => output::json::print(&report)?,
        "flat" => output::json::print(&boxcheck_core::report::flat_results(&report.checks))?,
        _ => output::text::print(&report),
    }

    let policy = if allow_notices {
        NoticePolicy::Allow
    } else {
        NoticePolicy::Fail
    };
    Ok(report.is_success(policy))
}
