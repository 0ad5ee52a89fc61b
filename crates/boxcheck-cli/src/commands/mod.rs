pub mod expectations;
pub mod extract;
pub mod layout;
pub mod run;
pub mod template;
pub mod validate;

use boxcheck_core::error::BoxcheckError;
use boxcheck_core::expectations::builtin;
use boxcheck_core::expectations::schema::ExpectationSet;
use std::path::PathBuf;

/// Preset used when neither `--expectations` nor `--preset` is given.
pub const DEFAULT_PRESET: &str = "ums025";

/// Load the expectation set selected on the command line.
pub fn load_expectation_set(
    file: Option<PathBuf>,
    preset: Option<String>,
) -> Result<ExpectationSet, BoxcheckError> {
    let set = match (file, preset) {
        (Some(path), _) => boxcheck_core::expectations::load_expectations(&path)?,
        (None, Some(name)) => builtin::load_preset(&name)?,
        (None, None) => builtin::load_preset(DEFAULT_PRESET)?,
    };
    for warning in boxcheck_core::expectations::expectation_warnings(&set) {
        tracing::warn!("{}", warning);
    }
    Ok(set)
}
