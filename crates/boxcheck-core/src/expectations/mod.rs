pub mod builtin;
pub mod schema;

use crate::error::BoxcheckError;
use indexmap::IndexMap;
use schema::ExpectationSet;
use std::path::Path;

/// Load an expectation set from a JSON file.
pub fn load_expectations(path: &Path) -> Result<ExpectationSet, BoxcheckError> {
    let content = std::fs::read_to_string(path).map_err(|e| BoxcheckError::ExpectationLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_expectations(&content, path)
}

/// Parse an expectation set from a JSON string.
pub fn parse_expectations(json: &str, source: &Path) -> Result<ExpectationSet, BoxcheckError> {
    let set: ExpectationSet =
        serde_json::from_str(json).map_err(|e| BoxcheckError::ExpectationLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_expectations(&set)?;
    Ok(set)
}

/// Parse an expectation set from a JSON string (no file path context).
pub fn parse_expectations_str(json: &str) -> Result<ExpectationSet, BoxcheckError> {
    let set: ExpectationSet = serde_json::from_str(json).map_err(BoxcheckError::Json)?;
    validate_expectations(&set)?;
    Ok(set)
}

/// Resolve a label through the alias table (a single lookup).
pub fn resolve_alias<'a>(label: &'a str, aliases: &'a IndexMap<String, String>) -> &'a str {
    aliases.get(label).map(String::as_str).unwrap_or(label)
}

/// Validate that an expectation set is well-formed.
pub fn validate_expectations(set: &ExpectationSet) -> Result<(), BoxcheckError> {
    if set.name.trim().is_empty() {
        return Err(BoxcheckError::ExpectationInvalid(
            "name must not be empty".into(),
        ));
    }

    if set.expected.is_empty() {
        return Err(BoxcheckError::ExpectationInvalid(
            "expected must contain at least one value".into(),
        ));
    }

    if set.expected.keys().any(|label| label.trim().is_empty()) {
        return Err(BoxcheckError::ExpectationInvalid(
            "expected labels must not be empty".into(),
        ));
    }

    for (box_name, labels) in &set.box_mapping {
        if box_name.trim().is_empty() {
            return Err(BoxcheckError::ExpectationInvalid(
                "box_mapping has an empty box name".into(),
            ));
        }
        if labels.iter().any(|l| l.trim().is_empty()) {
            return Err(BoxcheckError::ExpectationInvalid(format!(
                "box '{}' lists an empty label",
                box_name
            )));
        }
    }

    for (alias, canonical) in &set.aliases {
        if alias == canonical {
            return Err(BoxcheckError::ExpectationInvalid(format!(
                "alias '{}' maps to itself",
                alias
            )));
        }
    }

    if let Some(ref section) = set.section {
        if section.name.trim().is_empty() {
            return Err(BoxcheckError::ExpectationInvalid(
                "section name must not be empty".into(),
            ));
        }
        if section.start_page == 0 {
            return Err(BoxcheckError::ExpectationInvalid(format!(
                "section '{}' start_page is 1-based and must be at least 1",
                section.name
            )));
        }
        if section.expected.keys().any(|label| label.trim().is_empty()) {
            return Err(BoxcheckError::ExpectationInvalid(format!(
                "section '{}' has an empty expected label",
                section.name
            )));
        }
        if section.indicators.iter().any(|i| i.trim().is_empty()) {
            return Err(BoxcheckError::ExpectationInvalid(format!(
                "section '{}' lists an empty indicator",
                section.name
            )));
        }
    }

    Ok(())
}

/// Non-fatal issues: labels that will produce `__expected_missing` checks.
pub fn expectation_warnings(set: &ExpectationSet) -> Vec<String> {
    let mut warnings = Vec::new();

    for (box_name, labels) in &set.box_mapping {
        for label in labels {
            let canonical = set.canonical(label);
            if !set.expected.contains_key(canonical) {
                warnings.push(format!(
                    "box '{}' expects label '{}' (canonical '{}') which has no expected value",
                    box_name, label, canonical
                ));
            }
        }
    }

    for (alias, canonical) in &set.aliases {
        if !set.expected.contains_key(canonical) {
            warnings.push(format!(
                "alias '{}' points at '{}' which has no expected value",
                alias, canonical
            ));
        }
    }

    if let Some(ref section) = set.section {
        for label in &section.labels {
            if !set.expected.contains_key(set.canonical(label)) {
                warnings.push(format!(
                    "section '{}' cross-checks label '{}' which has no expected value",
                    section.name, label
                ));
            }
        }
        for (label, value) in &section.expected {
            if value.is_empty() {
                warnings.push(format!(
                    "section '{}' label '{}' has an empty expected value",
                    section.name, label
                ));
            }
        }
    }

    for (label, value) in &set.expected {
        if value.is_empty() {
            warnings.push(format!("label '{}' has an empty expected value", label));
        }
    }

    warnings
}
