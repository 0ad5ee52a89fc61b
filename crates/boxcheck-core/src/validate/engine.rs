use crate::expectations::resolve_alias;
use crate::expectations::schema::{ExpectationSet, SectionDef};
use crate::model::{BoxResult, DocumentLayout, ExtractionRecord};
use crate::validate::outcome::Check;
use indexmap::IndexMap;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy)]
pub struct BoxCheckOptions {
    /// Report a value found outside its box (but elsewhere in the document)
    /// as a notice instead of a failure.
    pub notice_mislocated: bool,
}

impl Default for BoxCheckOptions {
    fn default() -> Self {
        BoxCheckOptions {
            notice_mislocated: true,
        }
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.contains(needle)
}

/// `<label>__exists` for every expected value: a literal substring search
/// over the full first-half text. Empty values never pass.
pub fn full_doc_checks(expected: &IndexMap<String, String>, full_text: &str) -> Vec<Check> {
    expected
        .iter()
        .map(|(label, value)| {
            let name = format!("{}__exists", label);
            if contains(full_text, value) {
                Check::passed(name)
            } else {
                Check::failed(
                    name,
                    format!("Expected '{}' not found in full first-half text", value),
                )
            }
        })
        .collect()
}

/// Placement checks driven by the box mapping.
///
/// Each mapped box yields `<box>__box_present`, then every label in it
/// yields either `<label>__expected_missing` (no expected value after alias
/// resolution) or `<canonical>__in_<box>`. A missing box is matched as
/// empty text so its label checks still appear in the report.
pub fn box_checks(
    expected: &IndexMap<String, String>,
    box_mapping: &IndexMap<String, Vec<String>>,
    aliases: &IndexMap<String, String>,
    boxes: &BTreeMap<String, BoxResult>,
    full_text: &str,
    options: &BoxCheckOptions,
) -> Vec<Check> {
    let mut checks = Vec::new();

    for (box_name, labels) in box_mapping {
        let found = boxes.get(box_name);
        let box_text = found.map(|b| b.raw_text.as_str()).unwrap_or("");
        let present_name = format!("{}__box_present", box_name);
        match found {
            Some(_) => checks.push(Check::passed(present_name)),
            None => {
                tracing::debug!(box_name = %box_name, "box missing from extraction");
                checks.push(Check::failed(
                    present_name,
                    format!("Box '{}' missing from extraction JSON", box_name),
                ));
            }
        }

        for label in labels {
            let canonical = resolve_alias(label, aliases);
            let Some(value) = expected.get(canonical) else {
                checks.push(Check::failed(
                    format!("{}__expected_missing", label),
                    format!(
                        "No expected value provided for '{}' (canonical: '{}')",
                        label, canonical
                    ),
                ));
                continue;
            };

            let name = format!("{}__in_{}", canonical, box_name);
            if contains(box_text, value) {
                checks.push(Check::passed(name));
            } else if options.notice_mislocated && found.is_some() && contains(full_text, value) {
                checks.push(Check::notice(
                    name,
                    format!(
                        "Expected '{}' not found in {} but present elsewhere in the document",
                        value, box_name
                    ),
                ));
            } else {
                checks.push(Check::failed(
                    name,
                    format!("Expected '{}' not found in {}", value, box_name),
                ));
            }
        }
    }

    checks
}

/// Compare presence of each value between the whole document and a section.
///
/// `labels` empty means every expected label. Present in both scopes passes,
/// present in neither fails, anything else is a mismatch notice.
pub fn cross_checks(
    expected: &IndexMap<String, String>,
    labels: &[String],
    aliases: &IndexMap<String, String>,
    full_document: &str,
    section_text: &str,
    section_name: &str,
) -> Vec<Check> {
    let selected: Vec<&str> = if labels.is_empty() {
        expected.keys().map(String::as_str).collect()
    } else {
        labels.iter().map(String::as_str).collect()
    };

    let mut checks = Vec::with_capacity(selected.len());
    for label in selected {
        let canonical = resolve_alias(label, aliases);
        let Some(value) = expected.get(canonical) else {
            checks.push(Check::failed(
                format!("{}__expected_missing", label),
                format!(
                    "No expected value provided for '{}' (canonical: '{}')",
                    label, canonical
                ),
            ));
            continue;
        };

        let name = format!("{}__cross_{}", canonical, section_name);
        let in_document = contains(full_document, value);
        let in_section = contains(section_text, value);
        let check = match (in_document, in_section) {
            (true, true) => Check::passed(name),
            (false, false) => Check::failed(
                name,
                format!(
                    "Expected '{}' not found in full document or {} section",
                    value, section_name
                ),
            ),
            (true, false) => Check::notice(
                name,
                format!(
                    "'{}' found in full document but not in {} section",
                    value, section_name
                ),
            ),
            (false, true) => Check::notice(
                name,
                format!(
                    "'{}' found in {} section but not in full document",
                    value, section_name
                ),
            ),
        };
        checks.push(check);
    }
    checks
}

/// Checks confined to the section text.
///
/// Each section-only value yields `<label>__in_<section>` and each indicator
/// caption yields `<indicator>__indicator_<section>`.
pub fn section_checks(section: &SectionDef, section_text: &str) -> Vec<Check> {
    let mut checks = Vec::with_capacity(section.expected.len() + section.indicators.len());
    for (label, value) in &section.expected {
        let name = format!("{}__in_{}", label, section.name);
        if contains(section_text, value) {
            checks.push(Check::passed(name));
        } else {
            checks.push(Check::failed(
                name,
                format!("Expected '{}' not found in {} section", value, section.name),
            ));
        }
    }
    for indicator in &section.indicators {
        let name = format!("{}__indicator_{}", indicator, section.name);
        if contains(section_text, indicator) {
            checks.push(Check::passed(name));
        } else {
            checks.push(Check::failed(
                name,
                format!("Missing '{}' in {} section", indicator, section.name),
            ));
        }
    }
    checks
}

/// `document__has_text`: blank text is its own failure, distinct from an
/// unreadable file.
pub fn document_checks(full_text: &str) -> Vec<Check> {
    let name = "document__has_text";
    if full_text.trim().is_empty() {
        vec![Check::failed(name, "No data found")]
    } else {
        vec![Check::passed(name)]
    }
}

/// The single failing check reported when the PDF cannot be opened.
pub fn unreadable_check(reason: &str) -> Check {
    Check::failed("document__readable", format!("Unable to read PDF: {}", reason))
}

/// Every check for one extraction: document, existence, placement and,
/// when both a section and a layout are supplied, cross-validation plus the
/// section-only checks.
pub fn run_checks(
    set: &ExpectationSet,
    record: &ExtractionRecord,
    layout: Option<&DocumentLayout>,
    options: &BoxCheckOptions,
) -> Vec<Check> {
    let mut checks = document_checks(&record.full_text);
    checks.extend(full_doc_checks(&set.expected, &record.full_text));
    checks.extend(box_checks(
        &set.expected,
        &set.box_mapping,
        &set.aliases,
        &record.boxes,
        &record.full_text,
        options,
    ));

    match (&set.section, layout) {
        (Some(section), Some(layout)) => {
            checks.extend(cross_checks(
                &set.expected,
                &section.labels,
                &set.aliases,
                &layout.full_document,
                &layout.section_text,
                &section.name,
            ));
            checks.extend(section_checks(section, &layout.section_text));
        }
        (Some(section), None) => {
            tracing::warn!(section = %section.name, "no layout supplied, skipping cross-validation")
        }
        _ => {}
    }

    checks
}
