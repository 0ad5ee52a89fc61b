use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ground truth for one document type: expected field values, which box
/// each value must be found in, and label aliases.
///
/// Maps keep the order of the JSON file, and checks are reported in it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationSet {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    /// Label -> value that must appear verbatim in the document.
    pub expected: IndexMap<String, String>,
    /// Box name -> labels whose values must appear inside that box.
    #[serde(default)]
    pub box_mapping: IndexMap<String, Vec<String>>,
    /// Alternate label spelling -> canonical label in `expected`.
    #[serde(default)]
    pub aliases: IndexMap<String, String>,
    /// Optional sub-section cross-validated against the whole document.
    #[serde(default)]
    pub section: Option<SectionDef>,
}

/// A trailing range of pages (e.g. the P45 part of a pension pack).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionDef {
    pub name: String,
    /// 1-based first page of the section.
    pub start_page: usize,
    /// Labels to cross-validate. Empty means every expected label.
    #[serde(default)]
    pub labels: Vec<String>,
    /// Values printed only inside the section, checked against its text alone.
    #[serde(default)]
    pub expected: IndexMap<String, String>,
    /// Field captions the section must carry to count as this kind of form.
    #[serde(default)]
    pub indicators: Vec<String>,
}

impl ExpectationSet {
    /// Canonical form of `label` after one alias lookup.
    pub fn canonical<'a>(&'a self, label: &'a str) -> &'a str {
        super::resolve_alias(label, &self.aliases)
    }
}
