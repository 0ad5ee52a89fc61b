use crate::extraction::BBox;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    #[default]
    Normalized,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationType {
    #[default]
    RectangleDrawn,
}

/// How the text of a field is pulled out of the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldExtractor {
    #[default]
    Words,
}

/// A named field region in normalized (0..1) page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBox {
    pub name: String,
    pub annotation_type: AnnotationType,
    #[serde(rename = "box")]
    pub bbox: BBox,
    #[serde(default)]
    pub extractor: FieldExtractor,
    #[serde(default)]
    pub parsers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTemplate {
    /// 0-based page index.
    pub page_num: usize,
    pub fields: Vec<FieldBox>,
    /// Reserved for table regions; always written empty.
    #[serde(default)]
    pub tables: Vec<serde_json::Value>,
}

/// Page-size-independent description of every field region of a document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub doc_type: String,
    #[serde(default)]
    pub units: Units,
    pub pages: Vec<PageTemplate>,
}

impl Template {
    pub fn field_count(&self) -> usize {
        self.pages.iter().map(|p| p.fields.len()).sum()
    }
}

/// Text found inside one field box of a target document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxResult {
    pub page: usize,
    pub raw_text: String,
    pub count_words: usize,
    /// The box in page-absolute units of the target page (diagnostic only).
    pub box_denorm: BBox,
}

/// Result of applying a template to one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub doc_path: String,
    pub doc_type: String,
    #[serde(default)]
    pub boxes: BTreeMap<String, BoxResult>,
    #[serde(default)]
    pub full_text: String,
}

/// One grouped line of text. `y` is bottom-origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    pub text: String,
    pub x: f64,
    pub y: f64,
    /// 1-based page number.
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPage {
    pub page_number: usize,
    pub rotation: i32,
    pub text_items: Vec<TextItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutRecord {
    pub pages: Vec<LayoutPage>,
}

/// Line layout of a whole document plus the text scopes used for
/// cross-validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub filename: String,
    pub extraction_date: String,
    /// Every line of every page, joined with newlines.
    pub full_document: String,
    /// Lines of pages numbered `section_start_page` and later.
    pub section_text: String,
    pub section_start_page: usize,
    pub layout: LayoutRecord,
}
