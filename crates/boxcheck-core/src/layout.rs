use crate::cache;
use crate::error::BoxcheckError;
use crate::extraction::{PageContent, PdfExtractor, Word};
use crate::model::{DocumentLayout, LayoutPage, LayoutRecord, TextItem};
use std::path::{Path, PathBuf};

/// First page of the P45 section in the forms this tool was built for.
pub const DEFAULT_SECTION_START_PAGE: usize = 6;

#[derive(Debug, Clone, Copy)]
pub struct LayoutOptions {
    /// Maximum difference in `top` between a word and the first word of the
    /// line it joins.
    pub line_tolerance: f64,
    /// 1-based page where the section used for cross-validation starts.
    pub section_start_page: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            line_tolerance: 2.0,
            section_start_page: DEFAULT_SECTION_START_PAGE,
        }
    }
}

/// A line of words before conversion to a [`TextItem`].
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    /// Leftmost `x0` of the line's words.
    pub x: f64,
    /// `page_height - min(top)`, i.e. bottom-origin.
    pub y: f64,
}

/// Group a page's words into lines.
///
/// Words are ordered by `(-top, x0)`; a new line starts whenever a word's
/// `top` differs from the first word of the current line by more than
/// `tolerance`. Words keep that order inside the line.
pub fn group_lines(words: &[Word], page_height: f64, tolerance: f64) -> Vec<TextLine> {
    let mut ordered: Vec<&Word> = words.iter().collect();
    ordered.sort_by(|a, b| {
        b.top()
            .total_cmp(&a.top())
            .then_with(|| a.x0().total_cmp(&b.x0()))
    });

    let mut groups: Vec<Vec<&Word>> = Vec::new();
    let mut line_top: Option<f64> = None;

    for word in ordered {
        let same_line = matches!(line_top, Some(top) if (word.top() - top).abs() <= tolerance);
        if same_line {
            if let Some(current) = groups.last_mut() {
                current.push(word);
                continue;
            }
        }
        line_top = Some(word.top());
        groups.push(vec![word]);
    }

    groups
        .into_iter()
        .map(|line| {
            let text = line
                .iter()
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let x = line.iter().map(|w| w.x0()).fold(f64::INFINITY, f64::min);
            let top = line.iter().map(|w| w.top()).fold(f64::INFINITY, f64::min);
            TextLine {
                text,
                x,
                y: page_height - top,
            }
        })
        .collect()
}

/// Build the page -> lines layout record for a document.
pub fn build_layout(pages: &[PageContent], options: &LayoutOptions) -> LayoutRecord {
    let pages = pages
        .iter()
        .map(|page| {
            let page_number = page.page_index + 1;
            let text_items = group_lines(&page.words, page.height, options.line_tolerance)
                .into_iter()
                .map(|line| TextItem {
                    text: line.text,
                    x: round3(line.x),
                    y: round3(line.y),
                    page: page_number,
                })
                .collect();
            LayoutPage {
                page_number,
                rotation: page.rotation,
                text_items,
            }
        })
        .collect();

    LayoutRecord { pages }
}

/// Build the layout plus whole-document and section text.
pub fn build_document_layout(
    filename: &str,
    pages: &[PageContent],
    options: &LayoutOptions,
) -> DocumentLayout {
    let layout = build_layout(pages, options);

    let mut full_lines = Vec::new();
    let mut section_lines = Vec::new();
    for page in &layout.pages {
        for item in &page.text_items {
            full_lines.push(item.text.as_str());
            if page.page_number >= options.section_start_page {
                section_lines.push(item.text.as_str());
            }
        }
    }

    let full_document = full_lines.join("\n");
    let section_text = section_lines.join("\n");

    tracing::debug!(
        pages = layout.pages.len(),
        section_start = options.section_start_page,
        "built document layout"
    );

    DocumentLayout {
        filename: filename.to_string(),
        extraction_date: chrono::Local::now().to_rfc3339(),
        full_document,
        section_text,
        section_start_page: options.section_start_page,
        layout,
    }
}

/// Read a PDF and build its document layout, named after the bare file name.
pub fn build_document_layout_from_pdf(
    pdf_path: &Path,
    extractor: &dyn PdfExtractor,
    options: &LayoutOptions,
) -> Result<DocumentLayout, BoxcheckError> {
    cache::require_file(pdf_path)?;
    let pdf_bytes = std::fs::read(pdf_path)?;
    let pages = extractor.extract_pages(&pdf_bytes)?;
    let filename = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let layout = build_document_layout(&filename, &pages, options);
    tracing::info!(
        pdf = %pdf_path.display(),
        backend = extractor.backend_name(),
        pages = layout.layout.pages.len(),
        "built layout"
    );
    Ok(layout)
}

/// `<pdf stem>.layout.json`
pub fn layout_file_name(pdf_path: &Path) -> String {
    format!("{}.layout.json", cache::file_stem(pdf_path))
}

pub fn write_document_layout(
    layout: &DocumentLayout,
    path: &Path,
) -> Result<PathBuf, BoxcheckError> {
    let written = cache::write_json(layout, path, true)?;
    tracing::info!(path = %written.display(), "wrote layout JSON");
    Ok(written)
}

pub fn load_document_layout(path: &Path) -> Result<DocumentLayout, BoxcheckError> {
    cache::load_json(path)
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::BBox;

    fn word(text: &str, x0: f64, top: f64) -> Word {
        Word::new(text, BBox::new(x0, top, x0 + 10.0, top + 8.0))
    }

    fn page(index: usize, words: Vec<Word>) -> PageContent {
        PageContent {
            page_index: index,
            width: 600.0,
            height: 800.0,
            rotation: 0,
            text: String::new(),
            words,
        }
    }

    #[test]
    fn test_no_words_no_lines() {
        assert!(group_lines(&[], 800.0, 2.0).is_empty());
    }

    #[test]
    fn test_same_top_ordered_left_to_right() {
        let words = vec![
            word("4BA", 80.0, 100.0),
            word("London", 10.0, 100.0),
            word("W2", 60.0, 100.0),
        ];
        let lines = group_lines(&words, 800.0, 2.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "London W2 4BA");
        assert_eq!(lines[0].x, 10.0);
        assert_eq!(lines[0].y, 700.0);
    }

    #[test]
    fn test_lines_split_beyond_tolerance_and_ordered_by_descending_top() {
        let words = vec![
            word("Avenue", 10.0, 100.0),
            word("Street", 50.0, 101.5),
            word("London", 10.0, 120.0),
        ];
        let lines = group_lines(&words, 800.0, 2.0);
        assert_eq!(lines.len(), 2);
        // Larger top sorts first under the (-top, x0) key.
        assert_eq!(lines[0].text, "London");
        // Within tolerance: the word with the larger top leads.
        assert_eq!(lines[1].text, "Street Avenue");
        assert_eq!(lines[1].x, 10.0);
        assert_eq!(lines[1].y, 700.0);
    }

    #[test]
    fn test_tolerance_measured_from_first_word_of_line() {
        let words = vec![
            word("a", 0.0, 104.0),
            word("b", 0.0, 102.5),
            word("c", 0.0, 101.0),
        ];
        let lines = group_lines(&words, 800.0, 2.0);
        let texts: Vec<_> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["a b", "c"]);
    }

    #[test]
    fn test_document_layout_section_split() {
        let pages: Vec<PageContent> = (0..7)
            .map(|i| page(i, vec![word(&format!("p{}", i + 1), 5.0, 50.0)]))
            .collect();
        let doc = build_document_layout("UMS025.pdf", &pages, &LayoutOptions::default());

        assert_eq!(doc.layout.pages.len(), 7);
        assert_eq!(doc.layout.pages[0].page_number, 1);
        assert_eq!(doc.full_document, "p1\np2\np3\np4\np5\np6\np7");
        assert_eq!(doc.section_text, "p6\np7");
        assert_eq!(doc.layout.pages[5].text_items[0].page, 6);
    }

    #[test]
    fn test_layout_json_uses_camel_case() {
        let pages = [page(0, vec![word("MR", 1.23456, 10.0)])];
        let record = build_layout(&pages, &LayoutOptions::default());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["pages"][0]["pageNumber"], 1);
        assert_eq!(json["pages"][0]["textItems"][0]["x"], 1.235);
        assert_eq!(json["pages"][0]["textItems"][0]["y"], 790.0);
    }

    #[test]
    fn test_layout_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let pages = [page(0, vec![word("MR", 5.0, 50.0)])];
        let doc = build_document_layout("UMS025.pdf", &pages, &LayoutOptions::default());
        let path = dir.path().join(layout_file_name(Path::new("pdfs/UMS025.pdf")));
        assert!(path.ends_with("UMS025.layout.json"));
        let written = write_document_layout(&doc, &path).unwrap();
        assert_eq!(load_document_layout(&written).unwrap(), doc);
    }
}
