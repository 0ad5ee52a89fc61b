use crate::error::BoxcheckError;
use crate::extraction::{vector, BBox, PageContent, PageDrawings, PdfExtractor, Word};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::Write;
use std::path::Path;
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Words come from `pdftotext -bbox`, page text from plain `pdftotext`.
/// pdftotext has no vector output, so drawings and page rotation are read
/// from the content streams with lopdf (see [`vector`]).
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, BoxcheckError> {
        // The temp file is removed when it drops, on every return path.
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| BoxcheckError::Extraction(e.to_string()))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| BoxcheckError::Extraction(e.to_string()))?;
        let tmp_path = tmpfile.path().to_path_buf();

        let xml = run_pdftotext(&["-bbox"], &tmp_path)?;
        let bbox_pages = parse_bbox_xml(&xml)?;

        let text = run_pdftotext(&[], &tmp_path)?;
        // pdftotext terminates every page with a form feed.
        let page_texts: Vec<&str> = text.split('\x0c').collect();

        let rotations = match lopdf::Document::load_mem(pdf_bytes) {
            Ok(doc) => vector::page_rotations(&doc),
            Err(e) => {
                tracing::warn!("could not read page rotation: {e}");
                Vec::new()
            }
        };

        let pages: Vec<PageContent> = bbox_pages
            .into_iter()
            .enumerate()
            .map(|(i, page)| PageContent {
                page_index: i,
                width: page.width,
                height: page.height,
                rotation: rotations.get(i).copied().unwrap_or(0),
                text: page_texts
                    .get(i)
                    .map(|t| t.trim_end_matches('\n').to_string())
                    .unwrap_or_default(),
                words: page.words,
            })
            .collect();

        tracing::debug!(pages = pages.len(), "pdftotext extraction complete");
        Ok(pages)
    }

    fn extract_drawings(&self, pdf_bytes: &[u8]) -> Result<Vec<PageDrawings>, BoxcheckError> {
        vector::extract_drawings(pdf_bytes)
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

fn run_pdftotext(args: &[&str], pdf_path: &Path) -> Result<String, BoxcheckError> {
    let output = Command::new("pdftotext")
        .args(args)
        .arg(pdf_path)
        .arg("-") // output to stdout
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BoxcheckError::PdftotextNotFound
            } else {
                BoxcheckError::Extraction(format!("pdftotext {} failed: {}", args.join(" "), e))
            }
        })?;

    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(BoxcheckError::PdftotextFailed { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[derive(Debug, Clone, Default)]
struct BBoxPage {
    width: f64,
    height: f64,
    words: Vec<Word>,
}

/// Parse the XHTML produced by `pdftotext -bbox`.
fn parse_bbox_xml(xml: &str) -> Result<Vec<BBoxPage>, BoxcheckError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pages: Vec<BBoxPage> = Vec::new();
    let mut current_word: Option<BBox> = None;
    let mut word_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"page" => pages.push(parse_page(e)),
                b"word" => {
                    current_word = parse_word_bbox(e);
                    word_text.clear();
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"page" {
                    pages.push(parse_page(e));
                }
            }
            Ok(Event::Text(e)) => {
                if current_word.is_some() {
                    let decoded = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                    word_text.push_str(&decoded);
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"word" {
                    if let (Some(bbox), Some(page)) = (current_word.take(), pages.last_mut()) {
                        let text = word_text.trim();
                        if !text.is_empty() {
                            page.words.push(Word::new(text, bbox));
                        }
                    }
                    word_text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(BoxcheckError::Extraction(format!(
                    "malformed pdftotext -bbox output at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(pages)
}

fn parse_page(tag: &BytesStart<'_>) -> BBoxPage {
    BBoxPage {
        width: attr_f64(tag, "width").unwrap_or(0.0),
        height: attr_f64(tag, "height").unwrap_or(0.0),
        words: Vec::new(),
    }
}

fn parse_word_bbox(tag: &BytesStart<'_>) -> Option<BBox> {
    Some(BBox::new(
        attr_f64(tag, "xMin")?,
        attr_f64(tag, "yMin")?,
        attr_f64(tag, "xMax")?,
        attr_f64(tag, "yMax")?,
    ))
}

fn attr_f64(tag: &BytesStart<'_>, name: &str) -> Option<f64> {
    let attr = tag.try_get_attribute(name).ok()??;
    attr.unescape_value().ok()?.trim().parse().ok()
}
