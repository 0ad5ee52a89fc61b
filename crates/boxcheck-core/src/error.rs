use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum BoxcheckError {
    #[error("PDF extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("expected output folder does not exist: {}. Create it before running.", .0.display())]
    MissingDirectory(PathBuf),

    #[error("no template found: neither {} nor {} exists", template.display(), boxes_pdf.display())]
    NoTemplate {
        template: PathBuf,
        boxes_pdf: PathBuf,
    },

    #[error("invalid template: {0}")]
    TemplateInvalid(String),

    #[error("template references page {page} but the document has {page_count} page(s)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("failed to load expectations from {}: {reason}", path.display())]
    ExpectationLoad { path: PathBuf, reason: String },

    #[error("invalid expectation set: {0}")]
    ExpectationInvalid(String),

    #[error("unknown preset '{name}'. Available: {available}")]
    UnknownPreset { name: String, available: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BoxcheckError {
    /// True for errors raised while opening or parsing the PDF itself,
    /// as opposed to missing inputs or configuration problems.
    pub fn is_unreadable_pdf(&self) -> bool {
        matches!(
            self,
            BoxcheckError::Extraction(_) | BoxcheckError::PdftotextFailed { .. }
        )
    }
}
