pub mod pdftotext;
pub mod vector;

use crate::error::BoxcheckError;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in top-left-origin page space (y grows downwards).
///
/// Serialized as `[x0, y0, x1, y1]`, the layout used by template and
/// extraction JSON files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        BBox {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Non-degenerate: strictly positive width and height.
    pub fn is_valid(&self) -> bool {
        self.x_min < self.x_max && self.y_min < self.y_max
    }

    /// Inclusive overlap test; touching edges and partial overlap both count.
    pub fn intersects(&self, other: &BBox) -> bool {
        !(other.x_max < self.x_min
            || other.x_min > self.x_max
            || other.y_max < self.y_min
            || other.y_min > self.y_max)
    }

    /// Overlapping area of two rectangles, `None` when it has no area.
    pub fn clip(&self, other: &BBox) -> Option<BBox> {
        let clipped = BBox::new(
            self.x_min.max(other.x_min),
            self.y_min.max(other.y_min),
            self.x_max.min(other.x_max),
            self.y_max.min(other.y_max),
        );
        clipped.is_valid().then_some(clipped)
    }

    /// Express this rectangle as fractions of a `width` x `height` page.
    pub fn normalize(&self, width: f64, height: f64) -> BBox {
        BBox::new(
            self.x_min / width,
            self.y_min / height,
            self.x_max / width,
            self.y_max / height,
        )
    }

    /// Inverse of [`BBox::normalize`] for a page of the given size.
    pub fn denormalize(&self, width: f64, height: f64) -> BBox {
        BBox::new(
            self.x_min * width,
            self.y_min * height,
            self.x_max * width,
            self.y_max * height,
        )
    }

    pub fn translate(&self, dx: f64, dy: f64) -> BBox {
        BBox::new(
            self.x_min + dx,
            self.y_min + dy,
            self.x_max + dx,
            self.y_max + dy,
        )
    }

    /// Smallest rectangle containing all `points`, or `None` when empty.
    pub fn enclosing(points: &[(f64, f64)]) -> Option<BBox> {
        let (&(x, y), rest) = points.split_first()?;
        let mut bbox = BBox::new(x, y, x, y);
        for &(x, y) in rest {
            bbox.x_min = bbox.x_min.min(x);
            bbox.y_min = bbox.y_min.min(y);
            bbox.x_max = bbox.x_max.max(x);
            bbox.y_max = bbox.y_max.max(y);
        }
        Some(bbox)
    }
}

impl From<[f64; 4]> for BBox {
    fn from(v: [f64; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x_min, b.y_min, b.x_max, b.y_max]
    }
}

/// A word on a page with its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub bbox: BBox,
}

impl Word {
    pub fn new(text: impl Into<String>, bbox: BBox) -> Self {
        Word {
            text: text.into(),
            bbox,
        }
    }

    /// Left edge.
    pub fn x0(&self) -> f64 {
        self.bbox.x_min
    }

    /// Distance of the upper edge from the top of the page.
    pub fn top(&self) -> f64 {
        self.bbox.y_min
    }
}

/// Path construction primitive recorded for a drawn shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathItem {
    MoveTo,
    LineTo,
    CurveTo,
    Rect,
    Close,
}

/// A painted vector path.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Position of this path in the page's paint order.
    pub index: usize,
    pub bbox: BBox,
    /// Line width for stroked paths; `None` for fill-only paths.
    pub stroke_width: Option<f64>,
    pub items: Vec<PathItem>,
}

impl Shape {
    pub fn has_rect(&self) -> bool {
        self.items.contains(&PathItem::Rect)
    }

    pub fn is_stroked(&self) -> bool {
        self.stroke_width.is_some()
    }
}

/// Text layer of a single page.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 0-based page index.
    pub page_index: usize,
    pub width: f64,
    pub height: f64,
    /// Page rotation in degrees (0, 90, 180 or 270).
    pub rotation: i32,
    /// Plain text of the page in reading order.
    pub text: String,
    pub words: Vec<Word>,
}

/// Vector layer of a single page.
#[derive(Debug, Clone)]
pub struct PageDrawings {
    pub page_index: usize,
    pub width: f64,
    pub height: f64,
    pub shapes: Vec<Shape>,
}

/// Trait for PDF extraction backends.
pub trait PdfExtractor: Send + Sync {
    /// Extract words and plain text, returning one PageContent per page.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageContent>, BoxcheckError>;

    /// Extract painted vector paths, returning one PageDrawings per page.
    fn extract_drawings(&self, pdf_bytes: &[u8]) -> Result<Vec<PageDrawings>, BoxcheckError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
