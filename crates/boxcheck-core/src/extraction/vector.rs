//! Vector path scanning over page content streams.
//!
//! Every painted path becomes one [`Shape`]. Coordinates are reported in
//! top-left-origin page units of the displayed (rotated) page, which is the
//! same space pdftotext uses for word boxes.

use crate::error::BoxcheckError;
use crate::extraction::{BBox, PageDrawings, PathItem, Shape};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Affine matrix `[a b c d e f]` as used by the PDF `cm` operator.
type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// US Letter, used when a page carries no usable MediaBox.
const DEFAULT_PAGE_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Form XObjects nested deeper than this are skipped.
const MAX_FORM_DEPTH: usize = 16;

/// Parse a PDF and collect the painted paths on every page.
pub fn extract_drawings(pdf_bytes: &[u8]) -> Result<Vec<PageDrawings>, BoxcheckError> {
    let doc = Document::load_mem(pdf_bytes)
        .map_err(|e| BoxcheckError::Extraction(format!("failed to parse PDF: {e}")))?;

    let mut pages = Vec::new();
    for (page_index, page_id) in doc.get_pages().into_values().enumerate() {
        let frame = PageFrame::for_page(&doc, page_id);
        let resources = resolve_inherited(&doc, page_id, b"Resources")
            .and_then(|obj| obj.as_dict().ok());
        let shapes = match doc
            .get_page_content(page_id)
            .and_then(|bytes| Content::decode(&bytes))
        {
            Ok(content) => {
                let mut scanner = PathScanner::new(&doc, &frame);
                scanner.scan(&content.operations, resources, GraphicsState::default(), 0);
                scanner.shapes
            }
            Err(e) => {
                tracing::warn!(page = page_index, "skipping unreadable content stream: {e}");
                Vec::new()
            }
        };
        tracing::debug!(page = page_index, shapes = shapes.len(), "scanned vector paths");
        pages.push(PageDrawings {
            page_index,
            width: frame.width(),
            height: frame.height(),
            shapes,
        });
    }

    Ok(pages)
}

/// Rotation in degrees (0, 90, 180, 270) for every page, in page order.
pub fn page_rotations(doc: &Document) -> Vec<i32> {
    doc.get_pages()
        .into_values()
        .map(|page_id| page_rotation(doc, page_id))
        .collect()
}

fn page_rotation(doc: &Document, page_id: ObjectId) -> i32 {
    resolve_inherited(doc, page_id, b"Rotate")
        .and_then(|obj| obj.as_i64().ok())
        .map(normalize_rotation)
        .unwrap_or(0)
}

fn normalize_rotation(degrees: i64) -> i32 {
    let r = degrees.rem_euclid(360);
    // Only quarter turns are legal; snap anything else down.
    (r - r % 90) as i32
}

/// Visible page area plus rotation, used to map user space to page space.
#[derive(Debug, Clone, Copy)]
struct PageFrame {
    bbox: BBox,
    rotation: i32,
}

impl PageFrame {
    fn for_page(doc: &Document, page_id: ObjectId) -> Self {
        let page_box = resolve_inherited(doc, page_id, b"CropBox")
            .and_then(|obj| rect_from_object(doc, obj))
            .or_else(|| {
                resolve_inherited(doc, page_id, b"MediaBox")
                    .and_then(|obj| rect_from_object(doc, obj))
            })
            .unwrap_or_else(|| {
                tracing::warn!("page has no usable MediaBox, assuming US Letter");
                BBox::from(DEFAULT_PAGE_BOX)
            });

        PageFrame {
            bbox: page_box,
            rotation: page_rotation(doc, page_id),
        }
    }

    fn is_sideways(&self) -> bool {
        self.rotation == 90 || self.rotation == 270
    }

    fn width(&self) -> f64 {
        if self.is_sideways() {
            self.bbox.height()
        } else {
            self.bbox.width()
        }
    }

    fn height(&self) -> f64 {
        if self.is_sideways() {
            self.bbox.width()
        } else {
            self.bbox.height()
        }
    }

    /// Map a user-space point (bottom-left origin) to displayed page space.
    fn to_page(&self, x: f64, y: f64) -> (f64, f64) {
        let w = self.bbox.width();
        let h = self.bbox.height();
        let ux = x - self.bbox.x_min;
        let uy = self.bbox.y_max - y;
        match self.rotation {
            90 => (h - uy, ux),
            180 => (w - ux, h - uy),
            270 => (uy, w - ux),
            _ => (ux, uy),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    ctm: Matrix,
    line_width: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        GraphicsState {
            ctm: IDENTITY,
            line_width: 1.0,
        }
    }
}

#[derive(Debug, Default)]
struct PathBuilder {
    items: Vec<PathItem>,
    points: Vec<(f64, f64)>,
}

impl PathBuilder {
    fn add(&mut self, item: PathItem, coords: &[f64], state: &GraphicsState, frame: &PageFrame) {
        self.items.push(item);
        for pair in coords.chunks_exact(2) {
            let (x, y) = apply(&state.ctm, pair[0], pair[1]);
            self.points.push(frame.to_page(x, y));
        }
    }

    fn add_rect(&mut self, coords: &[f64], state: &GraphicsState, frame: &PageFrame) {
        let (x, y, w, h) = (coords[0], coords[1], coords[2], coords[3]);
        let corners = [x, y, x + w, y, x + w, y + h, x, y + h];
        self.add(PathItem::Rect, &corners, state, frame);
    }

    fn clear(&mut self) {
        self.items.clear();
        self.points.clear();
    }

    fn finish(&mut self, stroke_width: Option<f64>, shapes: &mut Vec<Shape>) {
        if !self.items.is_empty() {
            if let Some(bbox) = BBox::enclosing(&self.points) {
                shapes.push(Shape {
                    index: shapes.len(),
                    bbox,
                    stroke_width,
                    items: std::mem::take(&mut self.items),
                });
            }
        }
        self.clear();
    }
}

/// Walks content streams of one page, following Form XObjects.
///
/// Shapes from a form share the page's index counter, so a rectangle drawn
/// inside a form is numbered in paint order with the rest of the page.
struct PathScanner<'a> {
    doc: &'a Document,
    frame: &'a PageFrame,
    shapes: Vec<Shape>,
}

impl<'a> PathScanner<'a> {
    fn new(doc: &'a Document, frame: &'a PageFrame) -> Self {
        PathScanner {
            doc,
            frame,
            shapes: Vec::new(),
        }
    }

    fn scan(
        &mut self,
        operations: &[Operation],
        resources: Option<&'a Dictionary>,
        initial: GraphicsState,
        depth: usize,
    ) {
        let frame = self.frame;
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut state = initial;
        let mut path = PathBuilder::default();

        for op in operations {
            let nums: Vec<f64> = op.operands.iter().filter_map(number).collect();
            match (op.operator.as_str(), nums.len()) {
                ("q", _) => stack.push(state),
                ("Q", _) => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                ("cm", 6) => {
                    let m = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]];
                    state.ctm = multiply(&m, &state.ctm);
                }
                ("w", 1) => state.line_width = nums[0],
                ("m", 2) => path.add(PathItem::MoveTo, &nums, &state, frame),
                ("l", 2) => path.add(PathItem::LineTo, &nums, &state, frame),
                ("c", 6) | ("v", 4) | ("y", 4) => {
                    path.add(PathItem::CurveTo, &nums, &state, frame)
                }
                ("re", 4) => path.add_rect(&nums, &state, frame),
                ("h", _) => path.items.push(PathItem::Close),
                ("S" | "s" | "B" | "B*" | "b" | "b*", _) => {
                    path.finish(Some(state.line_width), &mut self.shapes)
                }
                ("f" | "F" | "f*", _) => path.finish(None, &mut self.shapes),
                ("n", _) => path.clear(),
                ("Do", _) => {
                    if let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) {
                        self.paint_form(name, resources, &state, depth);
                    }
                }
                _ => {}
            }
        }
    }

    /// Scan a Form XObject as if its content were inlined at the `Do`.
    fn paint_form(
        &mut self,
        name: &[u8],
        resources: Option<&'a Dictionary>,
        state: &GraphicsState,
        depth: usize,
    ) {
        let doc = self.doc;
        let Some(stream) = resources.and_then(|r| lookup_xobject(doc, r, name)) else {
            return;
        };
        let is_form = stream
            .dict
            .get(b"Subtype")
            .and_then(Object::as_name)
            .map(|subtype| subtype == b"Form")
            .unwrap_or(false);
        if !is_form {
            return;
        }
        if depth >= MAX_FORM_DEPTH {
            tracing::warn!(
                form = %String::from_utf8_lossy(name),
                "form XObjects nested too deeply, skipping"
            );
            return;
        }

        let content = match plain_content(stream).and_then(|bytes| Content::decode(&bytes)) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    form = %String::from_utf8_lossy(name),
                    "skipping unreadable form XObject: {e}"
                );
                return;
            }
        };
        let matrix = stream
            .dict
            .get(b"Matrix")
            .ok()
            .and_then(|obj| matrix_from_object(doc, obj))
            .unwrap_or(IDENTITY);
        let form_resources = stream
            .dict
            .get(b"Resources")
            .ok()
            .and_then(|obj| deref(doc, obj).as_dict().ok())
            .or(resources);

        let mut inner = *state;
        inner.ctm = multiply(&matrix, &state.ctm);
        self.scan(&content.operations, form_resources, inner, depth + 1);
    }
}

fn lookup_xobject<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    name: &[u8],
) -> Option<&'a Stream> {
    let xobjects = deref(doc, resources.get(b"XObject").ok()?).as_dict().ok()?;
    deref(doc, xobjects.get(name).ok()?).as_stream().ok()
}

fn plain_content(stream: &Stream) -> lopdf::Result<Vec<u8>> {
    if stream.dict.get(b"Filter").is_ok() {
        stream.decompressed_content()
    } else {
        Ok(stream.content.clone())
    }
}

fn matrix_from_object(doc: &Document, obj: &Object) -> Option<Matrix> {
    let v: Vec<f64> = deref(doc, obj)
        .as_array()
        .ok()?
        .iter()
        .filter_map(|o| number(deref(doc, o)))
        .collect();
    match v.as_slice() {
        [a, b, c, d, e, f] => Some([*a, *b, *c, *d, *e, *f]),
        _ => None,
    }
}

/// `m x n`, i.e. `m` applied first. `cm` sets CTM' = M x CTM.
fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn apply(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

fn rect_from_object(doc: &Document, obj: &Object) -> Option<BBox> {
    let array = deref(doc, obj).as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let v: Vec<f64> = array.iter().filter_map(|o| number(deref(doc, o))).collect();
    if v.len() != 4 {
        return None;
    }
    let bbox = BBox::new(v[0].min(v[2]), v[1].min(v[3]), v[0].max(v[2]), v[1].max(v[3]));
    bbox.is_valid().then_some(bbox)
}

fn deref<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Look up a page attribute, walking up the page tree via /Parent.
fn resolve_inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = page_id;
    // Bounded so a cyclic /Parent chain cannot loop forever.
    for _ in 0..64 {
        let dict = doc.get_object(current).and_then(Object::as_dict).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(deref(doc, value));
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    fn int(v: i64) -> Object {
        Object::Integer(v)
    }

    fn op(operator: &str, operands: &[i64]) -> Operation {
        Operation::new(operator, operands.iter().map(|v| int(*v)).collect())
    }

    fn pdf_with_ops(operations: Vec<Operation>, rotate: Option<i64>) -> Vec<u8> {
        build_pdf(operations, rotate, None)
    }

    /// One page whose resources hold a single form XObject named `Fm1`.
    fn pdf_with_form(
        page_ops: Vec<Operation>,
        form_ops: Vec<Operation>,
        matrix: Option<[i64; 6]>,
    ) -> Vec<u8> {
        let mut form_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![int(0), int(0), int(612), int(792)],
        };
        if let Some(m) = matrix {
            form_dict.set("Matrix", m.iter().map(|v| int(*v)).collect::<Vec<_>>());
        }
        let form = Stream::new(form_dict, Content { operations: form_ops }.encode().unwrap());
        build_pdf(page_ops, None, Some(form))
    }

    fn do_form() -> Operation {
        Operation::new("Do", vec![Object::Name(b"Fm1".to_vec())])
    }

    fn build_pdf(
        operations: Vec<Operation>,
        rotate: Option<i64>,
        form: Option<Stream>,
    ) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![int(0), int(0), int(612), int(792)],
            "Contents" => content_id,
        };
        if let Some(r) = rotate {
            page.set("Rotate", int(r));
        }
        if let Some(form) = form {
            let form_id = doc.add_object(form);
            page.set(
                "Resources",
                dictionary! { "XObject" => dictionary! { "Fm1" => form_id } },
            );
        }
        let page_id = doc.add_object(page);

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => int(1),
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_stroked_rectangle_in_page_space() {
        let pdf = pdf_with_ops(
            vec![op("w", &[2]), op("re", &[50, 600, 200, 100]), op("S", &[])],
            None,
        );
        let pages = extract_drawings(&pdf).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].width, 612.0);
        assert_eq!(pages[0].height, 792.0);

        let shape = &pages[0].shapes[0];
        assert!(shape.has_rect());
        assert_eq!(shape.stroke_width, Some(2.0));
        assert_eq!(shape.bbox, BBox::new(50.0, 92.0, 250.0, 192.0));
    }

    #[test]
    fn test_fill_only_path_has_no_stroke_width() {
        let pdf = pdf_with_ops(vec![op("re", &[0, 0, 100, 100]), op("f", &[])], None);
        let pages = extract_drawings(&pdf).unwrap();
        let shape = &pages[0].shapes[0];
        assert!(shape.has_rect());
        assert!(!shape.is_stroked());
    }

    #[test]
    fn test_line_path_is_not_a_rectangle() {
        let pdf = pdf_with_ops(
            vec![op("m", &[10, 10]), op("l", &[300, 10]), op("S", &[])],
            None,
        );
        let pages = extract_drawings(&pdf).unwrap();
        assert_eq!(pages[0].shapes.len(), 1);
        assert!(!pages[0].shapes[0].has_rect());
    }

    #[test]
    fn test_clip_path_is_discarded_and_indices_follow_paint_order() {
        let pdf = pdf_with_ops(
            vec![
                op("re", &[0, 0, 612, 792]),
                op("W", &[]),
                op("n", &[]),
                op("re", &[10, 10, 50, 50]),
                op("f", &[]),
                op("re", &[100, 100, 80, 40]),
                op("S", &[]),
            ],
            None,
        );
        let pages = extract_drawings(&pdf).unwrap();
        let shapes = &pages[0].shapes;
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].index, 0);
        assert_eq!(shapes[1].index, 1);
        assert!(shapes[1].is_stroked());
    }

    #[test]
    fn test_cm_and_graphics_state_stack() {
        let pdf = pdf_with_ops(
            vec![
                op("q", &[]),
                op("cm", &[1, 0, 0, 1, 100, 100]),
                op("re", &[0, 0, 10, 10]),
                op("S", &[]),
                op("Q", &[]),
                op("re", &[0, 0, 10, 10]),
                op("S", &[]),
            ],
            None,
        );
        let pages = extract_drawings(&pdf).unwrap();
        let shapes = &pages[0].shapes;
        assert_eq!(shapes[0].bbox, BBox::new(100.0, 682.0, 110.0, 692.0));
        assert_eq!(shapes[1].bbox, BBox::new(0.0, 782.0, 10.0, 792.0));
    }

    #[test]
    fn test_rectangle_inside_form_xobject() {
        let pdf = pdf_with_form(
            vec![op("q", &[]), do_form(), op("Q", &[])],
            vec![op("w", &[1]), op("re", &[50, 600, 200, 100]), op("S", &[])],
            None,
        );
        let pages = extract_drawings(&pdf).unwrap();
        let shapes = &pages[0].shapes;
        assert_eq!(shapes.len(), 1);
        assert!(shapes[0].has_rect());
        assert_eq!(shapes[0].stroke_width, Some(1.0));
        assert_eq!(shapes[0].bbox, BBox::new(50.0, 92.0, 250.0, 192.0));
    }

    #[test]
    fn test_form_matrix_and_shared_index_counter() {
        let pdf = pdf_with_form(
            vec![
                op("re", &[10, 10, 50, 50]),
                op("f", &[]),
                op("q", &[]),
                op("cm", &[1, 0, 0, 1, 0, -100]),
                do_form(),
                op("Q", &[]),
                op("re", &[300, 300, 20, 20]),
                op("S", &[]),
            ],
            vec![op("re", &[50, 600, 200, 100]), op("S", &[])],
            Some([1, 0, 0, 1, 100, 0]),
        );
        let pages = extract_drawings(&pdf).unwrap();
        let shapes = &pages[0].shapes;
        assert_eq!(shapes.len(), 3);
        assert_eq!(shapes[1].index, 1);
        // Form matrix shifts right by 100, the outer cm shifts down by 100.
        assert_eq!(shapes[1].bbox, BBox::new(150.0, 192.0, 350.0, 292.0));
        assert_eq!(shapes[2].index, 2);
        assert_eq!(shapes[2].bbox, BBox::new(300.0, 472.0, 320.0, 492.0));
    }

    #[test]
    fn test_unknown_xobject_is_ignored() {
        let pdf = pdf_with_ops(
            vec![do_form(), op("re", &[0, 0, 10, 10]), op("S", &[])],
            None,
        );
        let pages = extract_drawings(&pdf).unwrap();
        assert_eq!(pages[0].shapes.len(), 1);
        assert_eq!(pages[0].shapes[0].index, 0);
    }

    #[test]
    fn test_rotated_page_swaps_dimensions() {
        let pdf = pdf_with_ops(vec![op("re", &[0, 0, 10, 20]), op("S", &[])], Some(90));
        let pages = extract_drawings(&pdf).unwrap();
        assert_eq!(pages[0].width, 792.0);
        assert_eq!(pages[0].height, 612.0);
        // Bottom-left corner of the unrotated page ends up at the top-left.
        assert_eq!(pages[0].shapes[0].bbox, BBox::new(0.0, 0.0, 20.0, 10.0));
    }

    #[test]
    fn test_page_rotations() {
        let pdf = pdf_with_ops(vec![], Some(-90));
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(page_rotations(&doc), vec![270]);
    }

    #[test]
    fn test_invalid_bytes_is_extraction_error() {
        let err = extract_drawings(b"not a pdf").unwrap_err();
        assert!(err.is_unreadable_pdf());
    }
}
