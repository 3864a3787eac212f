//! Print-grade PDF packaging: one page per composited canvas, with crop
//! marks placed for trimming the bleed margin.
//!
//! All physical geometry is expressed in millimeters and converted to PDF
//! points with the standard 72 pt/inch, 25.4 mm/inch relation. The rendered
//! raster is assumed to already include the bleed margin; this packager
//! only reserves page space for the marks and draws them at the trim edge.

use image::RgbaImage;
use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref};

use crate::error::Result;
use crate::export::embed_canvas;

/// Exact millimeter → point conversion (72 pt/inch ÷ 25.4 mm/inch).
pub const MM_TO_PT: f64 = 2.83465;

/// Pixels map to points 1:1 (72 DPI artwork contract).
pub const PX_TO_PT: f64 = 1.0;

/// Bleed margin the artwork is expected to carry, in millimeters.
pub const BLEED_MM: f64 = 3.0;

/// Crop mark length, measured outward from its inner end.
pub const CROP_MARK_LENGTH_MM: f64 = 2.0;

/// Gap between the trim edge and the inner end of each mark. The gap keeps
/// the marks off the artwork: a cut line drawn on the artwork edge would be
/// useless to a print shop.
pub const CROP_MARK_OFFSET_MM: f64 = 1.0;

const CROP_MARK_WIDTH_PT: f32 = 0.5;

/// Page layout for one canvas, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub page_w: f64,
    pub page_h: f64,
    /// Artwork origin; the trim box coincides with the artwork box.
    pub art_x: f64,
    pub art_y: f64,
    pub art_w: f64,
    pub art_h: f64,
}

impl PageGeometry {
    /// Compute the page for a canvas of the given pixel dimensions.
    ///
    /// Page = artwork + 2 × (mark length + mark offset) per axis; the
    /// artwork sits at (length + offset, length + offset) at its exact
    /// point-equivalent size.
    pub fn for_canvas_px(width: u32, height: u32) -> PageGeometry {
        let margin = (CROP_MARK_LENGTH_MM + CROP_MARK_OFFSET_MM) * MM_TO_PT;
        let art_w = f64::from(width) * PX_TO_PT;
        let art_h = f64::from(height) * PX_TO_PT;
        PageGeometry {
            page_w: art_w + 2.0 * margin,
            page_h: art_h + 2.0 * margin,
            art_x: margin,
            art_y: margin,
            art_w,
            art_h,
        }
    }

    /// Landscape iff the computed width is at least the height.
    pub fn is_landscape(&self) -> bool {
        self.page_w >= self.page_h
    }
}

/// The eight crop-mark segments for a page, as `(x1, y1, x2, y2)` in
/// points. Two per corner: one horizontal, one vertical, each starting one
/// offset outside the trim edge and extending one length further out.
pub fn crop_mark_segments(geometry: &PageGeometry) -> [(f64, f64, f64, f64); 8] {
    let offset = CROP_MARK_OFFSET_MM * MM_TO_PT;
    let length = CROP_MARK_LENGTH_MM * MM_TO_PT;

    let left = geometry.art_x;
    let right = geometry.art_x + geometry.art_w;
    let bottom = geometry.art_y;
    let top = geometry.art_y + geometry.art_h;

    [
        // bottom-left
        (left - offset - length, bottom, left - offset, bottom),
        (left, bottom - offset - length, left, bottom - offset),
        // bottom-right
        (right + offset, bottom, right + offset + length, bottom),
        (right, bottom - offset - length, right, bottom - offset),
        // top-left
        (left - offset - length, top, left - offset, top),
        (left, top + offset, left, top + offset + length),
        // top-right
        (right + offset, top, right + offset + length, top),
        (right, top + offset, right, top + offset + length),
    ]
}

const CATALOG_REF: Ref = Ref::new(1);
const TREE_REF: Ref = Ref::new(2);

/// Incrementally builds the multi-page print PDF, one page per call.
pub struct PrintPdfBuilder {
    pdf: Pdf,
    page_refs: Vec<Ref>,
    next_id: i32,
}

impl PrintPdfBuilder {
    pub fn new() -> PrintPdfBuilder {
        let mut pdf = Pdf::new();
        pdf.catalog(CATALOG_REF).pages(TREE_REF);
        PrintPdfBuilder {
            pdf,
            page_refs: Vec::new(),
            next_id: 3,
        }
    }

    fn alloc(&mut self) -> Ref {
        let id = self.next_id;
        self.next_id += 1;
        Ref::new(id)
    }

    /// Append one page carrying `canvas` at its exact point size, framed by
    /// crop marks.
    pub fn add_page(&mut self, canvas: &RgbaImage) -> Result<()> {
        let geometry = PageGeometry::for_canvas_px(canvas.width(), canvas.height());

        let page_ref = self.alloc();
        let content_ref = self.alloc();
        let image_ref = self.alloc();
        let image_name_str = format!("Im{}", image_ref.get());
        let image_name = Name(image_name_str.as_bytes());

        let mut page = self.pdf.page(page_ref);
        page.media_box(Rect::new(
            0.0,
            0.0,
            geometry.page_w as f32,
            geometry.page_h as f32,
        ));
        page.parent(TREE_REF);
        page.contents(content_ref);
        let mut resources = page.resources();
        resources.x_objects().pair(image_name, image_ref);
        resources.finish();
        page.finish();

        let mut content = Content::new();
        content.save_state();
        content.transform([
            geometry.art_w as f32,
            0.0,
            0.0,
            geometry.art_h as f32,
            geometry.art_x as f32,
            geometry.art_y as f32,
        ]);
        content.x_object(image_name);
        content.restore_state();

        content.set_stroke_rgb(0.0, 0.0, 0.0);
        content.set_line_width(CROP_MARK_WIDTH_PT);
        for (x1, y1, x2, y2) in crop_mark_segments(&geometry) {
            content.move_to(x1 as f32, y1 as f32);
            content.line_to(x2 as f32, y2 as f32);
        }
        content.stroke();

        self.pdf.stream(content_ref, &content.finish());
        embed_canvas(&mut self.pdf, image_ref, canvas)?;
        self.page_refs.push(page_ref);
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.page_refs.len()
    }

    /// Write the page tree and return the finished document bytes.
    pub fn finish(mut self) -> Vec<u8> {
        let count = self.page_refs.len() as i32;
        self.pdf
            .pages(TREE_REF)
            .kids(self.page_refs.iter().copied())
            .count(count);
        self.pdf.finish()
    }
}

impl Default for PrintPdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}
