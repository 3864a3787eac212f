//! # Export Module
//!
//! Encodes composited canvases into deliverable artifacts.
//!
//! ## Modules
//!
//! - [`print_pdf`]: multi-page print PDF with bleed-aware crop marks
//! - [`archive`]: flat ZIP packaging of named outputs

pub mod archive;
pub mod print_pdf;

use std::io::Cursor;
use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbaImage;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};
use serde::{Deserialize, Serialize};

use crate::error::{EtiquetadorError, Result};

/// Output format for individual items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
        }
    }
}

/// Encode one composited canvas in the requested format.
///
/// PNG encodes the raster directly. PDF wraps it as a single full-bleed
/// page sized exactly to the canvas pixel dimensions (1 px = 1 pt, no
/// scaling).
pub fn export_item(canvas: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Png => encode_png(canvas),
        ExportFormat::Pdf => single_page_pdf(canvas),
    }
}

/// PNG-encode a canvas.
pub fn encode_png(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    canvas
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| EtiquetadorError::Export(format!("PNG encoding failed: {e}")))?;
    Ok(bytes)
}

/// Single full-bleed PDF page at the canvas's exact point size.
fn single_page_pdf(canvas: &RgbaImage) -> Result<Vec<u8>> {
    let width = canvas.width() as f32;
    let height = canvas.height() as f32;

    let catalog_ref = Ref::new(1);
    let tree_ref = Ref::new(2);
    let page_ref = Ref::new(3);
    let content_ref = Ref::new(4);
    let image_ref = Ref::new(5);

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_ref).pages(tree_ref);

    let mut page = pdf.page(page_ref);
    page.media_box(Rect::new(0.0, 0.0, width, height));
    page.parent(tree_ref);
    page.contents(content_ref);
    let mut resources = page.resources();
    resources.x_objects().pair(Name(b"Im0"), image_ref);
    resources.finish();
    page.finish();

    let mut content = Content::new();
    content.save_state();
    content.transform([width, 0.0, 0.0, height, 0.0, 0.0]);
    content.x_object(Name(b"Im0"));
    content.restore_state();
    pdf.stream(content_ref, &content.finish());

    embed_canvas(&mut pdf, image_ref, canvas)?;

    pdf.pages(tree_ref).kids([page_ref]).count(1);
    Ok(pdf.finish())
}

/// Write a canvas into a PDF as a FlateDecode DeviceRGB image XObject.
///
/// The canvas is flattened over white first: print artwork carries no
/// transparency.
pub(crate) fn embed_canvas(pdf: &mut Pdf, image_ref: Ref, canvas: &RgbaImage) -> Result<()> {
    let rgb = flatten_over_white(canvas);
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    let compressed = encoder
        .write_all(&rgb)
        .and_then(|_| encoder.finish())
        .map_err(|e| EtiquetadorError::Export(format!("image stream compression failed: {e}")))?;

    let mut xobject = pdf.image_xobject(image_ref, &compressed);
    xobject.filter(Filter::FlateDecode);
    xobject.width(canvas.width() as i32);
    xobject.height(canvas.height() as i32);
    xobject.color_space().device_rgb();
    xobject.bits_per_component(8);
    xobject.finish();
    Ok(())
}

/// Alpha-composite the canvas onto an opaque white background, RGB8.
fn flatten_over_white(canvas: &RgbaImage) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(canvas.width() as usize * canvas.height() as usize * 3);
    for px in canvas.pixels() {
        let [r, g, b, a] = px.0;
        let a = u16::from(a);
        for channel in [r, g, b] {
            let blended = (u16::from(channel) * a + 255 * (255 - a) + 127) / 255;
            rgb.push(blended.min(255) as u8);
        }
    }
    rgb
}
