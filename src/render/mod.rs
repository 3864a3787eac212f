//! # Rendering Module
//!
//! Composites one work item onto a raster canvas: the template base image
//! stretched to the canvas, the QR raster stretched into the QR frame, and
//! the optional label. Callers only ever see the finished canvas or an
//! error; no partial state escapes.
//!
//! ## Modules
//!
//! - [`qr`]: QR raster acquisition (uploaded assets or generation)
//! - [`label`]: label text drawing

pub mod label;
pub mod qr;

use image::{RgbaImage, imageops};
use tracing::debug;

use crate::assets::AssetIndex;
use crate::error::Result;
use crate::manifest::Item;
use crate::template::{RenderOptions, TemplateDef};

/// Render one item to a raster canvas.
///
/// The base image is stretched to exactly fill the canvas (the template's
/// frame coordinates are defined against that exact size, so letterboxing
/// would mis-register the QR and label). The QR raster is produced at a
/// square of side `max(frame.w, frame.h)` and then stretched non-uniformly
/// to fill the frame rectangle; the frame's own aspect is the intended QR
/// aspect and is normally square.
pub fn render_item(
    item: &Item,
    index: &AssetIndex,
    template: &TemplateDef,
    options: &RenderOptions,
) -> Result<RgbaImage> {
    let (width, height) = template.canvas_size();
    debug!(numero = %item.numero_key(), width, height, "rendering item");

    let mut canvas = if template.base_image.dimensions() == (width, height) {
        template.base_image.as_ref().clone()
    } else {
        imageops::resize(
            template.base_image.as_ref(),
            width,
            height,
            imageops::FilterType::Triangle,
        )
    };

    let (fx, fy, fw, fh) = template.frame.pixel_rect();
    let qr_side = fw.max(fh);
    let qr = qr::qr_for_item(item, index, qr_side)?;
    let qr_scaled = if qr.dimensions() == (fw, fh) {
        qr
    } else {
        imageops::resize(&qr, fw, fh, imageops::FilterType::Triangle)
    };
    imageops::overlay(&mut canvas, &qr_scaled, fx, fy);

    if let (Some(label_box), Some(text)) = (template.label_box, template.label_text.as_deref()) {
        label::draw_label(&mut canvas, label_box, text, options)?;
    }

    Ok(canvas)
}
