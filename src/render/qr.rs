//! QR raster acquisition: uploaded assets (PNG or SVG) or generation from
//! the item's enlace. All paths yield a square RGBA raster with the QR
//! aspect-fit centered on a transparent background.

use image::{RgbaImage, imageops};
use qrcode::{EcLevel, QrCode};

use crate::assets::{AssetIndex, AssetKind, UploadedAsset};
use crate::error::{EtiquetadorError, Result};
use crate::manifest::Item;

/// Obtain the QR raster for an item: a matching uploaded asset wins, then
/// generation from the enlace; with neither, the item cannot be rendered.
pub fn qr_for_item(item: &Item, index: &AssetIndex, size: u32) -> Result<RgbaImage> {
    let numero_key = item.numero_key();
    if let Some(asset) = index.get(&numero_key) {
        return rasterize_uploaded(asset, size);
    }
    if !item.enlace.is_empty() {
        return generate_qr(&item.enlace, size);
    }
    Err(EtiquetadorError::Render(format!(
        "no QR source for '{numero_key}': no uploaded asset and no enlace to generate from"
    )))
}

/// Generate a QR code raster encoding `url`.
///
/// Medium error correction, no quiet-zone margin, black modules on a
/// transparent background.
pub fn generate_qr(url: &str, size: u32) -> Result<RgbaImage> {
    if url.is_empty() {
        return Err(EtiquetadorError::Render(
            "cannot generate a QR without an enlace".to_string(),
        ));
    }
    let code = QrCode::with_error_correction_level(url, EcLevel::M)
        .map_err(|e| EtiquetadorError::Render(format!("QR generation failed: {e}")))?;

    let size = size.max(1);
    let modules = code.width();
    let mut img = RgbaImage::new(size, size);
    for py in 0..size {
        let qy = (py as usize * modules) / size as usize;
        for px in 0..size {
            let qx = (px as usize * modules) / size as usize;
            if code[(qx, qy)] == qrcode::Color::Dark {
                img.put_pixel(px, py, image::Rgba([0, 0, 0, 255]));
            }
        }
    }
    Ok(img)
}

/// Rasterize an uploaded QR file to a `size` × `size` square.
pub fn rasterize_uploaded(asset: &UploadedAsset, size: u32) -> Result<RgbaImage> {
    let size = size.max(1);
    match asset.kind {
        AssetKind::Png => {
            let decoded = image::load_from_memory(&asset.bytes)
                .map_err(|e| {
                    EtiquetadorError::Asset(format!(
                        "failed to decode uploaded QR {}: {e}",
                        asset.file_name
                    ))
                })?
                .to_rgba8();
            Ok(fit_into_square(&decoded, size))
        }
        AssetKind::Svg => rasterize_svg(asset, size),
    }
}

fn rasterize_svg(asset: &UploadedAsset, size: u32) -> Result<RgbaImage> {
    let tree = usvg::Tree::from_data(&asset.bytes, &usvg::Options::default()).map_err(|e| {
        EtiquetadorError::Asset(format!("failed to parse SVG {}: {e}", asset.file_name))
    })?;

    let svg_w = tree.size().width().max(1.0);
    let svg_h = tree.size().height().max(1.0);
    let (dw, dh) = fitted_dims(svg_w as f64, svg_h as f64, size);

    let mut pixmap = resvg::tiny_skia::Pixmap::new(dw, dh).ok_or_else(|| {
        EtiquetadorError::Render(format!("failed to allocate SVG pixmap for {}", asset.file_name))
    })?;
    let xform = resvg::tiny_skia::Transform::from_scale(dw as f32 / svg_w, dh as f32 / svg_h);
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    let mut raster = RgbaImage::new(dw, dh);
    for (i, px) in pixmap.pixels().iter().enumerate() {
        let c = px.demultiply();
        let x = (i as u32) % dw;
        let y = (i as u32) / dw;
        raster.put_pixel(x, y, image::Rgba([c.red(), c.green(), c.blue(), c.alpha()]));
    }

    let mut square = RgbaImage::new(size, size);
    imageops::overlay(
        &mut square,
        &raster,
        i64::from((size - dw) / 2),
        i64::from((size - dh) / 2),
    );
    Ok(square)
}

/// Aspect-fit a raster into a transparent `size` × `size` square, centered.
fn fit_into_square(source: &RgbaImage, size: u32) -> RgbaImage {
    let (dw, dh) = fitted_dims(f64::from(source.width()), f64::from(source.height()), size);
    let scaled = if (dw, dh) == source.dimensions() {
        source.clone()
    } else {
        imageops::resize(source, dw, dh, imageops::FilterType::Triangle)
    };
    let mut square = RgbaImage::new(size, size);
    imageops::overlay(
        &mut square,
        &scaled,
        i64::from((size - dw) / 2),
        i64::from((size - dh) / 2),
    );
    square
}

/// Aspect-preserving dimensions that fit `w` × `h` into a `size` square.
fn fitted_dims(w: f64, h: f64, size: u32) -> (u32, u32) {
    let scale = (f64::from(size) / w).min(f64::from(size) / h);
    let dw = ((w * scale).round() as u32).clamp(1, size);
    let dh = ((h * scale).round() as u32).clamp(1, size);
    (dw, dh)
}
