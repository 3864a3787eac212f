//! # Template Definitions
//!
//! A template is a base image plus the placement geometry for the QR code
//! and the optional label. Templates are immutable per render call; the
//! per-item variant produced by [`TemplateDef::prepare_for_item`] is a copy
//! with the label text resolved, never a mutation of the shared template.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::{EtiquetadorError, Result};
use crate::export::ExportFormat;
use crate::manifest::Item;

/// Axis-aligned rectangle in template-pixel coordinates.
///
/// Used for both the QR placement zone and the label zone. `w` and `h`
/// stay positive; interactive edits are clamped into the template bounds
/// with [`Frame::clamped_to`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Frame {
    /// Clamp the frame into a `width` × `height` pixel canvas.
    pub fn clamped_to(self, width: u32, height: u32) -> Frame {
        let max_w = width.max(1) as f64;
        let max_h = height.max(1) as f64;
        let w = self.w.clamp(1.0, max_w);
        let h = self.h.clamp(1.0, max_h);
        Frame {
            x: self.x.clamp(0.0, max_w - w),
            y: self.y.clamp(0.0, max_h - h),
            w,
            h,
        }
    }

    /// Integer pixel rectangle for drawing: rounded origin, size at least 1.
    pub fn pixel_rect(self) -> (i64, i64, u32, u32) {
        (
            self.x.round() as i64,
            self.y.round() as i64,
            (self.w.round() as i64).max(1) as u32,
            (self.h.round() as i64).max(1) as u32,
        )
    }
}

/// Style knobs for the label. Pure value object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Label text color as `#rrggbb`.
    pub text_color: String,
    /// Skip the opaque label background fill.
    pub transparent_background: bool,
    /// Label font pixel height; defaults to 60% of the label box height.
    pub font_size: Option<u32>,
    pub bold: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            text_color: "#000000".to_string(),
            transparent_background: false,
            font_size: None,
            bold: false,
        }
    }
}

/// On-disk template configuration, loaded from a JSON sidecar.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    /// Path to the base image, relative to the config file.
    pub base_image: String,
    /// Output canvas size; derived from the base image when absent.
    #[serde(default)]
    pub size: Option<(u32, u32)>,
    /// QR placement zone.
    pub frame: Frame,
    #[serde(default)]
    pub label_box: Option<Frame>,
    #[serde(default)]
    pub label_text: Option<String>,
    #[serde(default)]
    pub export_format: ExportFormat,
}

/// A template ready to render: decoded base image plus geometry.
#[derive(Debug, Clone)]
pub struct TemplateDef {
    /// Decoded base raster, shared between per-item copies.
    pub base_image: Arc<RgbaImage>,
    pub size: Option<(u32, u32)>,
    pub frame: Frame,
    pub label_box: Option<Frame>,
    pub label_text: Option<String>,
    pub export_format: ExportFormat,
}

impl TemplateDef {
    /// Build a template from an already-decoded base image.
    pub fn new(base_image: RgbaImage, frame: Frame) -> TemplateDef {
        TemplateDef {
            base_image: Arc::new(base_image),
            size: None,
            frame,
            label_box: None,
            label_text: None,
            export_format: ExportFormat::default(),
        }
    }

    /// Load a JSON template config and decode its base image.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<TemplateDef> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: TemplateConfig = serde_json::from_str(&text)
            .map_err(|e| EtiquetadorError::Template(format!("invalid template config: {e}")))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_config(&config, base_dir)
    }

    /// Build a template from a parsed config, resolving the base image path
    /// against `base_dir`.
    pub fn from_config(config: &TemplateConfig, base_dir: &Path) -> Result<TemplateDef> {
        let image_path = base_dir.join(&config.base_image);
        let bytes = std::fs::read(&image_path)?;
        let base = image::load_from_memory(&bytes)
            .map_err(|e| {
                EtiquetadorError::Template(format!(
                    "failed to decode base image {}: {e}",
                    image_path.display()
                ))
            })?
            .to_rgba8();
        Ok(TemplateDef {
            base_image: Arc::new(base),
            size: config.size,
            frame: config.frame,
            label_box: config.label_box,
            label_text: config.label_text.clone(),
            export_format: config.export_format,
        })
    }

    /// Output canvas pixel size: explicit `size` or the base image's
    /// intrinsic dimensions, never below 1×1.
    pub fn canvas_size(&self) -> (u32, u32) {
        let (w, h) = self
            .size
            .unwrap_or_else(|| (self.base_image.width(), self.base_image.height()));
        (w.max(1), h.max(1))
    }

    /// Per-item template instantiation.
    ///
    /// Without a label box the template is returned unchanged. An explicit
    /// non-empty `label_text` short-circuits the computation. Otherwise the
    /// label comes from the item's output name (or its numero key),
    /// prettified. Pure: the input template is never mutated.
    pub fn prepare_for_item(&self, item: &Item) -> TemplateDef {
        if self.label_box.is_none() {
            return self.clone();
        }
        if let Some(explicit) = &self.label_text {
            if !explicit.trim().is_empty() {
                return self.clone();
            }
        }
        let nombre = item.nombre_archivo_salida.trim();
        let source = if nombre.is_empty() {
            item.numero_key()
        } else {
            nombre.to_string()
        };
        TemplateDef {
            label_text: Some(prettify(&source)),
            ..self.clone()
        }
    }
}

/// Human-friendly label transform: runs of underscores/hyphens become one
/// space, a space is inserted at every digit↔non-digit boundary, repeated
/// whitespace collapses, and the result is trimmed.
pub fn prettify(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + 4);
    let mut prev: Option<char> = None;
    for c in source.chars() {
        let c = if c == '_' || c == '-' { ' ' } else { c };
        if let Some(p) = prev {
            let boundary = !p.is_whitespace()
                && !c.is_whitespace()
                && p.is_ascii_digit() != c.is_ascii_digit();
            if boundary {
                out.push(' ');
            }
        }
        out.push(c);
        prev = Some(c);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Numero;
    use pretty_assertions::assert_eq;

    fn item(numero: &str, nombre: &str) -> Item {
        Item {
            numero: Numero::parse(numero),
            enlace: String::new(),
            nombre_archivo_salida: nombre.to_string(),
        }
    }

    fn template_with_label_box() -> TemplateDef {
        let mut t = TemplateDef::new(
            RgbaImage::new(100, 100),
            Frame {
                x: 10.0,
                y: 10.0,
                w: 50.0,
                h: 50.0,
            },
        );
        t.label_box = Some(Frame {
            x: 10.0,
            y: 70.0,
            w: 80.0,
            h: 20.0,
        });
        t
    }

    #[test]
    fn prettify_replaces_separators_and_splits_digits() {
        assert_eq!(prettify("nombre_salida-01"), "nombre salida 01");
    }

    #[test]
    fn prettify_collapses_whitespace_and_trims() {
        assert_eq!(prettify("  a__b  "), "a b");
        assert_eq!(prettify("abc123def"), "abc 123 def");
    }

    #[test]
    fn prettify_leaves_plain_words_alone() {
        assert_eq!(prettify("etiqueta"), "etiqueta");
    }

    #[test]
    fn prepare_without_label_box_is_identity() {
        let t = TemplateDef::new(
            RgbaImage::new(10, 10),
            Frame {
                x: 0.0,
                y: 0.0,
                w: 5.0,
                h: 5.0,
            },
        );
        let prepared = t.prepare_for_item(&item("1", "x"));
        assert_eq!(prepared.label_text, None);
    }

    #[test]
    fn prepare_resolves_label_from_nombre() {
        let t = template_with_label_box();
        let prepared = t.prepare_for_item(&item("1", "nombre_salida-01"));
        assert_eq!(prepared.label_text.as_deref(), Some("nombre salida 01"));
        // the shared template is untouched
        assert_eq!(t.label_text, None);
    }

    #[test]
    fn prepare_falls_back_to_numero_key() {
        let t = template_with_label_box();
        let prepared = t.prepare_for_item(&item("45", ""));
        assert_eq!(prepared.label_text.as_deref(), Some("45"));
    }

    #[test]
    fn explicit_label_text_short_circuits() {
        let mut t = template_with_label_box();
        t.label_text = Some("Fijo".to_string());
        let prepared = t.prepare_for_item(&item("45", "ignorado"));
        assert_eq!(prepared.label_text.as_deref(), Some("Fijo"));
    }

    #[test]
    fn canvas_size_prefers_explicit_size() {
        let mut t = template_with_label_box();
        t.size = Some((320, 240));
        assert_eq!(t.canvas_size(), (320, 240));
        t.size = None;
        assert_eq!(t.canvas_size(), (100, 100));
    }

    #[test]
    fn frame_clamps_into_bounds() {
        let f = Frame {
            x: 90.0,
            y: -5.0,
            w: 30.0,
            h: 200.0,
        };
        let clamped = f.clamped_to(100, 100);
        assert_eq!(clamped.w, 30.0);
        assert_eq!(clamped.h, 100.0);
        assert_eq!(clamped.x, 70.0);
        assert_eq!(clamped.y, 0.0);
    }

    #[test]
    fn pixel_rect_never_collapses() {
        let f = Frame {
            x: 1.4,
            y: 2.6,
            w: 0.2,
            h: 0.2,
        };
        assert_eq!(f.pixel_rect(), (1, 3, 1, 1));
    }
}
