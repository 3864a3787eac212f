//! Label drawing onto the composited canvas.
//!
//! Renders the label text centered in the label box using the Spleen
//! bitmap font family scaled to the requested pixel height, optionally over
//! an opaque background fill. Text wider than the box is condensed to fit,
//! and ink is clipped to the box so it can never spill over the QR frame.

use image::{Rgba, RgbaImage};
use spleen_font::{FONT_12X24, PSF2Font};

use crate::error::{EtiquetadorError, Result};
use crate::template::{Frame, RenderOptions};

/// Base glyph cell of the Spleen 12x24 face.
const GLYPH_W: usize = 12;
const GLYPH_H: usize = 24;

/// Horizontal padding kept free inside the label box.
const LABEL_PADDING_PX: i64 = 8;

/// Draw `text` centered in `label_box`.
pub fn draw_label(
    canvas: &mut RgbaImage,
    label_box: Frame,
    text: &str,
    options: &RenderOptions,
) -> Result<()> {
    let (bx, by, bw, bh) = label_box.pixel_rect();
    let color = parse_hex_color(&options.text_color)?;

    if !options.transparent_background {
        fill_rect(canvas, bx, by, bw, bh, Rgba([255, 255, 255, 255]));
    }
    if text.is_empty() {
        return Ok(());
    }

    let font_size = options
        .font_size
        .map(|s| s.max(1) as usize)
        .unwrap_or_else(|| ((f64::from(bh) * 0.6).floor().max(10.0)) as usize);

    let chars: Vec<char> = text.chars().collect();
    let max_width = (i64::from(bw) - LABEL_PADDING_PX).max(10) as usize;
    let mut char_w = (font_size / 2).max(1);
    if char_w * chars.len() > max_width {
        // condense rather than overflow the box
        char_w = (max_width / chars.len()).max(1);
    }
    let text_w = char_w * chars.len();

    let x0 = bx + (i64::from(bw) - text_w as i64) / 2;
    let y0 = by + (i64::from(bh) - font_size as i64) / 2;
    // double-strike width for synthesized bold, scaled with the glyph
    let strike = if options.bold {
        (font_size / GLYPH_H).max(1)
    } else {
        0
    };

    // condensing bottoms out at 1 px per glyph, so very long text can
    // still exceed the box; ink outside it is dropped
    let (box_right, box_bottom) = (bx + i64::from(bw), by + i64::from(bh));

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let bitmap = glyph_bitmap(ch);
        let gx = x0 + (i * char_w) as i64;
        for dy in 0..font_size {
            let sy = dy * GLYPH_H / font_size;
            for dx in 0..char_w {
                let sx = dx * GLYPH_W / char_w;
                if bitmap[sy * GLYPH_W + sx] == 0 {
                    continue;
                }
                for extra in 0..=strike {
                    let px = gx + (dx + extra) as i64;
                    let py = y0 + dy as i64;
                    if px < bx || px >= box_right || py < by || py >= box_bottom {
                        continue;
                    }
                    put_pixel_clipped(canvas, px, py, color);
                }
            }
        }
    }
    Ok(())
}

/// 12x24 bitmap for a character: 1 = ink. Unknown characters draw a box so
/// missing glyphs stay visible in proofs.
fn glyph_bitmap(ch: char) -> Vec<u8> {
    let mut glyph = vec![0u8; GLYPH_W * GLYPH_H];
    let mut spleen = PSF2Font::new(FONT_12X24).unwrap();
    let utf8 = ch.to_string();
    if let Some(spleen_glyph) = spleen.glyph_for_utf8(utf8.as_bytes()) {
        for (row_y, row) in spleen_glyph.enumerate() {
            for (col_x, on) in row.enumerate() {
                let idx = row_y * GLYPH_W + col_x;
                if idx < glyph.len() {
                    glyph[idx] = if on { 1 } else { 0 };
                }
            }
        }
    } else {
        draw_box(&mut glyph, GLYPH_W, GLYPH_H);
    }
    glyph
}

/// Outline box used as the unknown-glyph fallback.
fn draw_box(glyph: &mut [u8], width: usize, height: usize) {
    for x in 0..width {
        glyph[x] = 1;
        glyph[(height - 1) * width + x] = 1;
    }
    for y in 0..height {
        glyph[y * width] = 1;
        glyph[y * width + width - 1] = 1;
    }
}

/// Parse `#rrggbb` into an opaque RGBA color.
pub fn parse_hex_color(text: &str) -> Result<Rgba<u8>> {
    let hex = text.trim().strip_prefix('#').unwrap_or(text.trim());
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(EtiquetadorError::Render(format!(
            "invalid text color '{text}', expected #rrggbb"
        )));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16).unwrap_or(0)
    };
    Ok(Rgba([channel(0..2), channel(2..4), channel(4..6), 255]))
}

fn fill_rect(canvas: &mut RgbaImage, x: i64, y: i64, w: u32, h: u32, color: Rgba<u8>) {
    for dy in 0..i64::from(h) {
        for dx in 0..i64::from(w) {
            put_pixel_clipped(canvas, x + dx, y + dy, color);
        }
    }
}

fn put_pixel_clipped(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && x < i64::from(canvas.width()) && y < i64::from(canvas.height()) {
        canvas.put_pixel(x as u32, y as u32, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label_box() -> Frame {
        Frame {
            x: 10.0,
            y: 10.0,
            w: 80.0,
            h: 20.0,
        }
    }

    fn count_color(canvas: &RgbaImage, color: [u8; 4]) -> usize {
        canvas.pixels().filter(|p| p.0 == color).count()
    }

    #[test]
    fn background_fill_is_opaque_white() {
        let mut canvas = RgbaImage::new(100, 50);
        draw_label(&mut canvas, label_box(), "", &RenderOptions::default()).unwrap();
        assert_eq!(canvas.get_pixel(15, 15).0, [255, 255, 255, 255]);
        // outside the box stays untouched
        assert_eq!(canvas.get_pixel(5, 5).0, [0, 0, 0, 0]);
    }

    #[test]
    fn transparent_background_skips_fill() {
        let mut canvas = RgbaImage::new(100, 50);
        let options = RenderOptions {
            transparent_background: true,
            ..RenderOptions::default()
        };
        draw_label(&mut canvas, label_box(), "", &options).unwrap();
        assert_eq!(canvas.get_pixel(15, 15).0, [0, 0, 0, 0]);
    }

    #[test]
    fn text_is_drawn_in_requested_color() {
        let mut canvas = RgbaImage::new(100, 50);
        let options = RenderOptions {
            text_color: "#ff0000".to_string(),
            ..RenderOptions::default()
        };
        draw_label(&mut canvas, label_box(), "A", &options).unwrap();
        assert!(count_color(&canvas, [255, 0, 0, 255]) > 0);
    }

    #[test]
    fn bold_covers_more_pixels_than_regular() {
        let mut regular = RgbaImage::new(100, 50);
        let mut bold = RgbaImage::new(100, 50);
        let options = RenderOptions::default();
        draw_label(&mut regular, label_box(), "A", &options).unwrap();
        let options = RenderOptions {
            bold: true,
            ..options
        };
        draw_label(&mut bold, label_box(), "A", &options).unwrap();
        assert!(count_color(&bold, [0, 0, 0, 255]) > count_color(&regular, [0, 0, 0, 255]));
    }

    #[test]
    fn long_text_condenses_into_the_box() {
        let mut canvas = RgbaImage::new(100, 50);
        let long = "x".repeat(64);
        draw_label(&mut canvas, label_box(), &long, &RenderOptions::default()).unwrap();
        // ink never escapes the label box horizontally
        let (bx, _, bw, _) = label_box().pixel_rect();
        for (x, _, p) in canvas.enumerate_pixels() {
            if p.0 == [0, 0, 0, 255] {
                assert!((i64::from(x)) >= bx && i64::from(x) < bx + i64::from(bw));
            }
        }
    }

    #[test]
    fn ink_stays_inside_the_box_even_when_condensing_bottoms_out() {
        // more glyphs than usable pixels: condensing alone cannot fit them
        let mut canvas = RgbaImage::new(300, 50);
        let lb = Frame {
            x: 100.0,
            y: 10.0,
            w: 80.0,
            h: 20.0,
        };
        // unknown glyphs draw the fallback box, so every cell carries ink
        let long = "\u{1F600}".repeat(100);
        draw_label(&mut canvas, lb, &long, &RenderOptions::default()).unwrap();
        let (bx, by, bw, bh) = lb.pixel_rect();
        for (x, y, p) in canvas.enumerate_pixels() {
            if p.0 == [0, 0, 0, 255] {
                assert!(i64::from(x) >= bx && i64::from(x) < bx + i64::from(bw));
                assert!(i64::from(y) >= by && i64::from(y) < by + i64::from(bh));
            }
        }
    }

    #[test]
    fn drawing_is_deterministic() {
        let mut a = RgbaImage::new(100, 50);
        let mut b = RgbaImage::new(100, 50);
        let options = RenderOptions {
            font_size: Some(14),
            ..RenderOptions::default()
        };
        draw_label(&mut a, label_box(), "Caja 12", &options).unwrap();
        draw_label(&mut b, label_box(), "Caja 12", &options).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn invalid_color_is_rejected() {
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("rojo").is_err());
        assert_eq!(parse_hex_color("#0080ff").unwrap().0, [0, 128, 255, 255]);
    }
}
