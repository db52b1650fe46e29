//! Bitmap text for titles and legends.

use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

/// Glyph cell size in font pixels.
pub const GLYPH_SIZE: u32 = 8;

/// Look up the 8x8 bitmap for a character, falling back to `?`.
fn glyph(c: char) -> [u8; 8] {
    BASIC_FONTS
        .get(c)
        .or_else(|| LATIN_FONTS.get(c))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Width in pixels of `text` drawn at `scale`.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

/// Height in pixels of one line drawn at `scale`.
pub fn text_height(scale: u32) -> u32 {
    GLYPH_SIZE * scale
}

/// Draw `text` with its top-left corner at (`x`, `y`).
pub fn draw_text(pixmap: &mut Pixmap, text: &str, x: f32, y: f32, scale: u32, paint: &Paint) {
    let cell = scale as f32;
    let mut pb = PathBuilder::new();

    for (i, c) in text.chars().enumerate() {
        let origin_x = x + (i as u32 * GLYPH_SIZE * scale) as f32;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                // Bit 0 is the leftmost pixel
                if bits & (1 << col) == 0 {
                    continue;
                }
                let px = origin_x + col as f32 * cell;
                let py = y + row as f32 * cell;
                if let Some(rect) = Rect::from_xywh(px, py, cell, cell) {
                    pb.push_rect(rect);
                }
            }
        }
    }

    if let Some(path) = pb.finish() {
        pixmap.fill_path(&path, paint, FillRule::Winding, Transform::identity(), None);
    }
}
