//! Label text rendering with an embedded TrueType font.
//!
//! Glyphs are laid out with `rusttype` and their coverage is blended
//! source-over into the premultiplied tiny-skia pixmap.

use std::sync::OnceLock;

use river_common::Color;
use rusttype::{point, Font, PositionedGlyph, Scale};
use tiny_skia::{Pixmap, PremultipliedColorU8};
use tracing::warn;

use crate::contour::Point;
use crate::scene::TextAlign;

/// Embedded font data - DejaVu Sans Mono
const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// The shared label font, parsed once. `None` if the embedded data is bad.
pub fn label_font() -> Option<&'static Font<'static>> {
    static FONT: OnceLock<Option<Font<'static>>> = OnceLock::new();
    FONT.get_or_init(|| {
        let font = Font::try_from_bytes(FONT_DATA);
        if font.is_none() {
            warn!("Failed to load font for label rendering");
        }
        font
    })
    .as_ref()
}

/// Advance width of `text` at `size` pixels.
pub fn text_width(font: &Font<'_>, text: &str, size: f32) -> f32 {
    let glyphs: Vec<PositionedGlyph<'_>> = font.layout(text, Scale::uniform(size), point(0.0, 0.0)).collect();
    glyphs
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Draw `text` with its baseline at `position.y`, aligned horizontally on
/// `position.x`.
pub fn draw_text(pixmap: &mut Pixmap, position: Point, text: &str, size: f32, color: Color, align: TextAlign) {
    if text.is_empty() || !(size > 0.0) || color.a == 0 {
        return;
    }
    let Some(font) = label_font() else {
        return;
    };

    let width = text_width(font, text, size);
    let left = match align {
        TextAlign::Left => position.x as f32,
        TextAlign::Center => position.x as f32 - width / 2.0,
        TextAlign::Right => position.x as f32 - width,
    };

    for glyph in font.layout(text, Scale::uniform(size), point(left, position.y as f32)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            blend_pixel(pixmap, bb.min.x + gx as i32, bb.min.y + gy as i32, color, coverage);
        });
    }
}

/// Source-over blend of `color` at `coverage` into one premultiplied pixel.
fn blend_pixel(pixmap: &mut Pixmap, x: i32, y: i32, color: Color, coverage: f32) {
    if x < 0 || y < 0 || x as u32 >= pixmap.width() || y as u32 >= pixmap.height() {
        return;
    }
    let src_alpha = color.a as f32 / 255.0 * coverage.clamp(0.0, 1.0);
    if src_alpha <= 0.0 {
        return;
    }

    let index = y as usize * pixmap.width() as usize + x as usize;
    let Some(dst) = pixmap.pixels_mut().get_mut(index) else {
        return;
    };

    let inv = 1.0 - src_alpha;
    let mix = |src: u8, dst: u8| (src as f32 * src_alpha + dst as f32 * inv).round().clamp(0.0, 255.0) as u8;
    let alpha = (src_alpha * 255.0 + dst.alpha() as f32 * inv).round().clamp(0.0, 255.0) as u8;

    if let Some(blended) = PremultipliedColorU8::from_rgba(
        mix(color.r, dst.red()),
        mix(color.g, dst.green()),
        mix(color.b, dst.blue()),
        alpha,
    ) {
        *dst = blended;
    }
}
