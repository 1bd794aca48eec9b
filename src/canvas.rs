use std::path::Path;

use image::{Rgb as Pixel, RgbImage};

use crate::color::Rgb;
use crate::error::Result;
use crate::font::{glyph, ELLIPSIS, GLYPH_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    End,
}

/// Drawing surface shared by the PNG and SVG backends.
///
/// Coordinates are in output pixels with the origin at the top left.
/// Text is monospace: every character advances by [`char_size`].
pub trait Canvas {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb);

    /// Horizontal text whose line is vertically centered on `y`.
    fn text(&mut self, x: f64, y: f64, text: &str, size: u32, color: Rgb, anchor: Anchor);

    /// Text rotated a quarter turn clockwise, centered on `x`, starting at `y`.
    fn vertical_text(&mut self, x: f64, y: f64, text: &str, size: u32, color: Rgb);
}

/// Advance of one character at the given font size.
pub fn char_size(size: u32) -> u32 {
    ((size / GLYPH_SIZE) * GLYPH_SIZE).clamp(GLYPH_SIZE, 64)
}

pub fn text_width(text: &str, size: u32) -> f64 {
    (text.chars().count() as u32 * char_size(size)) as f64
}

/// Cut `text` to at most `max_chars`; the last kept character becomes an
/// ellipsis.
pub fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}

fn anchor_offset(anchor: Anchor, width: f64) -> f64 {
    match anchor {
        Anchor::Start => 0.0,
        Anchor::End => width,
    }
}

/// RGB raster written out as PNG.
pub struct RasterCanvas {
    image: RgbImage,
}

impl RasterCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        RasterCanvas { image: RgbImage::from_pixel(width, height, Pixel([255, 255, 255])) }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        let Pixel([r, g, b]) = *self.image.get_pixel(x, y);
        Rgb(r, g, b)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x >= 0 && y >= 0 && (x as u32) < self.image.width() && (y as u32) < self.image.height() {
            self.image.put_pixel(x as u32, y as u32, Pixel([color.0, color.1, color.2]));
        }
    }

    /// Blit one glyph, scaled up from 8x8 to `char_size` pixels.
    fn write_char(&mut self, base_x: i64, base_y: i64, data: &[u8; 8], char_size: u32, color: Rgb, rotated: bool) {
        let ratio = (char_size / GLYPH_SIZE) as i64;
        for j in 0..8i64 {
            let row = data[j as usize];
            for z in (0..8i64).rev() {
                if (row >> z) & 1 != 1 {
                    continue;
                }
                let col = 7 - z;
                let (gx, gy) = if rotated { (7 - j, col) } else { (col, j) };
                for rx in 0..ratio {
                    for ry in 0..ratio {
                        self.put(base_x + gx * ratio + rx, base_y + gy * ratio + ry, color);
                    }
                }
            }
        }
    }
}

impl Canvas for RasterCanvas {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        let x0 = x.round().max(0.0) as u32;
        let y0 = y.round().max(0.0) as u32;
        let x1 = ((x + w).round().max(0.0) as u32).min(self.image.width());
        let y1 = ((y + h).round().max(0.0) as u32).min(self.image.height());
        for py in y0..y1 {
            for px in x0..x1 {
                self.image.put_pixel(px, py, Pixel([color.0, color.1, color.2]));
            }
        }
    }

    fn text(&mut self, x: f64, y: f64, text: &str, size: u32, color: Rgb, anchor: Anchor) {
        let cs = char_size(size);
        let start = (x - anchor_offset(anchor, text_width(text, size))).round() as i64;
        let base_y = (y - cs as f64 / 2.0).round() as i64;
        for (i, c) in text.chars().enumerate() {
            self.write_char(start + (i as u32 * cs) as i64, base_y, glyph(c), cs, color, false);
        }
    }

    fn vertical_text(&mut self, x: f64, y: f64, text: &str, size: u32, color: Rgb) {
        let cs = char_size(size);
        let base_x = (x - cs as f64 / 2.0).round() as i64;
        for (i, c) in text.chars().enumerate() {
            self.write_char(base_x, y.round() as i64 + (i as u32 * cs) as i64, glyph(c), cs, color, true);
        }
    }
}

/// Escape special XML characters
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// SVG document assembled as text.
pub struct SvgCanvas {
    svg: String,
}

impl SvgCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        let svg = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<style>
  text {{ font-family: 'DejaVu Sans Mono', 'Courier New', monospace; dominant-baseline: central; }}
</style>
<rect width="100%" height="100%" fill="white"/>
"#,
            w = width,
            h = height
        );
        SvgCanvas { svg }
    }

    pub fn finish(mut self) -> String {
        self.svg.push_str("</svg>\n");
        self.svg
    }
}

fn svg_anchor(anchor: Anchor) -> &'static str {
    match anchor {
        Anchor::Start => "start",
        Anchor::End => "end",
    }
}

impl Canvas for SvgCanvas {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: Rgb) {
        self.svg.push_str(&format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            x, y, w, h, color
        ));
        self.svg.push('\n');
    }

    fn text(&mut self, x: f64, y: f64, text: &str, size: u32, color: Rgb, anchor: Anchor) {
        self.svg.push_str(&format!(
            r#"<text x="{}" y="{}" font-size="{}" fill="{}" text-anchor="{}">{}</text>"#,
            x,
            y,
            size,
            color,
            svg_anchor(anchor),
            escape_xml(text)
        ));
        self.svg.push('\n');
    }

    fn vertical_text(&mut self, x: f64, y: f64, text: &str, size: u32, color: Rgb) {
        self.svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" font-size="{}" fill="{}" transform="rotate(90 {x} {y})">{}</text>"#,
            size,
            color,
            escape_xml(text),
            x = x,
            y = y
        ));
        self.svg.push('\n');
    }
}
