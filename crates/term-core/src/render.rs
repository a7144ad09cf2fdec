//! Screenshot Renderer: turns a buffered terminal state into a PNG or
//! JPEG image.
//!
//! Renders a deterministic per-cell block representation rather than
//! shaping real glyphs: every non-blank character becomes a filled rectangle
//! in its cell, matching the canvas-size and layout contract exactly.

use std::io::Cursor as IoCursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat as RasterFormat, ImageEncoder, Rgba, RgbaImage};

use crate::ansi;
use crate::error::{CoreError, CoreResult, ErrorKind};
use crate::model::{Cursor, Dimensions, ImageFormat, Theme};

/// Rendering options. `quality` only applies to `jpeg`.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    pub format: ImageFormat,
    pub quality: u8,
    pub font_size: u32,
    pub theme: Theme,
    /// Hex color (`#rrggbb`) overriding the theme's background, if any.
    pub background: Option<String>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: ImageFormat::default(),
            quality: 90,
            font_size: 14,
            theme: Theme::default(),
            background: None,
        }
    }
}

const PADDING: u32 = 20;

/// Render `content` (the session's raw buffer) plus `cursor`/`dimensions`
/// into an encoded image per `opts`.
///
/// # Errors
/// `SCREENSHOT_ERROR` if canvas geometry cannot be computed or encoding
/// fails.
pub fn render(
    content: &[u8],
    cursor: Cursor,
    dimensions: Dimensions,
    opts: &RenderOptions,
) -> CoreResult<Vec<u8>> {
    let printable = ansi::strip(content);
    let text = String::from_utf8_lossy(&printable);
    let rows = usize::from(dimensions.rows);
    let lines: Vec<&str> = text.split('\n').take(rows).collect();

    let (width, height) = canvas_size(dimensions, opts.font_size);
    let (background, foreground) = palette(opts);

    let mut canvas = RgbaImage::from_pixel(width, height, background);

    let cell_width = line_height(opts.font_size).max(1) * 6 / 10;
    let line_height = line_height(opts.font_size);

    for (row, line) in lines.iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let y = PADDING + (row as u32 + 1) * line_height;
        draw_line(&mut canvas, line, PADDING, y.min(height.saturating_sub(1)), cell_width, foreground);
    }

    if cursor.visible {
        draw_cursor(&mut canvas, cursor, PADDING, cell_width, line_height, width, height);
    }

    encode(&canvas, opts)
}

/// Canvas dimensions: `width = cols*ceil(fontSize*0.6)+40`,
/// `height = rows*ceil(fontSize*1.2)+40`.
#[must_use]
pub fn canvas_size(dimensions: Dimensions, font_size: u32) -> (u32, u32) {
    let cell_w = ceil_mul(font_size, 6, 10);
    let cell_h = ceil_mul(font_size, 12, 10);
    let width = u32::from(dimensions.cols) * cell_w + 40;
    let height = u32::from(dimensions.rows) * cell_h + 40;
    (width.max(1), height.max(1))
}

fn line_height(font_size: u32) -> u32 {
    ceil_mul(font_size, 12, 10)
}

/// `ceil(font_size * numerator / denominator)` using only integer math.
fn ceil_mul(font_size: u32, numerator: u32, denominator: u32) -> u32 {
    (font_size * numerator).div_ceil(denominator)
}

fn palette(opts: &RenderOptions) -> (Rgba<u8>, Rgba<u8>) {
    let theme_background = match opts.theme {
        Theme::Dark => Rgba([0x1e, 0x1e, 0x1e, 0xff]),
        Theme::Light => Rgba([0xff, 0xff, 0xff, 0xff]),
    };
    let foreground = match opts.theme {
        Theme::Dark => Rgba([0xd4, 0xd4, 0xd4, 0xff]),
        Theme::Light => Rgba([0x20, 0x20, 0x20, 0xff]),
    };
    let background = opts
        .background
        .as_deref()
        .and_then(parse_hex_color)
        .unwrap_or(theme_background);
    (background, foreground)
}

fn parse_hex_color(hex: &str) -> Option<Rgba<u8>> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
    Some(Rgba([r, g, b, 0xff]))
}

fn draw_line(
    canvas: &mut RgbaImage,
    line: &str,
    x_start: u32,
    y: u32,
    cell_width: u32,
    color: Rgba<u8>,
) {
    for (col, ch) in escape_for_render(line).chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        #[allow(clippy::cast_possible_truncation)]
        let x = x_start + col as u32 * cell_width.max(1);
        fill_cell(canvas, x, y.saturating_sub(cell_width), cell_width, color);
    }
}

fn draw_cursor(
    canvas: &mut RgbaImage,
    cursor: Cursor,
    x_start: u32,
    cell_width: u32,
    line_height: u32,
    width: u32,
    height: u32,
) {
    let x = x_start + u32::from(cursor.x) * cell_width.max(1);
    let y = PADDING + u32::from(cursor.y) * line_height;
    if x >= width || y >= height {
        return;
    }
    fill_cell(canvas, x, y, cell_width, Rgba([0x80, 0x80, 0x80, 0x80]));
}

fn fill_cell(canvas: &mut RgbaImage, x: u32, y: u32, size: u32, color: Rgba<u8>) {
    let (width, height) = canvas.dimensions();
    for dy in 0..size.max(1) {
        for dx in 0..size.max(1) {
            let px = x + dx;
            let py = y + dy;
            if px < width && py < height {
                canvas.put_pixel(px, py, color);
            }
        }
    }
}

/// XML-escape after ANSI stripping; only matters for the SVG
/// reference encoding, kept here so callers comparing raster content against
/// escaped text see consistent behavior.
fn escape_for_render(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == ' ')
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&apos;".to_string(),
            other => other.to_string(),
        })
        .collect()
}

fn encode(canvas: &RgbaImage, opts: &RenderOptions) -> CoreResult<Vec<u8>> {
    let mut buf = Vec::new();

    match opts.format {
        ImageFormat::Png => {
            let mut writer = IoCursor::new(&mut buf);
            DynamicImage::ImageRgba8(canvas.clone())
                .write_to(&mut writer, RasterFormat::Png)
                .map_err(|err| CoreError::new(ErrorKind::ScreenshotError, err.to_string()))?;
        }
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel; drop it before encoding.
            let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
            let (width, height) = rgb.dimensions();
            JpegEncoder::new_with_quality(&mut buf, opts.quality.clamp(1, 100))
                .write_image(rgb.as_raw(), width, height, image::ExtendedColorType::Rgb8)
                .map_err(|err| CoreError::new(ErrorKind::ScreenshotError, err.to_string()))?;
        }
    }

    Ok(buf)
}
