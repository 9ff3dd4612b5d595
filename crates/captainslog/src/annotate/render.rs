//! Drawing the overlay onto a downscaled screenshot.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::debug;

use crate::config::{OverlayConfig, TextPosition};
use crate::error::{Error, Result};

/// Fonts tried, in order, when no font is configured.
const FONT_CANDIDATES: &[&str] = &[
    "C:\\Windows\\Fonts\\arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
];

/// Font drawn with when no system font is installed.
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

/// Load the overlay font.
///
/// A configured font must exist. Without one, the well-known system fonts are
/// tried in order and the bundled font is used when none is installed.
///
/// # Errors
///
/// Returns [`Error::FontUnavailable`] if the configured font cannot be read
/// and [`Error::FontInvalid`] if the chosen file cannot be parsed.
pub fn load_font(configured: Option<&Path>) -> Result<FontVec> {
    match configured {
        Some(path) => {
            let data = std::fs::read(path).map_err(|_| Error::FontUnavailable {
                path: path.to_path_buf(),
            })?;
            parse_font(path, data)
        }
        None => system_font(FONT_CANDIDATES.iter().map(Path::new)),
    }
}

fn system_font<'a>(candidates: impl IntoIterator<Item = &'a Path>) -> Result<FontVec> {
    for path in candidates {
        if let Ok(data) = std::fs::read(path) {
            return parse_font(path, data);
        }
    }
    debug!("No system font installed; using the bundled font");
    bundled_font()
}

/// The font compiled into the binary.
///
/// # Errors
///
/// Returns [`Error::FontInvalid`] if the embedded data does not parse.
pub fn bundled_font() -> Result<FontVec> {
    FontVec::try_from_vec(BUNDLED_FONT.to_vec()).map_err(|_| Error::FontInvalid {
        path: PathBuf::from("<bundled>"),
    })
}

fn parse_font(path: &Path, data: Vec<u8>) -> Result<FontVec> {
    debug!(font = %path.display(), "Loaded overlay font");
    FontVec::try_from_vec(data).map_err(|_| Error::FontInvalid {
        path: path.to_path_buf(),
    })
}

/// Width and height of a pixel-space box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Vertical distance between consecutive baselines.
fn line_advance(font: &impl Font, scale: PxScale) -> u32 {
    let scaled = font.as_scaled(scale);
    to_px(scaled.height() + scaled.line_gap())
}

fn to_px(value: f32) -> u32 {
    // Font metrics are small positive values; the float-to-int cast saturates.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let px = value.ceil().max(0.0) as u32;
    px
}

/// Measure a multi-line text block.
#[must_use]
pub fn measure(font: &impl Font, scale: PxScale, text: &str) -> Extent {
    let width = text
        .lines()
        .map(|line| text_size(scale, font, line).0)
        .max()
        .unwrap_or(0);
    let lines = u32::try_from(text.lines().count()).unwrap_or(u32::MAX);

    Extent {
        width,
        height: line_advance(font, scale).saturating_mul(lines),
    }
}

/// Top-left corner of the text block for the given anchor.
///
/// Bottom anchors keep one and a half margins below the text so the
/// background box does not touch the image edge.
#[must_use]
pub fn text_origin(position: TextPosition, margin: u32, canvas: Extent, text: Extent) -> (i32, i32) {
    let margin = i64::from(margin);
    let right = i64::from(canvas.width) - i64::from(text.width) - margin;
    let bottom = i64::from(canvas.height) - i64::from(text.height) - margin * 3 / 2;

    let (x, y) = match position {
        TextPosition::TopLeft => (margin, margin),
        TextPosition::TopRight => (right, margin),
        TextPosition::BottomRight => (right, bottom),
        TextPosition::BottomLeft => (margin, bottom),
    };
    (clamp_i32(x), clamp_i32(y))
}

fn clamp_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Blend a box of `color` at `opacity` over the canvas.
///
/// The box spans from `(x0, y0)` inclusive to `(x1, y1)` exclusive and is
/// clipped to the canvas.
pub fn fill_box(canvas: &mut RgbaImage, corners: (i32, i32, i32, i32), color: [u8; 3], opacity: u8) {
    let (x0, y0, x1, y1) = corners;
    let clip = |v: i32, max: u32| u32::try_from(v.max(0)).unwrap_or(0).min(max);
    let (x0, x1) = (clip(x0, canvas.width()), clip(x1, canvas.width()));
    let (y0, y1) = (clip(y0, canvas.height()), clip(y1, canvas.height()));

    let overlay = Rgba([color[0], color[1], color[2], opacity]);
    for y in y0..y1 {
        for x in x0..x1 {
            canvas.get_pixel_mut(x, y).blend(&overlay);
        }
    }
}

/// Draw `text` with a one-pixel outline, one line at a time.
pub fn draw_outlined_text(
    canvas: &mut RgbaImage,
    font: &impl Font,
    scale: PxScale,
    origin: (i32, i32),
    text: &str,
    fill: [u8; 3],
    stroke: [u8; 3],
) {
    let advance = i32::try_from(line_advance(font, scale)).unwrap_or(i32::MAX);
    let fill = Rgba([fill[0], fill[1], fill[2], 255]);
    let stroke = Rgba([stroke[0], stroke[1], stroke[2], 255]);

    let mut y = origin.1;
    for line in text.lines() {
        for (dx, dy) in [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)] {
            draw_text_mut(canvas, stroke, origin.0 + dx, y + dy, scale, font, line);
        }
        draw_text_mut(canvas, fill, origin.0, y, scale, font, line);
        y = y.saturating_add(advance);
    }
}

/// Draw the overlay block: optional background box, then outlined text.
pub fn draw_overlay(canvas: &mut RgbaImage, font: &impl Font, style: &OverlayConfig, text: &str) {
    let scale = PxScale::from(style.font_size);
    let extent = measure(font, scale, text);
    let canvas_extent = Extent {
        width: canvas.width(),
        height: canvas.height(),
    };
    let (x, y) = text_origin(style.position, style.margin, canvas_extent, extent);

    if style.draw_background {
        let m = clamp_i32(i64::from(style.margin));
        let w = clamp_i32(i64::from(extent.width));
        let h = clamp_i32(i64::from(extent.height));
        fill_box(
            canvas,
            (
                x.saturating_sub(m),
                y.saturating_sub(m),
                x.saturating_add(w).saturating_add(m),
                y.saturating_add(h).saturating_add(m),
            ),
            style.background_color,
            style.background_opacity,
        );
    }

    draw_outlined_text(
        canvas,
        font,
        scale,
        (x, y),
        text,
        style.font_color,
        style.stroke_color,
    );
}
