//! Screenshot annotation.
//!
//! Compositing is a pure function from a base image and a list of overlay
//! shapes to a new image, so it can be exercised without any page or canvas.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::types::errors::CaptureError;
use crate::types::settings::AnnotationSettings;
use crate::types::step::{Highlight, Viewport};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// An overlay shape in image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    /// Rectangle outline; the stroke is centered on the rectangle's edges.
    StrokeRect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        color: Rgba<u8>,
        line_width: f64,
    },
    /// Straight shaft from `from` to `to` with a filled triangular head at `to`.
    Arrow {
        from: (f64, f64),
        to: (f64, f64),
        color: Rgba<u8>,
        line_width: f64,
        head_length: f64,
        head_angle: f64,
    },
}

/// Parses `#rrggbb` (leading `#` optional). Malformed input yields opaque black.
pub fn parse_hex_color(color: &str) -> Rgba<u8> {
    let hex = color.trim_start_matches('#');
    if hex.len() < 6 || !hex.is_ascii() {
        return Rgba([0, 0, 0, 255]);
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).unwrap_or(0);
    Rgba([channel(0..2), channel(2..4), channel(4..6), 255])
}

/// Scale factors from viewport CSS pixels to image pixels, per axis.
pub fn viewport_scale(image_width: u32, image_height: u32, viewport: Viewport) -> (f64, f64) {
    let sx = if viewport.width > 0.0 { f64::from(image_width) / viewport.width } else { 1.0 };
    let sy = if viewport.height > 0.0 { f64::from(image_height) / viewport.height } else { 1.0 };
    (sx, sy)
}

/// Highlight rectangle plus pointer arrow for an interacted element.
///
/// The arrow starts at a fixed offset below-left of the highlight's
/// bottom-left corner and ends on that corner.
pub fn highlight_annotations(
    highlight: Highlight,
    image_width: u32,
    image_height: u32,
    viewport: Viewport,
    style: &AnnotationSettings,
) -> Vec<Annotation> {
    let (sx, sy) = viewport_scale(image_width, image_height, viewport);
    let to_x = highlight.left * sx;
    let to_y = (highlight.top + highlight.height) * sy;
    vec![
        Annotation::StrokeRect {
            x: highlight.left * sx,
            y: highlight.top * sy,
            width: highlight.width * sx,
            height: highlight.height * sy,
            color: parse_hex_color(&style.highlight_color),
            line_width: style.highlight_width,
        },
        Annotation::Arrow {
            from: (to_x + style.arrow_offset_x, to_y + style.arrow_offset_y),
            to: (to_x, to_y),
            color: parse_hex_color(&style.arrow_color),
            line_width: style.arrow_width,
            head_length: style.arrow_head_length,
            head_angle: style.arrow_head_angle,
        },
    ]
}

/// Top-strip outline used for navigation steps; the browser's address bar is
/// not part of the capture, so the strip stands in for it.
pub fn navigation_annotations(
    image_width: u32,
    image_height: u32,
    viewport: Viewport,
    style: &AnnotationSettings,
) -> Vec<Annotation> {
    let (sx, sy) = viewport_scale(image_width, image_height, viewport);
    vec![Annotation::StrokeRect {
        x: 0.0,
        y: 0.0,
        width: viewport.width * sx,
        height: style.navigation_strip_height * sy,
        color: parse_hex_color(&style.highlight_color),
        line_width: style.highlight_width,
    }]
}

/// Draws `annotations` over a copy of `base`.
pub fn annotate(base: &RgbaImage, annotations: &[Annotation]) -> RgbaImage {
    let mut out = base.clone();
    for annotation in annotations {
        match annotation {
            Annotation::StrokeRect { x, y, width, height, color, line_width } => {
                stroke_rect(&mut out, *x, *y, *width, *height, *line_width, *color);
            }
            Annotation::Arrow { from, to, color, line_width, head_length, head_angle } => {
                draw_line(&mut out, *from, *to, *line_width, *color);
                let angle = (to.1 - from.1).atan2(to.0 - from.0);
                let left = (
                    to.0 - head_length * (angle - head_angle).cos(),
                    to.1 - head_length * (angle - head_angle).sin(),
                );
                let right = (
                    to.0 - head_length * (angle + head_angle).cos(),
                    to.1 - head_length * (angle + head_angle).sin(),
                );
                fill_triangle(&mut out, *to, left, right, *color);
            }
        }
    }
    out
}

/// Pixel bounds `[x0, x1) x [y0, y1)` covering the given float box, clipped to the image.
fn pixel_bounds(img: &RgbaImage, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> (u32, u32, u32, u32) {
    let clamp = |v: f64, hi: u32| v.max(0.0).min(f64::from(hi)) as u32;
    (
        clamp(min_x.floor(), img.width()),
        clamp(min_y.floor(), img.height()),
        clamp(max_x.ceil(), img.width()),
        clamp(max_y.ceil(), img.height()),
    )
}

fn stroke_rect(img: &mut RgbaImage, x: f64, y: f64, w: f64, h: f64, line_width: f64, color: Rgba<u8>) {
    let half = line_width / 2.0;
    let (ox0, oy0, ox1, oy1) = (x - half, y - half, x + w + half, y + h + half);
    let (ix0, iy0, ix1, iy1) = (x + half, y + half, x + w - half, y + h - half);
    let (px0, py0, px1, py1) = pixel_bounds(img, ox0, oy0, ox1, oy1);
    for py in py0..py1 {
        for px in px0..px1 {
            let cx = f64::from(px) + 0.5;
            let cy = f64::from(py) + 0.5;
            let inside_outer = cx >= ox0 && cx < ox1 && cy >= oy0 && cy < oy1;
            let inside_inner = ix0 < ix1 && iy0 < iy1 && cx >= ix0 && cx < ix1 && cy >= iy0 && cy < iy1;
            if inside_outer && !inside_inner {
                img.put_pixel(px, py, color);
            }
        }
    }
}

fn draw_line(img: &mut RgbaImage, from: (f64, f64), to: (f64, f64), line_width: f64, color: Rgba<u8>) {
    let half = line_width / 2.0;
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return;
    }
    let (px0, py0, px1, py1) = pixel_bounds(
        img,
        from.0.min(to.0) - half,
        from.1.min(to.1) - half,
        from.0.max(to.0) + half,
        from.1.max(to.1) + half,
    );
    for py in py0..py1 {
        for px in px0..px1 {
            let cx = f64::from(px) + 0.5 - from.0;
            let cy = f64::from(py) + 0.5 - from.1;
            let t = (cx * dx + cy * dy) / len_sq;
            if !(0.0..=1.0).contains(&t) {
                continue;
            }
            let distance = (cx * dy - cy * dx).abs() / len_sq.sqrt();
            if distance <= half {
                img.put_pixel(px, py, color);
            }
        }
    }
}

fn fill_triangle(img: &mut RgbaImage, a: (f64, f64), b: (f64, f64), c: (f64, f64), color: Rgba<u8>) {
    let edge = |p: (f64, f64), q: (f64, f64), r: (f64, f64)| (q.0 - p.0) * (r.1 - p.1) - (q.1 - p.1) * (r.0 - p.0);
    let area = edge(a, b, c);
    if area == 0.0 {
        return;
    }
    let (px0, py0, px1, py1) = pixel_bounds(
        img,
        a.0.min(b.0).min(c.0),
        a.1.min(b.1).min(c.1),
        a.0.max(b.0).max(c.0),
        a.1.max(b.1).max(c.1),
    );
    for py in py0..py1 {
        for px in px0..px1 {
            let p = (f64::from(px) + 0.5, f64::from(py) + 0.5);
            let w0 = edge(b, c, p) / area;
            let w1 = edge(c, a, p) / area;
            let w2 = edge(a, b, p) / area;
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                img.put_pixel(px, py, color);
            }
        }
    }
}

/// Decodes an image data URL (or bare base64) into an image.
pub fn decode_data_url(data_url: &str) -> Result<DynamicImage, CaptureError> {
    let payload = match data_url.split_once(";base64,") {
        Some((header, payload)) if header.starts_with("data:") => payload,
        _ => data_url,
    };
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| CaptureError::Decode(format!("invalid base64 payload: {}", e)))?;
    image::load_from_memory(&bytes).map_err(|e| CaptureError::Decode(e.to_string()))
}

/// Encodes an image as a PNG data URL.
pub fn encode_png_data_url(img: &RgbaImage) -> Result<String, CaptureError> {
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(format!("{}{}", PNG_DATA_URL_PREFIX, BASE64.encode(buffer.into_inner())))
}

/// Decodes a capture, draws `annotations_for(width, height)` on it and
/// re-encodes it as a PNG data URL.
pub fn composite<F>(screenshot: &str, annotations_for: F) -> Result<String, CaptureError>
where
    F: FnOnce(u32, u32) -> Vec<Annotation>,
{
    let base = decode_data_url(screenshot)?.to_rgba8();
    let annotations = annotations_for(base.width(), base.height());
    encode_png_data_url(&annotate(&base, &annotations))
}
