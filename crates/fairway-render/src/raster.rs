//! Raster post-processing for export.

use crate::renderer::{RenderResult, RendererError};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn is_ink(pixel: &Rgba<u8>) -> bool {
    pixel[3] > 0 && *pixel != WHITE
}

/// Inclusive pixel bounds `(min_x, min_y, max_x, max_y)` of the ink.
pub fn ink_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    image
        .enumerate_pixels()
        .filter(|(_, _, p)| is_ink(p))
        .fold(None, |acc, (x, y, _)| match acc {
            None => Some((x, y, x, y)),
            Some((x0, y0, x1, y1)) => Some((x0.min(x), y0.min(y), x1.max(x), y1.max(y))),
        })
}

/// Move the ink so its bounding box sits in the middle of the image and
/// composite the result over opaque white.
///
/// Bounds are taken after compositing, so pixels too faint to survive it do
/// not count as ink. The shift is a whole number of pixels, so recentering an
/// already centred raster leaves it unchanged. A raster without ink becomes
/// plain white.
pub fn recenter_raster(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    let flat = RgbaImage::from_fn(width, height, |x, y| over_white(image.get_pixel(x, y)));
    let mut out = RgbaImage::from_pixel(width, height, WHITE);

    let Some((x0, y0, x1, y1)) = ink_bounds(&flat) else {
        return out;
    };

    let shift = |size: u32, min: u32, max: u32| -> i64 {
        let extent = i64::from(max - min + 1);
        (i64::from(size) - extent) / 2 - i64::from(min)
    };
    let dx = shift(width, x0, x1);
    let dy = shift(height, y0, y1);
    log::debug!("recentering ink by ({dx}, {dy})");

    for (x, y, pixel) in flat.enumerate_pixels() {
        let tx = i64::from(x) + dx;
        let ty = i64::from(y) + dy;
        if tx < 0 || ty < 0 || tx >= i64::from(width) || ty >= i64::from(height) {
            continue;
        }
        out.put_pixel(tx as u32, ty as u32, *pixel);
    }
    out
}

fn over_white(pixel: &Rgba<u8>) -> Rgba<u8> {
    let alpha = u32::from(pixel[3]);
    let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
    Rgba([blend(pixel[0]), blend(pixel[1]), blend(pixel[2]), 255])
}

/// Encode as PNG.
pub fn encode_png(image: &RgbaImage) -> RenderResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| RendererError::Encode(e.to_string()))?;
    Ok(bytes)
}

/// Decode an uploaded base image into RGBA.
pub fn decode_image(bytes: &[u8]) -> RenderResult<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|decoded| decoded.to_rgba8())
        .map_err(|e| RendererError::Decode(e.to_string()))
}
