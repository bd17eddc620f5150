//! Aspect-preserving downscale for rendition generation.
//!
//! Renditions only ever shrink: a source smaller than the target box passes
//! through at its own size. The short edge scales proportionally and is
//! floor-clamped to one pixel so extreme aspect ratios cannot produce a
//! zero-height strip.

use crate::decode::DecodedBitmap;

/// Interpolation filter for resize operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    /// Nearest neighbor interpolation (fastest, lowest quality).
    Nearest,
    /// Bilinear interpolation (fast, acceptable quality).
    #[default]
    Bilinear,
    /// Lanczos3 interpolation (slower, highest quality).
    Lanczos3,
}

impl FilterType {
    /// Convert to the image crate's FilterType.
    pub fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            FilterType::Nearest => image::imageops::FilterType::Nearest,
            FilterType::Bilinear => image::imageops::FilterType::Triangle,
            FilterType::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Compute target dimensions for a source inside a bounding box.
///
/// The source is scaled down only when it exceeds the box on either axis;
/// never upscaled. Returns `(0, 0)` for a degenerate source.
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || max_width == 0 || max_height == 0 {
        return (0, 0);
    }

    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let scale = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );

    let new_width = ((width as f64 * scale).round() as u32)
        .clamp(1, max_width);
    let new_height = ((height as f64 * scale).round() as u32)
        .clamp(1, max_height);

    (new_width, new_height)
}

/// Resize a bitmap to exact dimensions, preserving the alpha flag.
///
/// Returns `None` when the pixel buffer cannot be reassembled (a corrupted
/// bitmap) or the target is degenerate.
pub fn resize_bitmap(
    bitmap: &DecodedBitmap,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Option<DecodedBitmap> {
    if width == 0 || height == 0 {
        return None;
    }

    // Fast path: nothing to do
    if bitmap.width == width && bitmap.height == height {
        return Some(bitmap.clone());
    }

    let rgba = bitmap.to_rgba_image()?;
    let resized = image::imageops::resize(&rgba, width, height, filter.to_image_filter());

    Some(DecodedBitmap::new(
        width,
        height,
        bitmap.has_alpha,
        resized.into_raw(),
    ))
}
