//! Core types for bitmap decoding.

use thiserror::Error;

/// Error types for decode operations.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The byte stream is not a recognized or supported image format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image data is corrupted or incomplete.
    #[error("Corrupted or incomplete image data: {0}")]
    CorruptedData(String),
}

/// EXIF orientation values (1-8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Orientation {
    /// Normal (no transformation needed).
    #[default]
    Normal = 1,
    /// Horizontal flip.
    FlipHorizontal = 2,
    /// Rotate 180 degrees.
    Rotate180 = 3,
    /// Vertical flip.
    FlipVertical = 4,
    /// Transpose (flip horizontal + rotate 270 CW).
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90CW = 6,
    /// Transverse (flip horizontal + rotate 90 CW).
    Transverse = 7,
    /// Rotate 270 degrees clockwise (90 CCW).
    Rotate270CW = 8,
}

impl From<u32> for Orientation {
    fn from(value: u32) -> Self {
        match value {
            1 => Orientation::Normal,
            2 => Orientation::FlipHorizontal,
            3 => Orientation::Rotate180,
            4 => Orientation::FlipVertical,
            5 => Orientation::Transpose,
            6 => Orientation::Rotate90CW,
            7 => Orientation::Transverse,
            8 => Orientation::Rotate270CW,
            _ => Orientation::Normal,
        }
    }
}

/// A decoded image with RGBA pixel data.
///
/// Owned exclusively by whichever pipeline stage produced it; moved into the
/// rendition generator and released there.
#[derive(Debug, Clone)]
pub struct DecodedBitmap {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Whether the source carried an alpha channel.
    pub has_alpha: bool,
    /// RGBA pixel data in row-major order (4 bytes per pixel).
    pixels: Vec<u8>,
}

impl DecodedBitmap {
    /// Create a new bitmap with the given dimensions and RGBA pixel data.
    pub fn new(width: u32, height: u32, has_alpha: bool, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            (width as usize) * (height as usize) * 4,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            has_alpha,
            pixels,
        }
    }

    /// Build a bitmap from a decoded [`image::DynamicImage`], recording
    /// whether its color type carried alpha.
    pub fn from_dynamic(img: ::image::DynamicImage) -> Self {
        let has_alpha = img.color().has_alpha();
        let rgba = img.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            has_alpha,
            pixels: rgba.into_raw(),
        }
    }

    /// Convert to an [`image::RgbaImage`] for further processing.
    pub fn to_rgba_image(&self) -> Option<::image::RgbaImage> {
        ::image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// Consume the bitmap into an [`image::RgbaImage`].
    pub fn into_rgba_image(self) -> Option<::image::RgbaImage> {
        ::image::RgbaImage::from_raw(self.width, self.height, self.pixels)
    }

    /// Length of the longest edge in pixels.
    pub fn long_edge(&self) -> u32 {
        self.width.max(self.height)
    }

    /// Get the total number of pixels.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Get the size of the pixel buffer in bytes.
    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid bitmap.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_from_u32() {
        assert_eq!(Orientation::from(1), Orientation::Normal);
        assert_eq!(Orientation::from(6), Orientation::Rotate90CW);
        assert_eq!(Orientation::from(8), Orientation::Rotate270CW);
        assert_eq!(Orientation::from(99), Orientation::Normal); // Invalid defaults to Normal
    }

    #[test]
    fn test_bitmap_creation() {
        let pixels = vec![0u8; 100 * 50 * 4];
        let bmp = DecodedBitmap::new(100, 50, false, pixels);

        assert_eq!(bmp.width, 100);
        assert_eq!(bmp.height, 50);
        assert_eq!(bmp.pixel_count(), 5000);
        assert_eq!(bmp.byte_size(), 20000);
        assert_eq!(bmp.long_edge(), 100);
        assert!(!bmp.has_alpha);
        assert!(!bmp.is_empty());
    }

    #[test]
    fn test_bitmap_empty() {
        let bmp = DecodedBitmap::new(0, 0, false, vec![]);
        assert!(bmp.is_empty());
    }

    #[test]
    fn test_from_dynamic_records_alpha() {
        let rgb = ::image::RgbImage::from_pixel(4, 4, ::image::Rgb([10, 20, 30]));
        let bmp = DecodedBitmap::from_dynamic(::image::DynamicImage::ImageRgb8(rgb));
        assert!(!bmp.has_alpha);
        assert_eq!(bmp.width, 4);

        let rgba = ::image::RgbaImage::from_pixel(4, 4, ::image::Rgba([10, 20, 30, 128]));
        let bmp = DecodedBitmap::from_dynamic(::image::DynamicImage::ImageRgba8(rgba));
        assert!(bmp.has_alpha);
    }

    #[test]
    fn test_rgba_image_roundtrip() {
        let pixels: Vec<u8> = (0..(2 * 2 * 4)).map(|i| i as u8).collect();
        let bmp = DecodedBitmap::new(2, 2, true, pixels.clone());

        let img = bmp.to_rgba_image().unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.into_raw(), pixels);
    }
}
