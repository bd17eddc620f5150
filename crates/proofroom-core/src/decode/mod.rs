//! Bitmap decoding for preview extraction.
//!
//! This module provides functionality for:
//! - Decoding candidate byte ranges and standard bitmap files
//! - EXIF orientation correction
//! - The [`DecodedBitmap`] pixel buffer passed into rendition generation
//!
//! Decoding never trusts the file extension: the container format is always
//! guessed from content. The decoded buffer is RGBA so transparency survives
//! through to rendition generation for alpha-capable outputs.

mod bitmap;
mod types;

pub use bitmap::{decode_image, decode_image_no_orientation, get_orientation};
pub use types::{DecodeError, DecodedBitmap, Orientation};
