//! The shared validity gate.
//!
//! Every byte stream that might become a preview - scanner candidates,
//! external tool output, standard bitmap input, and the final pre-persist
//! check - goes through the same gate: a minimum byte size, a content
//! sniff of the actual format (the file extension is never trusted), and
//! header-derived dimensions against a sanity floor. A gate rejection is a
//! [`ExtractError::ValidationFailed`].

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::config::EngineConfig;
use crate::error::{ExtractError, Result};

/// What the gate learned about a byte stream that passed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageFacts {
    /// Content-sniffed format.
    pub format: ImageFormat,
    /// Header-derived width in pixels.
    pub width: u32,
    /// Header-derived height in pixels.
    pub height: u32,
}

impl ImageFacts {
    /// Length of the longest edge in pixels.
    pub fn long_edge(&self) -> u32 {
        self.width.max(self.height)
    }
}

/// Run the full gate over a candidate preview byte stream: byte floor,
/// content sniff, and the absolute dimension sanity floor.
pub fn check_preview_bytes(bytes: &[u8], cfg: &EngineConfig) -> Result<ImageFacts> {
    if bytes.len() < cfg.min_candidate_bytes {
        return Err(ExtractError::validation(format!(
            "{} bytes is under the {} byte floor",
            bytes.len(),
            cfg.min_candidate_bytes
        )));
    }
    sniff_image(bytes, cfg)
}

/// Content-sniff a byte stream and check its header dimensions against the
/// sanity floor, without applying the byte floor.
///
/// Used for inputs where the byte floor does not apply: standard bitmap
/// sources can be legitimately tiny, and last-resort candidates were
/// already admitted below the floor by the selector.
pub fn sniff_image(bytes: &[u8], cfg: &EngineConfig) -> Result<ImageFacts> {
    let format = image::guess_format(bytes)
        .map_err(|_| ExtractError::validation("content is not a recognized image format"))?;

    let (width, height) = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ExtractError::validation(format!("unreadable image header: {}", e)))?
        .into_dimensions()
        .map_err(|e| ExtractError::validation(format!("unreadable image dimensions: {}", e)))?;

    if width < cfg.min_valid_edge && height < cfg.min_valid_edge {
        return Err(ExtractError::validation(format!(
            "{}x{} is under the {} px sanity floor",
            width, height, cfg.min_valid_edge
        )));
    }

    Ok(ImageFacts {
        format,
        width,
        height,
    })
}

/// Does a gated stream clear the preview-quality pixel floor?
///
/// This is a preference signal for the selector, not a validity check: a
/// stream below this floor can still be accepted as a last resort.
pub fn clears_pixel_floor(facts: &ImageFacts, cfg: &EngineConfig) -> bool {
    facts.long_edge() >= cfg.min_preview_edge
}
