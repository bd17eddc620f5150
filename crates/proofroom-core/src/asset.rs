//! Source asset classification.
//!
//! The engine receives a file path from the caller and classifies it by
//! extension into a format family: vendor RAW containers that need container
//! scanning, or standard bitmaps that decode directly. Classification is
//! advisory - actual content is always verified by content sniffing before
//! anything is trusted - but an unrecognized extension is rejected up front.

use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};

// TIFF container magic. Most RAW formats (ARW, CR2, NEF, DNG, ...) are
// TIFF-based and start with one of these.
const TIFF_MAGIC_LE: [u8; 4] = [0x49, 0x49, 0x2A, 0x00];
const TIFF_MAGIC_BE: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A];

/// Vendor RAW container extensions the engine recognizes.
const RAW_EXTENSIONS: &[&str] = &[
    "arw", "cr2", "cr3", "nef", "nrw", "orf", "raf", "rw2", "dng", "pef", "srw", "erf", "kdc",
    "mrw", "3fr", "fff", "iiq", "raw",
];

/// Standard bitmap extensions handled by the direct decode path.
const BITMAP_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Format family of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FormatFamily {
    /// Vendor-specific RAW container; goes through container scanning and,
    /// if that fails, the external tool chain.
    Raw,
    /// Ordinary bitmap; decodes directly, bypassing the scanner entirely.
    StandardBitmap,
}

/// An immutable reference to one input file.
///
/// Created by the caller before invoking the orchestrator; never mutated by
/// the engine.
#[derive(Debug, Clone)]
pub struct SourceAsset {
    path: PathBuf,
    family: FormatFamily,
    extension: String,
}

impl SourceAsset {
    /// Classify a path by extension.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::UnsupportedFormat`] when the path has no
    /// extension or the extension is not a recognized RAW or bitmap format.
    pub fn classify(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .ok_or_else(|| {
                ExtractError::UnsupportedFormat(format!("{} (no extension)", path.display()))
            })?;

        let family = if RAW_EXTENSIONS.contains(&extension.as_str()) {
            FormatFamily::Raw
        } else if BITMAP_EXTENSIONS.contains(&extension.as_str()) {
            FormatFamily::StandardBitmap
        } else {
            return Err(ExtractError::UnsupportedFormat(extension));
        };

        Ok(Self {
            path,
            family,
            extension,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn family(&self) -> FormatFamily {
        self.family
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Short uppercase label identifying the media category, used by the
    /// placeholder generator.
    pub fn label(&self) -> String {
        self.extension.to_ascii_uppercase()
    }

    /// Quick content cross-check: does the buffer start with a TIFF header?
    ///
    /// This does not fully parse the file; it only confirms the container
    /// shape most RAW formats share.
    pub fn looks_like_tiff(bytes: &[u8]) -> bool {
        bytes.len() >= 4 && (bytes[..4] == TIFF_MAGIC_LE || bytes[..4] == TIFF_MAGIC_BE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_raw_extensions() {
        for name in ["shot.ARW", "shot.cr2", "shot.Nef", "shot.dng", "shot.raf"] {
            let asset = SourceAsset::classify(name).unwrap();
            assert_eq!(asset.family(), FormatFamily::Raw, "{}", name);
        }
    }

    #[test]
    fn test_classify_bitmap_extensions() {
        for name in ["photo.jpg", "photo.JPEG", "photo.png"] {
            let asset = SourceAsset::classify(name).unwrap();
            assert_eq!(asset.family(), FormatFamily::StandardBitmap, "{}", name);
        }
    }

    #[test]
    fn test_classify_extension_is_lowercased() {
        let asset = SourceAsset::classify("/data/DSC01234.ARW").unwrap();
        assert_eq!(asset.extension(), "arw");
        assert_eq!(asset.label(), "ARW");
    }

    #[test]
    fn test_classify_rejects_unknown_extension() {
        let result = SourceAsset::classify("document.pdf");
        assert!(matches!(result, Err(ExtractError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_classify_rejects_missing_extension() {
        let result = SourceAsset::classify("/data/no_extension");
        assert!(matches!(result, Err(ExtractError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_looks_like_tiff() {
        // Little-endian TIFF header
        assert!(SourceAsset::looks_like_tiff(&[
            0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00
        ]));

        // Big-endian TIFF header
        assert!(SourceAsset::looks_like_tiff(&[
            0x4D, 0x4D, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08
        ]));

        // JPEG magic is not TIFF
        assert!(!SourceAsset::looks_like_tiff(&[0xFF, 0xD8, 0xFF, 0xE0]));

        // Too short
        assert!(!SourceAsset::looks_like_tiff(&[0x49, 0x49]));
        assert!(!SourceAsset::looks_like_tiff(&[]));
    }
}
