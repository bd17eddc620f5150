//! Container byte scanning.
//!
//! Vendor RAW containers embed one or more standard JPEG previews alongside
//! the sensor data. This module locates them as byte ranges, two ways:
//!
//! - **IFD-directed** ([`tiff`]): most RAW formats are TIFF-based and
//!   advertise embedded JPEGs through directory entries. Cheap and exact
//!   when the directories are honest.
//! - **Structural marker walk** ([`markers`]): scans the whole buffer for
//!   start-of-image markers and walks the JPEG marker structure to each
//!   terminator. Covers containers whose directories are missing or lie.
//!
//! Candidates from both sources are merged (deduplicated by start offset)
//! and handed to the selector. An empty result is a signal, not an error:
//! plenty of files simply have no embedded preview, and the caller falls
//! back to external tools.

mod markers;
mod tiff;

pub use markers::{JPEG_EOI, JPEG_SOI};

/// How a candidate byte range was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discovery {
    /// Advertised by a TIFF IFD entry.
    IfdEntry,
    /// Found by walking JPEG marker structure.
    MarkerWalk,
    /// Found by the last-resort raw terminator search.
    SubstringFallback,
}

/// A candidate embedded image: a byte range `[start, end)` within the
/// source buffer. Ephemeral - produced and discarded within one extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedCandidate {
    /// Offset of the start-of-image marker.
    pub start: usize,
    /// One past the end-of-image marker.
    pub end: usize,
    /// How the range was found.
    pub discovery: Discovery,
}

impl EmbeddedCandidate {
    pub fn new(start: usize, end: usize, discovery: Discovery) -> Self {
        debug_assert!(end >= start);
        Self {
            start,
            end,
            discovery,
        }
    }

    /// Byte length of the candidate range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// Borrow the candidate's bytes out of the source buffer.
    pub fn bytes<'a>(&self, buf: &'a [u8]) -> &'a [u8] {
        &buf[self.start..self.end]
    }
}

/// Scan a RAW container buffer for embedded JPEG candidates.
///
/// Returns every candidate found, ordered IFD-advertised ranges first, then
/// marker-walk finds that were not already covered. Selection between them
/// is the selector's job, not the scanner's.
pub fn scan_container(buf: &[u8]) -> Vec<EmbeddedCandidate> {
    let mut candidates = tiff::ifd_candidates(buf);

    for cand in markers::scan_candidates(buf) {
        if !candidates.iter().any(|c| c.start == cand.start) {
            candidates.push(cand);
        }
    }

    tracing::debug!(
        candidates = candidates.len(),
        buffer_len = buf.len(),
        "container scan complete"
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn test_scan_container_finds_embedded_jpeg() {
        let jpeg = encode_jpeg_bytes(64, 48);
        let mut buf = vec![0u8; 4096];
        buf.extend_from_slice(&jpeg);
        buf.extend_from_slice(&[0u8; 2048]);

        let candidates = scan_container(&buf);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].start, 4096);
        assert_eq!(candidates[0].len(), jpeg.len());
        assert_eq!(candidates[0].bytes(&buf), &jpeg[..]);
    }

    #[test]
    fn test_scan_container_empty_buffer_is_empty_signal() {
        assert!(scan_container(&[]).is_empty());
        assert!(scan_container(&vec![0u8; 1024]).is_empty());
    }

    #[test]
    fn test_scan_container_candidate_is_independently_decodable() {
        let jpeg = encode_jpeg_bytes(32, 32);
        let mut buf = vec![0xAB; 512];
        buf.extend_from_slice(&jpeg);

        let candidates = scan_container(&buf);
        assert_eq!(candidates.len(), 1);

        let decoded = crate::decode::decode_image(candidates[0].bytes(&buf)).unwrap();
        assert_eq!((decoded.width, decoded.height), (32, 32));
    }

    #[test]
    fn test_scan_container_multiple_embedded_images() {
        let small = encode_jpeg_bytes(16, 16);
        let large = encode_jpeg_bytes(200, 150);

        let mut buf = vec![0u8; 100];
        buf.extend_from_slice(&small);
        buf.extend_from_slice(&[0u8; 333]);
        buf.extend_from_slice(&large);

        let candidates = scan_container(&buf);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].len(), small.len());
        assert_eq!(candidates[1].len(), large.len());
    }

    #[test]
    fn test_candidate_accessors() {
        let cand = EmbeddedCandidate::new(10, 22, Discovery::MarkerWalk);
        assert_eq!(cand.len(), 12);
        assert!(!cand.is_empty());

        let empty = EmbeddedCandidate::new(5, 5, Discovery::IfdEntry);
        assert!(empty.is_empty());
    }
}
