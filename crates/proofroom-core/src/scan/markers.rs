//! Structural JPEG marker scanning.
//!
//! The two-byte end-of-image pattern can legitimately appear inside
//! entropy-coded scan data, so pairing a start marker with the first
//! terminator bytes found after it is unsound. This scanner instead walks
//! the marker structure from each start-of-image: restart markers and
//! escaped `FF 00` pairs are skipped, length-prefixed segments are jumped
//! over whole, and only a terminator reached through that structure ends a
//! candidate. A raw substring search for the terminator remains as a
//! documented last-resort tier for producers whose marker structure is
//! broken mid-stream.

use super::{Discovery, EmbeddedCandidate};

/// JPEG start-of-image marker.
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
/// JPEG end-of-image marker.
pub const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

// The last-resort terminator search starts this far past the start marker,
// so quantization/Huffman tables cannot terminate an absurdly short stream.
const EOI_SEARCH_SKIP: usize = 1024;

/// Scan a buffer for embedded JPEG byte ranges.
///
/// Scanning resumes immediately after each consumed range, so several
/// embedded images per buffer (vendor thumbnail, preview, full-resolution
/// preview) are all reported. Selection is deferred to the caller.
pub fn scan_candidates(buf: &[u8]) -> Vec<EmbeddedCandidate> {
    let mut candidates = Vec::new();
    let mut pos = 0usize;

    while let Some(start) = find_soi(buf, pos) {
        if let Some(end) = walk_to_eoi(buf, start) {
            candidates.push(EmbeddedCandidate::new(start, end, Discovery::MarkerWalk));
            pos = end;
            continue;
        }

        // Structural walk ran off the buffer without reaching a terminator.
        // Tolerate malformed producers with a raw search, starting a safe
        // offset past the start marker.
        match find_eoi_substring(buf, start.saturating_add(EOI_SEARCH_SKIP)) {
            Some(end) => {
                candidates.push(EmbeddedCandidate::new(
                    start,
                    end,
                    Discovery::SubstringFallback,
                ));
                pos = end;
            }
            None => pos = start + 2,
        }
    }

    candidates
}

fn find_soi(buf: &[u8], from: usize) -> Option<usize> {
    if from >= buf.len() {
        return None;
    }
    buf[from..]
        .windows(2)
        .position(|w| w == JPEG_SOI)
        .map(|i| from + i)
}

fn find_eoi_substring(buf: &[u8], from: usize) -> Option<usize> {
    if from >= buf.len() {
        return None;
    }
    buf[from..]
        .windows(2)
        .position(|w| w == JPEG_EOI)
        .map(|i| from + i + 2)
}

/// Walk JPEG marker structure from a start-of-image offset.
///
/// Returns one past the end-of-image marker, or `None` when the buffer ends
/// before a terminator is reached through valid structure.
fn walk_to_eoi(buf: &[u8], start: usize) -> Option<usize> {
    let mut pos = start + 2;

    while pos + 1 < buf.len() {
        if buf[pos] != 0xFF {
            // Entropy-coded data between markers
            pos += 1;
            continue;
        }

        let marker = buf[pos + 1];
        match marker {
            // Escaped 0xFF inside entropy-coded data, not a boundary
            0x00 => pos += 2,
            // Fill byte before a marker
            0xFF => pos += 1,
            // TEM, standalone
            0x01 => pos += 2,
            // Restart markers, standalone
            0xD0..=0xD7 => pos += 2,
            // Nested start marker, standalone
            0xD8 => pos += 2,
            // Terminator reached through structure
            0xD9 => return Some(pos + 2),
            // Everything else >= 0xC0 carries a length-prefixed segment
            m if m >= 0xC0 => {
                if pos + 3 >= buf.len() {
                    return None;
                }
                let seg_len = u16::from_be_bytes([buf[pos + 2], buf[pos + 3]]) as usize;
                if seg_len < 2 {
                    return None;
                }
                pos += 2 + seg_len;
            }
            // 0xFF followed by a reserved value is stray data, not a marker
            _ => pos += 1,
        }
    }

    None
}
