//! TIFF/IFD-directed candidate discovery.
//!
//! TIFF-based RAW containers (ARW, CR2, NEF, DNG and friends) advertise
//! their embedded JPEG previews through IFD entries: either the JPEG
//! interchange pair (`JpegInterchangeFormat` + length) or strip offsets
//! with a JPEG compression tag. Walking the directory chain - IFD0, its
//! SubIFDs, then IFD1 and onward - yields exact byte ranges without
//! touching the bulk of the file. Containers whose directories are absent
//! or wrong are covered by the marker scanner instead.

use super::{Discovery, EmbeddedCandidate};

const TIFF_MAGIC_LE: [u8; 4] = [0x49, 0x49, 0x2A, 0x00];
const TIFF_MAGIC_BE: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A];

// TIFF tag IDs
const TAG_STRIP_OFFSETS: u16 = 0x0111;
const TAG_STRIP_BYTE_COUNTS: u16 = 0x0117;
const TAG_JPEG_OFFSET: u16 = 0x0201; // JpegInterchangeFormat
const TAG_JPEG_LENGTH: u16 = 0x0202; // JpegInterchangeFormatLength
const TAG_SUBIFD: u16 = 0x014A;
const TAG_COMPRESSION: u16 = 0x0103;

// JPEG compression type values
const COMPRESSION_JPEG: u16 = 6;
const COMPRESSION_JPEG_OLD: u16 = 7;

const IFD_ENTRY_SIZE: usize = 12;
// Caps against corrupt or adversarial directory chains
const MAX_IFDS: usize = 32;
const MAX_IFD_ENTRIES: usize = 1000;

struct IfdEntry {
    tag: u16,
    count: u32,
    value_offset: u32,
}

/// Collect embedded-JPEG candidates advertised by the IFD chain.
///
/// Returns an empty list for non-TIFF buffers and for directories that do
/// not point at anything JPEG-shaped; neither is an error.
pub fn ifd_candidates(buf: &[u8]) -> Vec<EmbeddedCandidate> {
    let little_endian = if buf.len() >= 8 && buf[..4] == TIFF_MAGIC_LE {
        true
    } else if buf.len() >= 8 && buf[..4] == TIFF_MAGIC_BE {
        false
    } else {
        return Vec::new();
    };

    let Some(ifd0_offset) = read_u32(buf, 4, little_endian) else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    let mut queue = vec![ifd0_offset];
    let mut walked = 0usize;

    while let Some(offset) = queue.pop() {
        if offset == 0 || walked >= MAX_IFDS {
            continue;
        }
        walked += 1;

        let Some((entries, next_ifd)) = parse_ifd(buf, offset as usize, little_endian) else {
            continue;
        };

        if next_ifd != 0 {
            queue.push(next_ifd);
        }
        for entry in &entries {
            if entry.tag == TAG_SUBIFD && entry.count > 0 {
                queue.push(entry.value_offset);
            }
        }

        if let Some(cand) = candidate_from_entries(&entries, buf) {
            if !candidates.iter().any(|c: &EmbeddedCandidate| c.start == cand.start) {
                candidates.push(cand);
            }
        }
    }

    candidates
}

fn read_u16(buf: &[u8], pos: usize, little_endian: bool) -> Option<u16> {
    let b = buf.get(pos..pos + 2)?;
    Some(if little_endian {
        u16::from_le_bytes([b[0], b[1]])
    } else {
        u16::from_be_bytes([b[0], b[1]])
    })
}

fn read_u32(buf: &[u8], pos: usize, little_endian: bool) -> Option<u32> {
    let b = buf.get(pos..pos + 4)?;
    Some(if little_endian {
        u32::from_le_bytes([b[0], b[1], b[2], b[3]])
    } else {
        u32::from_be_bytes([b[0], b[1], b[2], b[3]])
    })
}

fn parse_ifd(buf: &[u8], offset: usize, little_endian: bool) -> Option<(Vec<IfdEntry>, u32)> {
    let entry_count = read_u16(buf, offset, little_endian)? as usize;
    if entry_count > MAX_IFD_ENTRIES {
        return None;
    }

    let mut entries = Vec::with_capacity(entry_count);
    for i in 0..entry_count {
        let base = offset + 2 + i * IFD_ENTRY_SIZE;
        let tag = read_u16(buf, base, little_endian)?;
        let count = read_u32(buf, base + 4, little_endian)?;
        let value_offset = read_u32(buf, base + 8, little_endian)?;

        // Entries pointing past the buffer are skipped, not fatal
        if value_offset as usize > buf.len() {
            continue;
        }

        entries.push(IfdEntry {
            tag,
            count,
            value_offset,
        });
    }

    let next_ifd = read_u32(buf, offset + 2 + entry_count * IFD_ENTRY_SIZE, little_endian)
        .unwrap_or(0);

    Some((entries, next_ifd))
}

fn candidate_from_entries(entries: &[IfdEntry], buf: &[u8]) -> Option<EmbeddedCandidate> {
    let mut jpeg_offset: Option<u32> = None;
    let mut jpeg_length: Option<u32> = None;
    let mut strip_offsets: Option<u32> = None;
    let mut strip_byte_counts: Option<u32> = None;
    let mut compression: Option<u16> = None;

    for entry in entries {
        match entry.tag {
            TAG_JPEG_OFFSET => jpeg_offset = Some(entry.value_offset),
            TAG_JPEG_LENGTH => jpeg_length = Some(entry.value_offset),
            TAG_STRIP_OFFSETS => strip_offsets = Some(entry.value_offset),
            TAG_STRIP_BYTE_COUNTS => strip_byte_counts = Some(entry.value_offset),
            TAG_COMPRESSION => compression = Some(entry.value_offset as u16),
            _ => {}
        }
    }

    // JPEG interchange pair first (the common thumbnail/preview case)
    if let (Some(offset), Some(length)) = (jpeg_offset, jpeg_length) {
        if let Some(range) = jpeg_range(buf, offset, length) {
            return Some(range);
        }
    }

    // Strip-based JPEG, used by some cameras
    if let (Some(offset), Some(length)) = (strip_offsets, strip_byte_counts) {
        let is_jpeg = compression
            .map(|c| c == COMPRESSION_JPEG || c == COMPRESSION_JPEG_OLD)
            .unwrap_or(false);
        if is_jpeg {
            if let Some(range) = jpeg_range(buf, offset, length) {
                return Some(range);
            }
        }
    }

    None
}

/// Validate an advertised range: in bounds, non-empty, and actually
/// starting with a start-of-image marker.
fn jpeg_range(buf: &[u8], offset: u32, length: u32) -> Option<EmbeddedCandidate> {
    let start = offset as usize;
    let len = length as usize;
    if len == 0 {
        return None;
    }
    let end = start.checked_add(len)?;
    if end > buf.len() {
        return None;
    }
    if buf[start..].starts_with(&super::JPEG_SOI) {
        Some(EmbeddedCandidate::new(start, end, Discovery::IfdEntry))
    } else {
        None
    }
}
