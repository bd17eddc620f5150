//! Preview candidate selection.
//!
//! Vendors embed previews at wildly different resolutions: a 160px EXIF
//! thumbnail, a mid-size screen preview, sometimes a full-resolution one.
//! Bigger is strictly better when available, but *some* preview beats none,
//! so selection runs in two passes over the size-ordered candidates: accept
//! the first large-enough decodable stream immediately, and fall back to
//! the first stream that decodes at all.

use crate::config::EngineConfig;
use crate::decode::{decode_image, DecodedBitmap};
use crate::scan::EmbeddedCandidate;

/// The selector's output: the winning candidate's bytes and its decoded
/// bitmap, kept together so the final validation gate can re-check the
/// source stream.
#[derive(Debug)]
pub struct SelectedPreview {
    pub bytes: Vec<u8>,
    pub bitmap: DecodedBitmap,
}

/// Choose the best usable preview out of the scanner's candidates.
///
/// Policy:
/// 1. Sort candidates by raw byte length, descending.
/// 2. Drop candidates under the byte-size floor - unless nothing clears it,
///    in which case everything stays in play.
/// 3. Decode in size order; the first candidate that decodes AND clears the
///    pixel floor wins immediately.
/// 4. Failing that, the first candidate that decoded at all wins as a last
///    resort.
///
/// Returns `None` when no candidate decodes.
pub fn select_preview(
    buf: &[u8],
    mut candidates: Vec<EmbeddedCandidate>,
    cfg: &EngineConfig,
) -> Option<SelectedPreview> {
    candidates.sort_by(|a, b| b.len().cmp(&a.len()));

    let any_clears_floor = candidates
        .iter()
        .any(|c| c.len() >= cfg.min_candidate_bytes);
    if any_clears_floor {
        candidates.retain(|c| c.len() >= cfg.min_candidate_bytes);
    }

    let mut last_resort: Option<(EmbeddedCandidate, DecodedBitmap)> = None;

    for cand in candidates {
        let bitmap = match decode_image(cand.bytes(buf)) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                tracing::debug!(
                    start = cand.start,
                    len = cand.len(),
                    error = %e,
                    "candidate failed to decode"
                );
                continue;
            }
        };

        if bitmap.long_edge() >= cfg.min_preview_edge {
            // Large enough - short-circuit, do not keep scanning
            tracing::debug!(
                start = cand.start,
                len = cand.len(),
                width = bitmap.width,
                height = bitmap.height,
                "selected preview candidate"
            );
            return Some(SelectedPreview {
                bytes: cand.bytes(buf).to_vec(),
                bitmap,
            });
        }

        if last_resort.is_none() {
            last_resort = Some((cand, bitmap));
        }
    }

    last_resort.map(|(cand, bitmap)| {
        tracing::debug!(
            start = cand.start,
            len = cand.len(),
            width = bitmap.width,
            height = bitmap.height,
            "no candidate cleared the pixel floor, using last resort"
        );
        SelectedPreview {
            bytes: cand.bytes(buf).to_vec(),
            bitmap,
        }
    })
}
