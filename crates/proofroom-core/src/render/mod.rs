//! Rendition generation.
//!
//! Turns one decoded bitmap into the configured set of sized outputs.
//! Targets only ever shrink the source (aspect preserved, never upscaled);
//! alpha-carrying sources go to PNG over a transparent canvas, everything
//! else to JPEG over an opaque one.
//!
//! Every write is atomic from the caller's perspective: bytes land in a
//! sibling temporary file that is promoted to the final path with a rename
//! only after the encode succeeded. A failed or cancelled run can leave a
//! stray temporary at worst, never a partial file at a final rendition
//! path. The only read-back the engine performs on its own output is the
//! byte-size check immediately after the promote.
//!
//! An encode failure mid-set aborts the remaining specs but keeps the
//! renditions already written for the asset; whether those should roll back
//! instead is debatable, and the source system this engine replaces keeps
//! them.

mod encode;
mod placeholder;
mod resize;

pub use encode::{encode_jpeg, encode_png, EncodeError};
pub use placeholder::placeholder_bitmap;
pub use resize::{fit_dimensions, resize_bitmap, FilterType};

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{EngineConfig, RenditionSpec};
use crate::decode::DecodedBitmap;
use crate::error::{ExtractError, Result};

/// One produced output file.
#[derive(Debug, Clone, Serialize)]
pub struct RenditionResult {
    /// Rendition name (`thumbnail`, `web`, `micro`).
    pub name: String,
    /// Written path, relative to the configured storage root.
    pub path: PathBuf,
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Byte size of the written file.
    pub bytes: u64,
    /// Whether this is a synthetic placeholder rather than an extracted
    /// preview.
    pub placeholder: bool,
}

/// Generate the full rendition set for a bitmap.
///
/// Specs are processed in configuration order. A failure on the first spec
/// is returned as [`ExtractError::EncodeFailed`]; a failure after at least
/// one successful write aborts the remaining specs and returns the partial
/// set.
pub fn generate_renditions(
    bitmap: &DecodedBitmap,
    cfg: &EngineConfig,
    namespace: &str,
) -> Result<Vec<RenditionResult>> {
    let mut results = Vec::with_capacity(cfg.renditions.len());

    for spec in &cfg.renditions {
        match render_one(bitmap, spec, cfg, namespace, false) {
            Ok(result) => results.push(result),
            Err(e) => {
                if results.is_empty() {
                    return Err(e);
                }
                tracing::warn!(
                    spec = %spec.name,
                    error = %e,
                    written = results.len(),
                    "rendition set aborted mid-way, keeping partial set"
                );
                break;
            }
        }
    }

    Ok(results)
}

/// Generate a synthetic placeholder set, one labeled image per spec.
///
/// The canvas is synthesized at each spec's bounding box so the label stays
/// legible at every size. Files carry the `_placeholder` naming marker.
pub fn generate_placeholder_set(
    label: &str,
    cfg: &EngineConfig,
    namespace: &str,
) -> Result<Vec<RenditionResult>> {
    let mut results = Vec::with_capacity(cfg.renditions.len());

    for spec in &cfg.renditions {
        let canvas = placeholder_bitmap(label, spec.max_width, spec.max_height);
        match render_one(&canvas, spec, cfg, namespace, true) {
            Ok(result) => results.push(result),
            Err(e) => {
                if results.is_empty() {
                    return Err(e);
                }
                tracing::warn!(spec = %spec.name, error = %e, "placeholder set aborted mid-way");
                break;
            }
        }
    }

    Ok(results)
}

/// Deterministic output file name for a namespace/spec pair.
fn rendition_file_name(
    namespace: &str,
    spec_name: &str,
    placeholder: bool,
    extension: &str,
) -> String {
    if placeholder {
        format!("{}_{}_placeholder.{}", namespace, spec_name, extension)
    } else {
        format!("{}_{}.{}", namespace, spec_name, extension)
    }
}

fn render_one(
    bitmap: &DecodedBitmap,
    spec: &RenditionSpec,
    cfg: &EngineConfig,
    namespace: &str,
    placeholder: bool,
) -> Result<RenditionResult> {
    let encode_failed = |detail: String| ExtractError::EncodeFailed {
        spec: spec.name.clone(),
        detail,
    };

    let (width, height) =
        fit_dimensions(bitmap.width, bitmap.height, spec.max_width, spec.max_height);
    if width == 0 || height == 0 {
        return Err(encode_failed("degenerate source bitmap".to_string()));
    }

    let resized = resize_bitmap(bitmap, width, height, filter_for_target(width.max(height)))
        .ok_or_else(|| encode_failed("pixel buffer could not be reassembled".to_string()))?;

    let resized_rgba = resized
        .into_rgba_image()
        .ok_or_else(|| encode_failed("pixel buffer could not be reassembled".to_string()))?;

    // Alpha-capable destination only when the source actually carries
    // transparency; the canvas fill matches.
    let (encoded, extension) = if bitmap.has_alpha {
        let mut canvas = image::RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 0]));
        image::imageops::overlay(&mut canvas, &resized_rgba, 0, 0);
        let bytes = encode_png(canvas.as_raw(), width, height)
            .map_err(|e| encode_failed(e.to_string()))?;
        (bytes, "png")
    } else {
        let mut canvas =
            image::RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
        image::imageops::overlay(&mut canvas, &resized_rgba, 0, 0);
        let rgb = image::DynamicImage::ImageRgba8(canvas).into_rgb8();
        let bytes = encode_jpeg(rgb.as_raw(), width, height, spec.quality)
            .map_err(|e| encode_failed(e.to_string()))?;
        (bytes, "jpg")
    };

    let file_name = rendition_file_name(namespace, &spec.name, placeholder, extension);
    let final_path = cfg.storage_root.join(&file_name);
    let bytes_written = write_atomic(&final_path, &encoded)?;

    tracing::debug!(
        spec = %spec.name,
        path = %final_path.display(),
        width,
        height,
        bytes = bytes_written,
        "rendition written"
    );

    Ok(RenditionResult {
        name: spec.name.clone(),
        path: PathBuf::from(file_name),
        width,
        height,
        bytes: bytes_written,
        placeholder,
    })
}

/// Small targets get the fast filter, large ones the high-quality one.
fn filter_for_target(long_edge: u32) -> FilterType {
    if long_edge <= 512 {
        FilterType::Bilinear
    } else {
        FilterType::Lanczos3
    }
}

/// Removes the temporary file on drop; a no-op once the rename moved it.
struct TempGuard(PathBuf);

impl Drop for TempGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Write bytes through a sibling temp file promoted by an atomic rename,
/// then report the promoted file's size.
fn write_atomic(final_path: &Path, bytes: &[u8]) -> Result<u64> {
    if let Some(parent) = final_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp_name = final_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(format!(".tmp-{}", std::process::id()));
    let tmp_path = final_path.with_file_name(tmp_name);

    let _guard = TempGuard(tmp_path.clone());
    std::fs::write(&tmp_path, bytes)?;
    std::fs::rename(&tmp_path, final_path)?;

    Ok(std::fs::metadata(final_path)?.len())
}
