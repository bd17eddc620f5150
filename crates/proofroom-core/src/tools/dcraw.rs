//! RAW conversion via `dcraw`.
//!
//! Two variants in cost order: `-e -c` extracts the decoder's own embedded
//! thumbnail to stdout, and `-c -h -w` performs a fast half-resolution
//! demosaic (camera white balance) emitting a PPM stream. The demosaic
//! variant is the one invocation in the engine allowed a long timeout.

use std::path::Path;

use tokio::process::Command;

use super::{gate_and_decode, run_tool, stdout_on_success};
use crate::config::EngineConfig;
use crate::select::SelectedPreview;

const TOOL: &str = "dcraw";

/// Try the embedded-thumbnail extraction, then the half-size demosaic.
pub async fn extract_preview(path: &Path, cfg: &EngineConfig) -> Option<SelectedPreview> {
    let variants: [(&str, &[&str], u64); 2] = [
        ("embedded-thumbnail", &["-e", "-c"], cfg.tool_timeout_secs),
        ("half-size-demosaic", &["-c", "-h", "-w"], cfg.demosaic_timeout_secs),
    ];

    for (variant, args, timeout_secs) in variants {
        let mut cmd = Command::new(TOOL);
        cmd.args(args).arg(path);

        let attempt = run_tool(TOOL, variant, &mut cmd, timeout_secs)
            .await
            .and_then(|output| stdout_on_success(TOOL, variant, output));

        let bytes = match attempt {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                tracing::debug!(variant, "dcraw produced no output");
                continue;
            }
            Err(e) => {
                tracing::warn!(variant, error = %e, "dcraw attempt failed");
                continue;
            }
        };

        if let Some(preview) = gate_and_decode(TOOL, variant, bytes, cfg) {
            return Some(preview);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extract_preview_missing_file_is_none() {
        let cfg = EngineConfig::default();
        let result = extract_preview(Path::new("/nonexistent/proofroom-test.nef"), &cfg).await;
        assert!(result.is_none());
    }

    #[test]
    fn test_demosaic_ppm_output_decodes_through_gate() {
        // dcraw's demosaic emits binary PPM; the shared gate must accept
        // that stream shape, not only JPEG.
        let img = image::RgbImage::from_fn(128, 96, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 77])
        });
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(
                &mut std::io::Cursor::new(&mut bytes),
                image::ImageFormat::Pnm,
            )
            .unwrap();

        let cfg = EngineConfig {
            min_candidate_bytes: 64,
            ..EngineConfig::default()
        };
        let preview = gate_and_decode(TOOL, "half-size-demosaic", bytes, &cfg).unwrap();
        assert_eq!((preview.bitmap.width, preview.bitmap.height), (128, 96));
    }
}
