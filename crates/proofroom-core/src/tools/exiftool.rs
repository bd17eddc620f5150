//! Metadata-preview extraction via `exiftool`.
//!
//! `exiftool -b -<Tag> <file>` prints the raw bytes of a binary tag to
//! stdout. The preview tags are tried in quality order: the near-full-size
//! `JpgFromRaw` many vendors embed, the generic `PreviewImage`, and finally
//! the small `ThumbnailImage`.

use std::path::Path;

use tokio::process::Command;

use super::{gate_and_decode, run_tool, stdout_on_success};
use crate::config::EngineConfig;
use crate::select::SelectedPreview;

const TOOL: &str = "exiftool";

/// Preview tag names in priority order.
const PREVIEW_TAGS: &[&str] = &["JpgFromRaw", "PreviewImage", "ThumbnailImage"];

/// Try each preview tag in turn, returning the first byte stream that
/// clears the validation gate and decodes.
pub async fn extract_preview(path: &Path, cfg: &EngineConfig) -> Option<SelectedPreview> {
    for tag in PREVIEW_TAGS {
        let mut cmd = Command::new(TOOL);
        cmd.arg("-b").arg(format!("-{}", tag)).arg(path);

        let attempt = run_tool(TOOL, tag, &mut cmd, cfg.tool_timeout_secs)
            .await
            .and_then(|output| stdout_on_success(TOOL, tag, output));

        let bytes = match attempt {
            Ok(bytes) if !bytes.is_empty() => bytes,
            Ok(_) => {
                tracing::debug!(tag, "tag not present in source");
                continue;
            }
            Err(e) => {
                tracing::warn!(tag, error = %e, "exiftool attempt failed");
                continue;
            }
        };

        if let Some(preview) = gate_and_decode(TOOL, tag, bytes, cfg) {
            return Some(preview);
        }
    }

    None
}
