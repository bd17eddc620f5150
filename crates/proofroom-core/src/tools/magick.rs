//! General-purpose conversion via ImageMagick's `magick`.
//!
//! The last-resort strategy: ask a generic converter to render the first
//! layer/frame of whatever the container is into a JPEG. Output goes to a
//! temporary file that is removed on every path except promotion of its
//! bytes into the pipeline.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::process::Command;

use super::{gate_and_decode, run_tool, stdout_on_success};
use crate::config::EngineConfig;
use crate::select::SelectedPreview;

const TOOL: &str = "magick";

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// RAII guard for the converter's temporary output file.
struct TempOutput {
    path: PathBuf,
}

impl TempOutput {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!(
            "proofroom-magick-{}-{}.jpg",
            std::process::id(),
            TEMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        Self { path }
    }
}

impl Drop for TempOutput {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Convert the container's first frame to JPEG and run it through the gate.
pub async fn convert_first_frame(path: &Path, cfg: &EngineConfig) -> Option<SelectedPreview> {
    let first_frame = format!("{}[0]", path.display());

    let variants: [(&str, Vec<String>); 2] = [
        (
            "first-frame",
            vec![first_frame.clone(), "-quality".into(), "92".into()],
        ),
        (
            "first-frame-flattened",
            vec![first_frame, "-flatten".into(), "-quality".into(), "92".into()],
        ),
    ];

    for (variant, args) in variants {
        let out = TempOutput::new();

        let mut cmd = Command::new(TOOL);
        cmd.args(&args).arg(&out.path);

        let attempt = run_tool(TOOL, variant, &mut cmd, cfg.tool_timeout_secs)
            .await
            .and_then(|output| stdout_on_success(TOOL, variant, output));

        if let Err(e) = attempt {
            tracing::warn!(variant, error = %e, "magick attempt failed");
            continue;
        }

        let bytes = match tokio::fs::read(&out.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(variant, error = %e, "magick output unreadable");
                continue;
            }
        };

        if let Some(preview) = gate_and_decode(TOOL, variant, bytes, cfg) {
            return Some(preview);
        }
    }

    None
}
