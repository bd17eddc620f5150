//! External tool fallback chain.
//!
//! When direct container scanning produces nothing usable, three external
//! single-purpose converters are tried in fixed priority order:
//!
//! 1. [`exiftool`] - embedded preview/thumbnail binary tags, cheapest
//! 2. [`dcraw`] - the decoder's own thumbnail, then a fast half-size demosaic
//! 3. [`magick`] - general-purpose conversion of the container's first frame
//!
//! Every attempt is a blocking subprocess call bounded by a hard timeout; a
//! timed-out process is killed and its output discarded. Every produced byte
//! stream passes the same validation gate used for direct scanning before it
//! is accepted. All failures inside the chain are soft: logged with strategy
//! and variant detail, then the chain moves on. Only complete exhaustion is
//! surfaced, as `None`.

pub mod dcraw;
pub mod exiftool;
pub mod magick;

use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::asset::SourceAsset;
use crate::config::EngineConfig;
use crate::decode::decode_image;
use crate::error::{ExtractError, Result};
use crate::select::SelectedPreview;
use crate::validate;

/// Which external tools are present on this host.
///
/// Probed once at process/worker startup and passed into the orchestrator
/// as an immutable value; the chain never re-checks tool presence per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolAvailability {
    pub exiftool: bool,
    pub dcraw: bool,
    pub magick: bool,
}

impl ToolAvailability {
    /// Probe the host for each tool with a cheap invocation.
    pub async fn probe() -> Self {
        Self {
            exiftool: probe_binary("exiftool", &["-ver"]).await,
            dcraw: probe_binary("dcraw", &[]).await,
            magick: probe_binary("magick", &["-version"]).await,
        }
    }

    /// No tools available. Useful for tests and for callers that want the
    /// direct-scan path only.
    pub const fn none() -> Self {
        Self {
            exiftool: false,
            dcraw: false,
            magick: false,
        }
    }

    pub fn any(&self) -> bool {
        self.exiftool || self.dcraw || self.magick
    }
}

/// A binary is available when it can be spawned at all; its exit code does
/// not matter here (dcraw exits non-zero when invoked without a file).
async fn probe_binary(binary: &str, args: &[&str]) -> bool {
    Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .is_ok()
}

/// Run the fallback chain over one source asset.
///
/// Returns the first gate-cleared, decodable preview any strategy produces,
/// or `None` once all strategies are exhausted.
pub async fn run_fallback_chain(
    asset: &SourceAsset,
    cfg: &EngineConfig,
    tools: &ToolAvailability,
) -> Option<SelectedPreview> {
    if tools.exiftool {
        if let Some(preview) = exiftool::extract_preview(asset.path(), cfg).await {
            return Some(preview);
        }
    } else {
        tracing::debug!("exiftool unavailable, skipping metadata-preview strategy");
    }

    if tools.dcraw {
        if let Some(preview) = dcraw::extract_preview(asset.path(), cfg).await {
            return Some(preview);
        }
    } else {
        tracing::debug!("dcraw unavailable, skipping demosaic strategy");
    }

    if tools.magick {
        if let Some(preview) = magick::convert_first_frame(asset.path(), cfg).await {
            return Some(preview);
        }
    } else {
        tracing::debug!("magick unavailable, skipping conversion strategy");
    }

    None
}

/// Spawn one tool attempt with piped output and a hard timeout.
///
/// The child is killed on timeout (it is dropped with kill-on-drop set) and
/// the attempt reported as a [`ExtractError::ToolInvocationFailed`].
pub(crate) async fn run_tool(
    tool: &'static str,
    variant: &str,
    command: &mut Command,
    timeout_secs: u64,
) -> Result<Output> {
    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| ExtractError::tool(tool, variant, format!("failed to spawn: {}", e)))?;

    match timeout(Duration::from_secs(timeout_secs), child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ExtractError::tool(
            tool,
            variant,
            format!("failed to collect output: {}", e),
        )),
        Err(_) => Err(ExtractError::tool(
            tool,
            variant,
            format!("timed out after {}s", timeout_secs),
        )),
    }
}

/// Extract stdout from a finished attempt, turning a non-zero exit into a
/// soft tool failure carrying trimmed stderr.
pub(crate) fn stdout_on_success(
    tool: &'static str,
    variant: &str,
    output: Output,
) -> Result<Vec<u8>> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractError::tool(
            tool,
            variant,
            format!("{}: {}", output.status, stderr.trim()),
        ));
    }
    Ok(output.stdout)
}

/// The shared acceptance step for every strategy: the produced bytes must
/// clear the validation gate AND decode, not merely be big enough.
pub(crate) fn gate_and_decode(
    tool: &'static str,
    variant: &str,
    bytes: Vec<u8>,
    cfg: &EngineConfig,
) -> Option<SelectedPreview> {
    if let Err(e) = validate::check_preview_bytes(&bytes, cfg) {
        tracing::warn!(tool, variant, error = %e, "tool output rejected by gate");
        return None;
    }

    match decode_image(&bytes) {
        Ok(bitmap) => {
            tracing::debug!(
                tool,
                variant,
                bytes = bytes.len(),
                width = bitmap.width,
                height = bitmap.height,
                "fallback strategy produced a preview"
            );
            Some(SelectedPreview { bytes, bitmap })
        }
        Err(e) => {
            tracing::warn!(tool, variant, error = %e, "tool output did not decode");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relaxed_config() -> EngineConfig {
        EngineConfig {
            min_candidate_bytes: 64,
            ..EngineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_probe_missing_binary_is_false() {
        assert!(!probe_binary("proofroom-no-such-binary-a6f3", &[]).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_present_binary_is_true() {
        assert!(probe_binary("true", &[]).await);
    }

    #[tokio::test]
    async fn test_chain_with_no_tools_is_none() {
        let asset = SourceAsset::classify("/tmp/missing.arw").unwrap();
        let cfg = EngineConfig::default();
        let result = run_fallback_chain(&asset, &cfg, &ToolAvailability::none()).await;
        assert!(result.is_none());
    }

    #[test]
    fn test_availability_any() {
        assert!(!ToolAvailability::none().any());
        let some = ToolAvailability {
            dcraw: true,
            ..ToolAvailability::none()
        };
        assert!(some.any());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tool_captures_stdout() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("printf hello");
        let output = run_tool("sh", "echo", &mut cmd, 10).await.unwrap();
        let bytes = stdout_on_success("sh", "echo", output).unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tool_nonzero_exit_is_soft_failure() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo boom >&2; exit 3");
        let output = run_tool("sh", "fail", &mut cmd, 10).await.unwrap();
        let err = stdout_on_success("sh", "fail", output).unwrap_err();
        match err {
            ExtractError::ToolInvocationFailed { tool, detail, .. } => {
                assert_eq!(tool, "sh");
                assert!(detail.contains("boom"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_tool_timeout_kills_attempt() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let err = run_tool("sleep", "hang", &mut cmd, 1).await.unwrap_err();
        match err {
            ExtractError::ToolInvocationFailed { detail, .. } => {
                assert!(detail.contains("timed out"), "{}", detail);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_gate_and_decode_accepts_valid_jpeg() {
        let img = image::RgbImage::from_pixel(64, 48, image::Rgb([9, 9, 9]));
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .unwrap();

        let preview = gate_and_decode("test", "jpeg", out.into_inner(), &relaxed_config());
        assert_eq!(preview.unwrap().bitmap.width, 64);
    }

    #[test]
    fn test_gate_and_decode_rejects_garbage() {
        let bytes = vec![0x12u8; 4096];
        assert!(gate_and_decode("test", "garbage", bytes, &relaxed_config()).is_none());
    }
}
