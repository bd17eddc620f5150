//! Extraction orchestration.
//!
//! The top-level policy over one source asset, run as an explicit state
//! machine:
//!
//! ```text
//! ScanningContainer -> SelectingCandidate -> (DirectSuccess | FallbackChain)
//!     -> Validating -> (PersistSuccess | PersistFailure)
//! ```
//!
//! Non-RAW assets skip the container stages entirely: they decode directly
//! and proceed to validation. Two caller policies sit above the shared
//! machine as an explicit [`ExtractionMode`] rather than separate entry
//! points: strict callers receive a typed failure and are guaranteed zero
//! artifacts at the rendition paths; placeholder callers (legacy
//! compatibility only, never the default) receive a clearly-labeled
//! synthetic set instead.
//!
//! Each call is one self-contained pipeline over one file. The engine holds
//! no locks and shares no mutable state between concurrent calls; callers
//! are responsible for not running two extractions against the same
//! destination paths at once, since the atomic temp-then-promote write is
//! only safe against a single concurrent writer per destination.

use std::io::ErrorKind;

use crate::asset::{FormatFamily, SourceAsset};
use crate::config::EngineConfig;
use crate::decode;
use crate::error::{ExtractError, Result};
use crate::render::{self, RenditionResult};
use crate::scan;
use crate::select::{self, SelectedPreview};
use crate::tools::{self, ToolAvailability};
use crate::validate;

/// Caller policy for extraction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// A failed extraction returns an explicit failure; nothing is
    /// fabricated. This is the default policy.
    Strict,
    /// A failed extraction writes a labeled synthetic rendition set.
    /// Legacy compatibility only.
    Placeholder,
}

/// Terminal result of one orchestrator call.
///
/// No partial or half-written state is ever observable through this type:
/// every listed rendition is fully written and validated, and a `Failed`
/// outcome guarantees nothing was left at any rendition path.
#[derive(Debug)]
pub enum ExtractionOutcome {
    Success(Vec<RenditionResult>),
    Failed(ExtractError),
}

impl ExtractionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionOutcome::Success(_))
    }

    /// The rendition list of a successful outcome.
    pub fn renditions(&self) -> Option<&[RenditionResult]> {
        match self {
            ExtractionOutcome::Success(results) => Some(results),
            ExtractionOutcome::Failed(_) => None,
        }
    }
}

/// Pipeline stages, traced at each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    ScanningContainer,
    SelectingCandidate,
    FallbackChain,
    Validating,
}

fn enter(stage: Stage) {
    tracing::debug!(?stage, "entering stage");
}

/// Run one extraction: source path in, rendition set (or typed failure) out.
///
/// This function never returns an opaque error; every exit path is folded
/// into the outcome.
pub async fn extract(
    asset: &SourceAsset,
    cfg: &EngineConfig,
    tools: &ToolAvailability,
    namespace: &str,
    mode: ExtractionMode,
) -> ExtractionOutcome {
    match run_pipeline(asset, cfg, tools, namespace).await {
        Ok(results) => {
            tracing::info!(
                source = %asset.path().display(),
                renditions = results.len(),
                "extraction complete"
            );
            ExtractionOutcome::Success(results)
        }
        Err(e) => match mode {
            ExtractionMode::Strict => {
                tracing::info!(source = %asset.path().display(), error = %e, "extraction failed");
                ExtractionOutcome::Failed(e)
            }
            ExtractionMode::Placeholder => {
                tracing::warn!(
                    source = %asset.path().display(),
                    error = %e,
                    "extraction failed, writing placeholder set"
                );
                match render::generate_placeholder_set(&asset.label(), cfg, namespace) {
                    Ok(results) => ExtractionOutcome::Success(results),
                    Err(placeholder_err) => ExtractionOutcome::Failed(placeholder_err),
                }
            }
        },
    }
}

async fn run_pipeline(
    asset: &SourceAsset,
    cfg: &EngineConfig,
    tools: &ToolAvailability,
    namespace: &str,
) -> Result<Vec<RenditionResult>> {
    let bytes = read_source(asset).await?;

    let preview = match asset.family() {
        FormatFamily::StandardBitmap => {
            // Bypasses scanning, selection and the tool chain entirely
            let bitmap = decode::decode_image(&bytes)
                .map_err(|e| ExtractError::validation(format!("source did not decode: {}", e)))?;
            SelectedPreview { bytes, bitmap }
        }
        FormatFamily::Raw => {
            enter(Stage::ScanningContainer);
            if !SourceAsset::looks_like_tiff(&bytes) {
                tracing::debug!("no TIFF container shape, relying on marker scan");
            }
            let candidates = scan::scan_container(&bytes);

            enter(Stage::SelectingCandidate);
            match select::select_preview(&bytes, candidates, cfg) {
                Some(preview) => preview, // DirectSuccess
                None => {
                    enter(Stage::FallbackChain);
                    tools::run_fallback_chain(asset, cfg, tools)
                        .await
                        .ok_or(ExtractError::NoEmbeddedPreview)?
                }
            }
        }
    };

    enter(Stage::Validating);
    check_preview(&preview, cfg)?;

    render::generate_renditions(&preview.bitmap, cfg, namespace)
}

/// The pre-persist gate: whatever the earlier stages produced is re-checked
/// before any rendition is written. With the atomic writer downstream this
/// is the last point where a bad preview can be stopped with certainty that
/// no artifact exists yet.
fn check_preview(preview: &SelectedPreview, cfg: &EngineConfig) -> Result<()> {
    if preview.bytes.is_empty() {
        return Err(ExtractError::validation("empty preview stream"));
    }

    let facts = validate::sniff_image(&preview.bytes, cfg)?;

    if preview.bitmap.is_empty() {
        return Err(ExtractError::validation("empty decoded bitmap"));
    }

    tracing::debug!(
        format = ?facts.format,
        width = preview.bitmap.width,
        height = preview.bitmap.height,
        source_bytes = preview.bytes.len(),
        "preview validated"
    );
    Ok(())
}

async fn read_source(asset: &SourceAsset) -> Result<Vec<u8>> {
    match tokio::fs::read(asset.path()).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(ExtractError::SourceNotFound(asset.path().to_path_buf()))
        }
        Err(e) => Err(ExtractError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn encode_jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x * 3 % 256) as u8, (y * 5 % 256) as u8, 200])
        });
        let mut out = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Jpeg)
            .unwrap();
        out.into_inner()
    }

    fn test_config(storage_root: &Path) -> EngineConfig {
        EngineConfig {
            storage_root: storage_root.to_path_buf(),
            min_candidate_bytes: 1024,
            min_preview_edge: 256,
            ..EngineConfig::default()
        }
    }

    /// A synthetic RAW container: padding, an embedded JPEG, padding.
    fn write_raw_fixture(path: &Path, preview_width: u32, preview_height: u32) {
        let mut buf = vec![0u8; 2048];
        buf.extend_from_slice(&encode_jpeg_bytes(preview_width, preview_height));
        buf.extend_from_slice(&vec![0u8; 4096]);
        std::fs::write(path, buf).unwrap();
    }

    #[tokio::test]
    async fn test_standard_bitmap_bypasses_container_stages() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.jpg");
        std::fs::write(&source, encode_jpeg_bytes(640, 480)).unwrap();

        let asset = SourceAsset::classify(&source).unwrap();
        let cfg = test_config(&dir.path().join("out"));

        // No tools available: the direct path must be enough
        let outcome = extract(
            &asset,
            &cfg,
            &ToolAvailability::none(),
            "std-1",
            ExtractionMode::Strict,
        )
        .await;

        let renditions = outcome.renditions().expect("expected success");
        assert_eq!(renditions.len(), 3);
        for r in renditions {
            let on_disk = cfg.storage_root.join(&r.path);
            let bytes = std::fs::read(&on_disk).unwrap();
            assert!(!bytes.is_empty());
            assert_eq!(
                image::guess_format(&bytes).unwrap(),
                image::ImageFormat::Jpeg
            );
        }
    }

    #[tokio::test]
    async fn test_raw_container_direct_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("shot.arw");
        write_raw_fixture(&source, 800, 600);

        let asset = SourceAsset::classify(&source).unwrap();
        let cfg = test_config(&dir.path().join("out"));

        let outcome = extract(
            &asset,
            &cfg,
            &ToolAvailability::none(),
            "raw-1",
            ExtractionMode::Strict,
        )
        .await;

        let renditions = outcome.renditions().expect("expected success");
        let web = renditions.iter().find(|r| r.name == "web").unwrap();
        assert_eq!((web.width, web.height), (800, 600));
    }

    #[tokio::test]
    async fn test_strict_failure_leaves_zero_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("hollow.arw");
        // A RAW container with no embedded image at all
        std::fs::write(&source, vec![0u8; 64 * 1024]).unwrap();

        let asset = SourceAsset::classify(&source).unwrap();
        let storage = dir.path().join("out");
        let cfg = test_config(&storage);

        let outcome = extract(
            &asset,
            &cfg,
            &ToolAvailability::none(),
            "fail-1",
            ExtractionMode::Strict,
        )
        .await;

        match outcome {
            ExtractionOutcome::Failed(ExtractError::NoEmbeddedPreview) => {}
            other => panic!("unexpected outcome: {:?}", other),
        }

        // Zero files at any rendition path
        assert!(
            !storage.exists() || std::fs::read_dir(&storage).unwrap().count() == 0,
            "strict failure must not leave artifacts"
        );
    }

    #[tokio::test]
    async fn test_placeholder_mode_writes_labeled_set() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("hollow.nef");
        std::fs::write(&source, vec![0u8; 32 * 1024]).unwrap();

        let asset = SourceAsset::classify(&source).unwrap();
        let cfg = test_config(&dir.path().join("out"));

        let outcome = extract(
            &asset,
            &cfg,
            &ToolAvailability::none(),
            "ph-1",
            ExtractionMode::Placeholder,
        )
        .await;

        let renditions = outcome.renditions().expect("expected placeholder success");
        assert_eq!(renditions.len(), 3);
        for r in renditions {
            assert!(r.placeholder);
            assert!(r.path.to_string_lossy().contains("_placeholder."));
            assert!(cfg.storage_root.join(&r.path).exists());
        }
    }

    #[tokio::test]
    async fn test_repeat_extraction_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("again.arw");
        write_raw_fixture(&source, 640, 400);

        let asset = SourceAsset::classify(&source).unwrap();
        let cfg = test_config(&dir.path().join("out"));

        let first = extract(
            &asset,
            &cfg,
            &ToolAvailability::none(),
            "idem",
            ExtractionMode::Strict,
        )
        .await;
        let snapshot: Vec<(std::path::PathBuf, Vec<u8>)> = first
            .renditions()
            .unwrap()
            .iter()
            .map(|r| {
                let p = cfg.storage_root.join(&r.path);
                (p.clone(), std::fs::read(&p).unwrap())
            })
            .collect();

        let second = extract(
            &asset,
            &cfg,
            &ToolAvailability::none(),
            "idem",
            ExtractionMode::Strict,
        )
        .await;
        assert!(second.is_success());

        for (path, before) in snapshot {
            assert_eq!(std::fs::read(&path).unwrap(), before, "{:?} changed", path);
        }
    }

    #[tokio::test]
    async fn test_missing_source_is_typed_failure() {
        let asset = SourceAsset::classify("/nonexistent/proofroom/shot.arw").unwrap();
        let cfg = test_config(Path::new("/tmp/proofroom-unused"));

        let outcome = extract(
            &asset,
            &cfg,
            &ToolAvailability::none(),
            "missing",
            ExtractionMode::Strict,
        )
        .await;

        match outcome {
            ExtractionOutcome::Failed(ExtractError::SourceNotFound(p)) => {
                assert!(p.ends_with("shot.arw"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_corrupt_standard_bitmap_is_validation_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("broken.jpg");
        std::fs::write(&source, vec![0x13u8; 500]).unwrap();

        let asset = SourceAsset::classify(&source).unwrap();
        let cfg = test_config(&dir.path().join("out"));

        let outcome = extract(
            &asset,
            &cfg,
            &ToolAvailability::none(),
            "corrupt",
            ExtractionMode::Strict,
        )
        .await;

        match outcome {
            ExtractionOutcome::Failed(ExtractError::ValidationFailed(_)) => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_larger_embedded_preview_wins_over_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("two.arw");

        // Small vendor thumbnail first, larger preview later in the file
        let mut buf = vec![0u8; 1024];
        buf.extend_from_slice(&encode_jpeg_bytes(120, 90));
        buf.extend_from_slice(&vec![0u8; 512]);
        buf.extend_from_slice(&encode_jpeg_bytes(900, 600));
        std::fs::write(&source, buf).unwrap();

        let asset = SourceAsset::classify(&source).unwrap();
        let cfg = test_config(&dir.path().join("out"));

        let outcome = extract(
            &asset,
            &cfg,
            &ToolAvailability::none(),
            "two",
            ExtractionMode::Strict,
        )
        .await;

        let renditions = outcome.renditions().expect("expected success");
        let web = renditions.iter().find(|r| r.name == "web").unwrap();
        assert_eq!((web.width, web.height), (900, 600));
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = ExtractionOutcome::Success(vec![]);
        assert!(ok.is_success());
        assert!(ok.renditions().is_some());

        let failed = ExtractionOutcome::Failed(ExtractError::NoEmbeddedPreview);
        assert!(!failed.is_success());
        assert!(failed.renditions().is_none());
    }
}
