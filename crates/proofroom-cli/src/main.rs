//! Command-line front end for the Proofroom rendition engine.
//!
//! Classifies one source file, probes tool availability once, runs the
//! extraction pipeline, and prints the outcome as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use proofroom_core::{extract, EngineConfig, ExtractionMode, ExtractionOutcome, SourceAsset, ToolAvailability};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Strict,
    Placeholder,
}

impl From<Mode> for ExtractionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Strict => ExtractionMode::Strict,
            Mode::Placeholder => ExtractionMode::Placeholder,
        }
    }
}

#[derive(Parser)]
#[command(name = "proofroom")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract preview renditions from RAW containers and bitmaps")]
struct Cli {
    /// Source image file (RAW container or standard bitmap)
    source: PathBuf,

    /// Output namespace key; rendition file names derive from it
    #[arg(short, long)]
    namespace: String,

    /// Storage root for written renditions (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Engine config TOML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Failure policy
    #[arg(long, value_enum, default_value_t = Mode::Strict)]
    mode: Mode,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("failed to load config from {:?}", path))?,
        None => EngineConfig::default(),
    };
    if let Some(output) = cli.output {
        cfg.storage_root = output;
    }

    let asset = SourceAsset::classify(&cli.source).context("unsupported source file")?;

    // One-time capability probe, passed into the orchestrator by value
    let tools = ToolAvailability::probe().await;
    tracing::debug!(?tools, "tool availability probed");

    let outcome = extract(&asset, &cfg, &tools, &cli.namespace, cli.mode.into()).await;

    match &outcome {
        ExtractionOutcome::Success(renditions) => {
            let listing: Vec<_> = renditions
                .iter()
                .map(|r| {
                    json!({
                        "name": r.name,
                        "path": r.path,
                        "width": r.width,
                        "height": r.height,
                        "bytes": r.bytes,
                        "placeholder": r.placeholder,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "outcome": "success",
                    "storage_root": cfg.storage_root,
                    "renditions": listing,
                }))?
            );
            Ok(())
        }
        ExtractionOutcome::Failed(reason) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "outcome": "failed",
                    "reason": reason.to_string(),
                }))?
            );
            std::process::exit(1);
        }
    }
}
