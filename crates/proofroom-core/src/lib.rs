//! Proofroom Core - RAW preview and rendition extraction engine
//!
//! This crate turns proprietary camera RAW container files (and ordinary
//! bitmaps) into a set of derived renditions - thumbnail, web-sized, and a
//! micro placeholder - for use by a media pipeline.
//!
//! # Architecture
//!
//! Extraction runs two strategies in strict order:
//!
//! - **Direct path**: scan the container bytes for embedded JPEG previews
//!   ([`scan`]), choose the best candidate ([`select`]), decode it
//!   ([`decode`]).
//! - **Tool fallback**: when direct scanning yields nothing, a fixed chain
//!   of external converters ([`tools`]) is tried, each attempt bounded by a
//!   hard timeout and validated by the same gate ([`validate`]) as direct
//!   scanning.
//!
//! Whatever survives is rendered into the configured output set
//! ([`render`]) with atomic temp-then-promote writes. The orchestrator
//! ([`pipeline`]) holds the state machine and the strict-vs-placeholder
//! caller policy.
//!
//! # Concurrency
//!
//! One extraction call is one self-contained pipeline over one file. The
//! engine keeps no shared mutable state and holds no locks; any number of
//! extractions for *different* assets may run in parallel. Callers must
//! serialize work per destination path.

pub mod asset;
pub mod config;
pub mod decode;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod scan;
pub mod select;
pub mod tools;
pub mod validate;

pub use asset::{FormatFamily, SourceAsset};
pub use config::{EngineConfig, RenditionSpec};
pub use decode::DecodedBitmap;
pub use error::{ExtractError, Result};
pub use pipeline::{extract, ExtractionMode, ExtractionOutcome};
pub use render::RenditionResult;
pub use scan::{scan_container, EmbeddedCandidate};
pub use tools::ToolAvailability;
