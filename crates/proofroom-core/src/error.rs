//! Error types for the extraction engine.
//!
//! Every exit path of the engine maps onto one of these variants; nothing in
//! proofroom surfaces an opaque error to the caller. System I/O errors bubble
//! up unchanged, tool failures inside the fallback chain are soft (logged,
//! the chain continues), and the orchestrator folds whatever terminal error
//! remains into [`crate::pipeline::ExtractionOutcome::Failed`].

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias used throughout the engine.
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Error taxonomy for one extraction run.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Input path does not resolve to a readable file. Fatal, no retry.
    #[error("source file not found: {0}")]
    SourceNotFound(PathBuf),

    /// Extension or classification is not recognized. Fatal.
    #[error("unsupported source format: {0}")]
    UnsupportedFormat(String),

    /// Scanner found nothing usable and the fallback chain is exhausted.
    #[error("no embedded preview could be extracted")]
    NoEmbeddedPreview,

    /// One external tool attempt failed: non-zero exit, timeout, or
    /// malformed output. Always soft - the chain logs it and moves on.
    #[error("{tool} invocation failed ({variant}): {detail}")]
    ToolInvocationFailed {
        tool: &'static str,
        variant: String,
        detail: String,
    },

    /// Produced bytes did not clear the size/format/dimension gate.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Rendition generation itself failed. Aborts the remaining specs for
    /// the asset but does not roll back renditions already written.
    #[error("rendition encode failed for '{spec}': {detail}")]
    EncodeFailed { spec: String, detail: String },

    /// File system error. Always bubbles up unchanged.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Create a [`ExtractError::ValidationFailed`] with a message.
    pub fn validation(message: impl Into<String>) -> Self {
        ExtractError::ValidationFailed(message.into())
    }

    /// Create a [`ExtractError::ToolInvocationFailed`] for one tool attempt.
    pub(crate) fn tool(tool: &'static str, variant: &str, detail: impl Into<String>) -> Self {
        ExtractError::ToolInvocationFailed {
            tool,
            variant: variant.to_string(),
            detail: detail.into(),
        }
    }
}
