//! Error types for the renderer.

use thiserror::Error;
use xmlscope_engine::BuildError;

/// Main error type for the renderer.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Building or serializing the document failed.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// Outline file could not be parsed as YAML.
    #[error("Invalid YAML outline: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// Outline file could not be parsed as JSON.
    #[error("Invalid JSON outline: {0}")]
    Json(#[from] serde_json::Error),

    /// Outline file has an extension that is neither YAML nor JSON.
    #[error("Unsupported outline format: '{0}'. Expected .yaml, .yml or .json")]
    UnsupportedFormat(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
