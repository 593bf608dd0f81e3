//! Error types for the Linnea evaluation toolkit.
//!
//! Errors are organized by subsystem so callers can tell a broken dataset
//! layout apart from a flaky knowledge-base endpoint or a model API failure.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Linnea operations.
#[derive(Error, Debug)]
pub enum LinneaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Dataset loading and integrity errors
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    /// Knowledge-base hierarchy errors
    #[error("Hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// Model evaluation errors
    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Dataset loading, download, and integrity errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// Expected on-disk layout is missing or incomplete
    #[error("Dataset not found or corrupted at {root}: {message}")]
    NotFound { root: PathBuf, message: String },

    /// Archive checksum does not match the expected value
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// A metadata/sidecar file could not be parsed
    #[error("Failed to parse {path}: {message}")]
    Metadata { path: PathBuf, message: String },

    /// Archive download failed
    #[error("Download failed for {url}: {message}")]
    Download { url: String, message: String },

    /// Archive extraction failed
    #[error("Failed to extract {path}: {message}")]
    Extract { path: PathBuf, message: String },

    /// Requested split is not defined for this dataset
    #[error("Unsupported split '{split}' for {dataset}")]
    UnsupportedSplit { dataset: String, split: String },

    /// Sample index past the end of the dataset
    #[error("Sample index {index} out of bounds (dataset has {len} samples)")]
    OutOfBounds { index: usize, len: usize },

    /// General I/O errors while scanning dataset directories
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Knowledge-base hierarchy errors.
#[derive(Error, Debug)]
pub enum HierarchyError {
    /// HTTP request to a knowledge-base endpoint failed
    #[error("{source_name} request failed: {message}")]
    Request {
        source_name: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Response body could not be decoded
    #[error("Failed to parse {source_name} response: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// Local index file (WordNet) could not be loaded
    #[error("Failed to load index {path}: {message}")]
    Index { path: PathBuf, message: String },
}

/// Model evaluation errors.
#[derive(Error, Debug)]
pub enum EvalError {
    /// Model API call failed
    #[error("Model error: {message}")]
    Model {
        message: String,
        status_code: Option<u16>,
    },

    /// Model call timed out
    #[error("Model call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Image bytes could not be read for the request
    #[error("Failed to read image {path}: {message}")]
    Image { path: PathBuf, message: String },
}

/// Convenience type alias for Linnea results.
pub type Result<T> = std::result::Result<T, LinneaError>;
