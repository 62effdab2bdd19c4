//! Error Handling Module
//!
//! Defines the error taxonomy for the PixMix pipeline.
//! Uses thiserror for ergonomic error definitions.
//!
//! All errors propagate synchronously to the caller; the pipeline never
//! retries or silently falls back on a failed corpus decode, since any
//! skip-and-resample policy belongs to the dataset loader composing it.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for PixMix operations
#[derive(Error, Debug)]
pub enum PixMixError {
    /// Invalid pipeline configuration (empty operator list, bad beta,
    /// unreadable corpus path). Raised at construction.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The mixing corpus holds zero decodable images but a corpus draw
    /// is possible. Raised at construction to fail fast.
    #[error("Mixing corpus is empty: {0}")]
    CorpusEmpty(PathBuf),

    /// A corpus file could not be decoded
    #[error("Failed to decode image at '{0}': {1}")]
    Decode(PathBuf, String),

    /// An operator received a color mode it cannot process
    #[error("Unsupported image mode: {0}")]
    UnsupportedMode(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for PixMixError {
    fn from(err: image::ImageError) -> Self {
        PixMixError::Decode(PathBuf::new(), err.to_string())
    }
}

/// Convenience Result type for PixMix operations
pub type Result<T> = std::result::Result<T, PixMixError>;
