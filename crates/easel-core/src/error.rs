//! Error types for Easel

use thiserror::Error;

/// Result type alias using Easel's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while drawing or exporting
#[derive(Error, Debug)]
pub enum Error {
    /// Export failed
    #[error("Export failed: {0}")]
    Export(String),

    /// The output path names a format Easel cannot write
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image encoding/decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}
