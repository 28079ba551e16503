//! Error types for the Weft facade.

use thiserror::Error;
use weft_core::{ApplyError, ComposeError, CoreError, ValidationError};
use weft_sync::{ChannelError, SyncError};
use weft_transform::TransformError;
use weft_wavelet::WaveletError;

/// Errors from any Weft component.
#[derive(Debug, Error)]
pub enum WeftError {
    /// Encoding error.
    #[error("encoding error: {0}")]
    Core(#[from] CoreError),

    /// Structurally invalid operation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation does not match the document.
    #[error("apply error: {0}")]
    Apply(#[from] ApplyError),

    /// Operations do not compose.
    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),

    /// Transform error.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Wavelet-level error.
    #[error("wavelet error: {0}")]
    Wavelet(#[from] WaveletError),

    /// Sync error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Channel error.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Result type for Weft operations.
pub type Result<T> = std::result::Result<T, WeftError>;
