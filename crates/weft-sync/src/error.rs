//! Error types for the channel layer.

use thiserror::Error;

use weft_core::WaveletId;
use weft_transform::TransformError;
use weft_wavelet::WaveletError;

/// Errors from an operation channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The transport refused the operation.
    #[error("channel broken: {0}")]
    Broken(String),

    /// The channel has been closed.
    #[error("channel closed")]
    Closed,

    /// Transforming queued operations against a sent one failed.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),
}

/// Errors that can occur while driving wavelets over channels.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The wavelet has failed and accepts no further mutation.
    #[error("wavelet failed: {0}")]
    WaveletFailed(WaveletId),

    /// Channel error.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// A wavelet with this id is already registered.
    #[error("wavelet already registered: {0}")]
    AlreadyRegistered(WaveletId),

    /// The wavelet is already bound to a channel.
    #[error("wavelet already bound: {0}")]
    AlreadyBound(WaveletId),

    /// A proxy sink's target can be set once.
    #[error("proxy sink target already set")]
    TargetAlreadySet,

    /// No wavelet with this id is registered.
    #[error("unknown wavelet: {0}")]
    UnknownWavelet(WaveletId),

    /// Applying or building an operation failed.
    #[error("wavelet error: {0}")]
    Wavelet(#[from] WaveletError),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
