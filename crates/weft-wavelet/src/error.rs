//! Error types for wavelet state and aggregate operations.

use thiserror::Error;

use weft_core::{ApplyError, ComposeError, CoreError, DocumentId, ParticipantId};
use weft_transform::TransformError;

/// Errors that can occur while applying, composing or transforming
/// wavelet operations.
#[derive(Debug, Error)]
pub enum WaveletError {
    /// A document operation does not apply to its document.
    #[error("document {document} rejected operation: {source}")]
    Apply {
        document: DocumentId,
        #[source]
        source: ApplyError,
    },

    /// Adding a participant that is already present.
    #[error("participant already present: {0}")]
    ParticipantPresent(ParticipantId),

    /// Removing a participant that is not present.
    #[error("participant not present: {0}")]
    ParticipantAbsent(ParticipantId),

    /// Applying the operation would overflow the version number.
    #[error("version {version} cannot advance by {increment}")]
    VersionOverflow { version: u64, increment: u64 },

    /// Transforming document operations failed.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Composing document operations failed.
    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),

    /// Canonical encoding for the version hash failed.
    #[error("encoding error: {0}")]
    Encoding(#[from] CoreError),
}

/// Result type for wavelet operations.
pub type Result<T> = std::result::Result<T, WaveletError>;
