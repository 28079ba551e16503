//! Error types for Weft Core.

use thiserror::Error;

/// Core errors that can occur while encoding operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("unsupported value in canonical encoding: {0}")]
    UnsupportedValue(&'static str),
}

/// Structural errors in a document operation, independent of any document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("empty component at index {0}")]
    EmptyComponent(usize),

    #[error("annotation key {0:?} ended but not active")]
    AnnotationNotActive(String),

    #[error("annotation key {0:?} both ended and changed by one boundary")]
    AnnotationKeyConflict(String),

    #[error("annotations left open at end of operation: {0:?}")]
    AnnotationsLeftOpen(Vec<String>),

    #[error("component {index} not allowed inside an inserted element")]
    InsideInsertion { index: usize },

    #[error("component {index} not allowed inside a deleted element")]
    InsideDeletion { index: usize },

    #[error("element end at {index} has no matching start")]
    UnmatchedEnd { index: usize },

    #[error("element left open at end of operation")]
    UnclosedElement,
}

/// Errors applying an operation to a concrete document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The operation itself is malformed.
    #[error("invalid operation: {0}")]
    Invalid(#[from] ValidationError),

    /// The operation walks past the end of the document.
    #[error("component {index} runs past the end of a document of {len} items")]
    PastEnd { index: usize, len: usize },

    /// The operation does not cover the whole document.
    #[error("operation covers {covered} of {len} items")]
    TooShort { covered: usize, len: usize },

    /// A deletion or attribute change disagrees with the document content.
    #[error("component {index} does not match document at item {position}: {reason}")]
    Mismatch {
        index: usize,
        position: usize,
        reason: String,
    },

    /// The resulting item sequence is not a well-nested tree.
    #[error("result is not well nested")]
    Unbalanced,
}

/// Errors composing two operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    /// The first operation's output length differs from the second's input.
    #[error("length mismatch: first produces {first} items, second consumes {second}")]
    LengthMismatch { first: usize, second: usize },

    /// Two overlapping items cannot be combined.
    #[error("incompatible components: {0}")]
    Incompatible(String),

    /// An annotation boundary is malformed.
    #[error("invalid annotation boundary: {0}")]
    Annotation(#[from] ValidationError),
}
