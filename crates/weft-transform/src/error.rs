//! Error types for the transform engine.

use thiserror::Error;

use weft_core::{ComposeError, ValidationError};

/// Errors that can occur while transforming concurrent operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// The second operand ended while the first still covered more items.
    #[error("second operation ran out with {pending} items of the first unresolved")]
    RanOut { pending: i64 },

    /// The operands cover documents of different lengths.
    #[error("operations cover documents of different lengths: {first} and {second}")]
    LengthMismatch { first: usize, second: usize },

    /// Two overlapping components cannot both have happened.
    #[error("incompatible components: {0}")]
    Incompatible(String),

    /// A component that does not belong in this kind of operation.
    #[error("unexpected component: {0}")]
    UnexpectedComponent(String),

    /// The annotation tameness loop did not settle.
    #[error("no fixed point after {iterations} tameness iterations")]
    NoFixedPoint { iterations: usize },

    /// Composing the transformed parts failed.
    #[error("compose error: {0}")]
    Compose(#[from] ComposeError),

    /// An annotation boundary in an operand is malformed.
    #[error("invalid annotation boundary: {0}")]
    Annotation(#[from] ValidationError),
}

/// Result type for transform operations.
pub type Result<T> = std::result::Result<T, TransformError>;
