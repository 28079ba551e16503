//! The six pairwise transformers over decomposed operations.
//!
//! Each transformer takes two operations of one kind (insertion,
//! preservation or deletion) over the same document and returns the
//! rewritten pair: every output applies after the other input.

pub mod deletion_deletion;
pub mod insertion_deletion;
pub mod insertion_insertion;
pub mod insertion_preservation;
pub mod preservation_deletion;
pub mod preservation_preservation;

use weft_core::{ActiveAnnotations, Component, DocOp, DocOpBuilder};

use crate::error::TransformError;

/// Close any annotations left open and build.
pub(crate) fn finish(mut builder: DocOpBuilder) -> DocOp {
    builder.set_annotations(&ActiveAnnotations::new());
    builder.build()
}

pub(crate) fn unexpected(kind: &str, component: &Component) -> TransformError {
    TransformError::UnexpectedComponent(format!("{:?} in {} operation", component, kind))
}
