//! Operation inversion.

use crate::docop::{Component, DocOp};

/// The operation that undoes `op`.
///
/// Insertions become deletions and vice versa, replaced attributes swap old
/// and new, updates and annotation changes are reversed.
pub fn invert(op: &DocOp) -> DocOp {
    DocOp::from_components(op.components().iter().map(Component::inverted).collect())
}
