//! Structural validation of document operations.
//!
//! Validation is independent of any document: it checks that an operation
//! is a well-nested traversal. Whether it fits a particular document is
//! checked by [`crate::document::Document::apply`].

use crate::annotations::{apply_boundary, ActiveAnnotations};
use crate::docop::{Component, DocOp};
use crate::error::ValidationError;

/// Check that `op` is well formed.
///
/// This performs:
/// - Empty component check
/// - Element nesting (no retain, deletion or attribute change inside an
///   inserted element, no insertion, retain or attribute change inside a
///   deleted element, every end matched)
/// - Annotation keys ended only while active, all ended at the end
pub fn validate(op: &DocOp) -> Result<(), ValidationError> {
    let mut inserting = 0usize;
    let mut deleting = 0usize;
    let mut active = ActiveAnnotations::new();

    for (index, component) in op.components().iter().enumerate() {
        // 1. No empty components
        if component.is_empty() {
            return Err(ValidationError::EmptyComponent(index));
        }

        // 2. Nesting
        let inside_insertion = Err(ValidationError::InsideInsertion { index });
        let inside_deletion = Err(ValidationError::InsideDeletion { index });
        match component {
            Component::Retain(_)
            | Component::ReplaceAttributes { .. }
            | Component::UpdateAttributes(_) => {
                if inserting > 0 {
                    return inside_insertion;
                }
                if deleting > 0 {
                    return inside_deletion;
                }
            }
            Component::Characters(_) => {
                if deleting > 0 {
                    return inside_deletion;
                }
            }
            Component::ElementStart { .. } => {
                if deleting > 0 {
                    return inside_deletion;
                }
                inserting += 1;
            }
            Component::ElementEnd => {
                if deleting > 0 {
                    return inside_deletion;
                }
                if inserting == 0 {
                    return Err(ValidationError::UnmatchedEnd { index });
                }
                inserting -= 1;
            }
            Component::DeleteCharacters(_) => {
                if inserting > 0 {
                    return inside_insertion;
                }
            }
            Component::DeleteElementStart { .. } => {
                if inserting > 0 {
                    return inside_insertion;
                }
                deleting += 1;
            }
            Component::DeleteElementEnd => {
                if inserting > 0 {
                    return inside_insertion;
                }
                if deleting == 0 {
                    return Err(ValidationError::UnmatchedEnd { index });
                }
                deleting -= 1;
            }
            // 3. Annotations
            Component::AnnotationBoundary(boundary) => apply_boundary(&mut active, boundary)?,
        }
    }

    if inserting > 0 || deleting > 0 {
        return Err(ValidationError::UnclosedElement);
    }
    if !active.is_empty() {
        return Err(ValidationError::AnnotationsLeftOpen(
            active.into_keys().collect(),
        ));
    }
    Ok(())
}
