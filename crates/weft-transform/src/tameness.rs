//! Annotation tameness: whether leftover preservations can be dropped.
//!
//! A preservation is tame by a deletion if it changes no attributes and
//! every item it annotates is deleted. Such a preservation has no visible
//! effect once the deletion is applied.

use weft_core::{apply_boundary, ActiveAnnotations, Component, DocOp};

use crate::error::Result;
use crate::pairwise::unexpected;
use crate::walk::{walk, PairRules, Side};

struct Rules {
    active: ActiveAnnotations,
    tame: bool,
}

impl PairRules for Rules {
    fn event(&mut self, side: Side, component: Component) -> Result<()> {
        match (side, component) {
            (Side::First, Component::AnnotationBoundary(boundary)) => {
                apply_boundary(&mut self.active, &boundary)?;
                Ok(())
            }
            (Side::First, component) => Err(unexpected("preservation", &component)),
            (Side::Second, component) => Err(unexpected("deletion", &component)),
        }
    }

    fn overlap(&mut self, first: Component, second: Component) -> Result<()> {
        match first {
            Component::ReplaceAttributes { .. } | Component::UpdateAttributes(_) => {
                self.tame = false
            }
            Component::Retain(_) => {
                if !self.active.is_empty() && matches!(second, Component::Retain(_)) {
                    self.tame = false;
                }
            }
            other => return Err(unexpected("preservation", &other)),
        }
        Ok(())
    }
}

/// Whether `preservation` is tame by `deletion`.
pub fn is_tame(preservation: &DocOp, deletion: &DocOp) -> Result<bool> {
    let mut rules = Rules {
        active: ActiveAnnotations::new(),
        tame: true,
    };
    walk(&mut rules, preservation, deletion)?;
    Ok(rules.tame)
}

/// Whether both preservations are tame by both deletions.
pub fn check_tameness(
    client_preservation: &DocOp,
    server_preservation: &DocOp,
    client_deletion: &DocOp,
    server_deletion: &DocOp,
) -> Result<bool> {
    for preservation in [client_preservation, server_preservation] {
        for deletion in [client_deletion, server_deletion] {
            if !is_tame(preservation, deletion)? {
                return Ok(false);
            }
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{AnnotationBoundary, AttributesUpdate};

    fn annotate_second() -> DocOp {
        DocOp::builder()
            .retain(1)
            .annotation_boundary(AnnotationBoundary::new().change("s", None, Some("1")))
            .retain(1)
            .annotation_boundary(AnnotationBoundary::new().end("s"))
            .retain(1)
            .build()
    }

    #[test]
    fn test_annotation_over_deleted_item_is_tame() {
        let deletion = DocOp::builder()
            .retain(1)
            .delete_characters("b")
            .retain(1)
            .build();
        assert!(is_tame(&annotate_second(), &deletion).unwrap());
    }

    #[test]
    fn test_annotation_over_kept_item_is_not_tame() {
        assert!(!is_tame(&annotate_second(), &DocOp::identity(3)).unwrap());
    }

    #[test]
    fn test_attribute_change_is_never_tame() {
        let preservation = DocOp::builder()
            .update_attributes(AttributesUpdate::new().with("k", None, Some("v")))
            .build();
        let deletion = DocOp::identity(1);
        assert!(!is_tame(&preservation, &deletion).unwrap());
    }

    #[test]
    fn test_check_requires_all_pairings() {
        let identity = DocOp::identity(3);
        let deletion = DocOp::builder()
            .retain(1)
            .delete_characters("b")
            .retain(1)
            .build();
        assert!(check_tameness(&identity, &identity, &deletion, &deletion).unwrap());
        assert!(
            !check_tameness(&annotate_second(), &identity, &deletion, &identity).unwrap()
        );
    }
}
