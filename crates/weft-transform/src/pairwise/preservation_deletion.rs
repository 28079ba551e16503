//! Preservation against deletion.

use weft_core::{apply_boundary, ActiveAnnotations, Component, DocOp, DocOpBuilder};

use super::{finish, unexpected};
use crate::error::{Result, TransformError};
use crate::walk::{walk, PairRules, Side};

/// Output of [`transform`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreservationDeletion {
    /// The preservation restricted to content the deletion keeps; applies
    /// after the deletion.
    pub preservation: DocOp,
    /// Retains everything, carrying the preservation's annotation changes
    /// over exactly the content the deletion removes.
    pub residue: DocOp,
    /// The deletion, rewritten to expect attributes as the preservation
    /// left them; applies after the preservation.
    pub deletion: DocOp,
}

#[derive(Default)]
struct Rules {
    preservation: DocOpBuilder,
    residue: DocOpBuilder,
    deletion: DocOpBuilder,
    active: ActiveAnnotations,
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
        use Component::*;
        let n = second.input_len();
        if let Retain(_) = second {
            match first {
                Retain(_) | ReplaceAttributes { .. } | UpdateAttributes(_) => {
                    self.preservation.set_annotations(&self.active).push(first);
                    self.residue
                        .set_annotations(&ActiveAnnotations::new())
                        .retain(n);
                    self.deletion.retain(n);
                    return Ok(());
                }
                other => return Err(unexpected("preservation", &other)),
            }
        }

        let deleted = match (first, second) {
            (Retain(_), deleted) => deleted,
            (ReplaceAttributes { new, .. }, DeleteElementStart { tag, .. }) => {
                DeleteElementStart {
                    tag,
                    attributes: new,
                }
            }
            (UpdateAttributes(update), DeleteElementStart { tag, attributes }) => {
                DeleteElementStart {
                    tag,
                    attributes: attributes.updated(&update),
                }
            }
            (change @ (ReplaceAttributes { .. } | UpdateAttributes(_)), deleted) => {
                return Err(TransformError::Incompatible(format!(
                    "{:?} changes attributes of {:?}",
                    change, deleted
                )))
            }
            (other, _) => return Err(unexpected("preservation", &other)),
        };
        if !deleted.is_deletion() {
            return Err(unexpected("deletion", &deleted));
        }
        self.residue.set_annotations(&self.active).retain(n);
        self.deletion.push(deleted);
        Ok(())
    }
}

/// Transform a preservation against a concurrent deletion.
pub fn transform(preservation: &DocOp, deletion: &DocOp) -> Result<PreservationDeletion> {
    let mut rules = Rules::default();
    walk(&mut rules, preservation, deletion)?;
    Ok(PreservationDeletion {
        preservation: finish(rules.preservation),
        residue: finish(rules.residue),
        deletion: finish(rules.deletion),
    })
}
