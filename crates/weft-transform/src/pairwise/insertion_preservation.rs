//! Insertion against preservation.
//!
//! The preservation's annotations are suspended over inserted content, so
//! concurrently inserted text never picks up an annotation it was not
//! written with.

use weft_core::{apply_boundary, ActiveAnnotations, Component, DocOp, DocOpBuilder};

use super::{finish, unexpected};
use crate::error::Result;
use crate::walk::{walk, PairRules, Side};

#[derive(Default)]
struct Rules {
    insertion: DocOpBuilder,
    preservation: DocOpBuilder,
    active: ActiveAnnotations,
}

impl PairRules for Rules {
    fn event(&mut self, side: Side, component: Component) -> Result<()> {
        match (side, component) {
            (Side::First, component) if component.is_insertion() => {
                self.preservation.set_annotations(&ActiveAnnotations::new());
                self.preservation.retain(component.output_len());
                self.insertion.push(component);
                Ok(())
            }
            (Side::Second, Component::AnnotationBoundary(boundary)) => {
                apply_boundary(&mut self.active, &boundary)?;
                Ok(())
            }
            (Side::First, component) => Err(unexpected("insertion", &component)),
            (Side::Second, component) => Err(unexpected("preservation", &component)),
        }
    }

    fn overlap(&mut self, first: Component, second: Component) -> Result<()> {
        let n = match first {
            Component::Retain(n) => n,
            other => return Err(unexpected("insertion", &other)),
        };
        match second {
            Component::Retain(_)
            | Component::ReplaceAttributes { .. }
            | Component::UpdateAttributes(_) => {
                self.insertion.retain(n);
                self.preservation.set_annotations(&self.active);
                self.preservation.push(second);
                Ok(())
            }
            other => Err(unexpected("preservation", &other)),
        }
    }
}

/// Transform an insertion against a concurrent preservation.
///
/// Returns `(insertion', preservation')`.
pub fn transform(insertion: &DocOp, preservation: &DocOp) -> Result<(DocOp, DocOp)> {
    let mut rules = Rules::default();
    walk(&mut rules, insertion, preservation)?;
    Ok((finish(rules.insertion), finish(rules.preservation)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{AnnotationBoundary, Attributes, AttributesUpdate};

    #[test]
    fn test_attribute_change_passes_through() {
        let insertion = DocOp::builder().retain(1).characters("X").retain(1).build();
        let preservation = DocOp::builder()
            .update_attributes(AttributesUpdate::new().with("a", None, Some("1")))
            .retain(1)
            .build();
        let (insertion2, preservation2) = transform(&insertion, &preservation).unwrap();
        assert_eq!(insertion2, insertion);
        assert_eq!(
            preservation2,
            DocOp::builder()
                .update_attributes(AttributesUpdate::new().with("a", None, Some("1")))
                .retain(2)
                .build()
        );
    }

    #[test]
    fn test_annotations_suspended_over_inserted_content() {
        let insertion = DocOp::builder().retain(1).characters("X").retain(1).build();
        let preservation = DocOp::builder()
            .annotation_boundary(AnnotationBoundary::new().change("bold", None, Some("t")))
            .retain(2)
            .annotation_boundary(AnnotationBoundary::new().end("bold"))
            .build();
        let (_, preservation2) = transform(&insertion, &preservation).unwrap();
        assert_eq!(
            preservation2,
            DocOp::builder()
                .annotation_boundary(AnnotationBoundary::new().change("bold", None, Some("t")))
                .retain(1)
                .annotation_boundary(AnnotationBoundary::new().end("bold"))
                .retain(1)
                .annotation_boundary(AnnotationBoundary::new().change("bold", None, Some("t")))
                .retain(1)
                .annotation_boundary(AnnotationBoundary::new().end("bold"))
                .build()
        );
    }

    #[test]
    fn test_rejects_insertion_in_preservation() {
        let insertion = DocOp::identity(1);
        let preservation = DocOp::builder()
            .retain(1)
            .element_start("p", Attributes::new())
            .element_end()
            .build();
        assert!(transform(&insertion, &preservation).is_err());
    }
}
