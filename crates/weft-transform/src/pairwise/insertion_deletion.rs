//! Insertion against deletion.

use weft_core::{Component, DocOp, DocOpBuilder};

use super::{finish, unexpected};
use crate::error::Result;
use crate::walk::{walk, PairRules, Side};

#[derive(Default)]
struct Rules {
    insertion: DocOpBuilder,
    deletion: DocOpBuilder,
    /// Deleted elements enclosing the current position.
    depth: usize,
}

impl PairRules for Rules {
    fn event(&mut self, side: Side, component: Component) -> Result<()> {
        match side {
            Side::First if component.is_insertion() => {
                if self.depth > 0 {
                    // Inserted into an element the other side removes.
                    self.deletion.push(component.inverted());
                } else {
                    self.deletion.retain(component.output_len());
                    self.insertion.push(component);
                }
                Ok(())
            }
            Side::First => Err(unexpected("insertion", &component)),
            Side::Second => Err(unexpected("deletion", &component)),
        }
    }

    fn overlap(&mut self, first: Component, second: Component) -> Result<()> {
        let n = match first {
            Component::Retain(n) => n,
            other => return Err(unexpected("insertion", &other)),
        };
        match second {
            Component::Retain(_) => {
                self.insertion.retain(n);
                self.deletion.retain(n);
            }
            Component::DeleteElementStart { .. } => {
                self.depth += 1;
                self.deletion.push(second);
            }
            Component::DeleteElementEnd => {
                self.depth = self.depth.saturating_sub(1);
                self.deletion.push(second);
            }
            Component::DeleteCharacters(_) => {
                self.deletion.push(second);
            }
            other => return Err(unexpected("deletion", &other)),
        }
        Ok(())
    }
}

/// Transform an insertion against a concurrent deletion.
///
/// Returns `(insertion', deletion')`. Content inserted inside an element
/// the deletion removes is removed along with it.
pub fn transform(insertion: &DocOp, deletion: &DocOp) -> Result<(DocOp, DocOp)> {
    let mut rules = Rules::default();
    walk(&mut rules, insertion, deletion)?;
    Ok((finish(rules.insertion), finish(rules.deletion)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{Attributes, Document};

    #[test]
    fn test_insert_next_to_deletion() {
        // <body>ab</body>: insert X after a, delete b.
        let insertion = DocOp::builder().retain(2).characters("X").retain(2).build();
        let deletion = DocOp::builder()
            .retain(2)
            .delete_characters("b")
            .retain(1)
            .build();
        let (insertion2, deletion2) = transform(&insertion, &deletion).unwrap();
        assert_eq!(
            insertion2,
            DocOp::builder().retain(2).characters("X").retain(1).build()
        );
        assert_eq!(
            deletion2,
            DocOp::builder()
                .retain(3)
                .delete_characters("b")
                .retain(1)
                .build()
        );
    }

    #[test]
    fn test_insert_inside_deleted_element_is_removed() {
        let doc = Document::from_op(
            &DocOp::builder()
                .element_start("p", Attributes::new())
                .characters("ab")
                .element_end()
                .build(),
        )
        .unwrap();
        let insertion = DocOp::builder().retain(2).characters("X").retain(2).build();
        let deletion = DocOp::builder()
            .delete_element_start("p", Attributes::new())
            .delete_characters("ab")
            .delete_element_end()
            .build();
        let (insertion2, deletion2) = transform(&insertion, &deletion).unwrap();
        assert_eq!(insertion2, DocOp::default());

        let a = doc.apply(&insertion).unwrap().apply(&deletion2).unwrap();
        let b = doc.apply(&deletion).unwrap().apply(&insertion2).unwrap();
        assert_eq!(a, b);
        assert!(a.is_empty());
    }
}
