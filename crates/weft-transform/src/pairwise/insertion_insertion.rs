//! Insertion against insertion.

use weft_core::{Component, DocOp, DocOpBuilder};

use super::{finish, unexpected};
use crate::error::Result;
use crate::walk::{walk, PairRules, Side};

#[derive(Default)]
struct Rules {
    first: DocOpBuilder,
    second: DocOpBuilder,
}

impl PairRules for Rules {
    fn event(&mut self, side: Side, component: Component) -> Result<()> {
        if !component.is_insertion() {
            return Err(unexpected("insertion", &component));
        }
        let len = component.output_len();
        let (own, other) = match side {
            Side::First => (&mut self.first, &mut self.second),
            Side::Second => (&mut self.second, &mut self.first),
        };
        own.push(component);
        other.retain(len);
        Ok(())
    }

    fn overlap(&mut self, first: Component, second: Component) -> Result<()> {
        match (&first, &second) {
            (Component::Retain(n), Component::Retain(_)) => {
                self.first.retain(*n);
                self.second.retain(*n);
                Ok(())
            }
            (Component::Retain(_), other) | (other, _) => Err(unexpected("insertion", other)),
        }
    }
}

/// Transform two concurrent insertions. At the same position `first`'s
/// content ends up before `second`'s.
pub fn transform(first: &DocOp, second: &DocOp) -> Result<(DocOp, DocOp)> {
    let mut rules = Rules::default();
    walk(&mut rules, first, second)?;
    Ok((finish(rules.first), finish(rules.second)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::Attributes;

    #[test]
    fn test_both_insertions_kept() {
        let client = DocOp::builder().retain(1).characters("X").retain(1).build();
        let server = DocOp::builder().retain(2).characters("Y").build();
        let (client2, server2) = transform(&client, &server).unwrap();
        assert_eq!(
            client2,
            DocOp::builder().retain(1).characters("X").retain(2).build()
        );
        assert_eq!(
            server2,
            DocOp::builder().retain(3).characters("Y").build()
        );
    }

    #[test]
    fn test_tie_puts_first_operand_first() {
        let client = DocOp::builder().retain(1).characters("X").build();
        let server = DocOp::builder()
            .retain(1)
            .element_start("p", Attributes::new())
            .element_end()
            .build();
        let (client2, server2) = transform(&client, &server).unwrap();
        assert_eq!(
            client2,
            DocOp::builder().retain(1).characters("X").retain(2).build()
        );
        assert_eq!(
            server2,
            DocOp::builder()
                .retain(2)
                .element_start("p", Attributes::new())
                .element_end()
                .build()
        );
    }

    #[test]
    fn test_rejects_deletion() {
        let client = DocOp::builder().delete_characters("a").build();
        let server = DocOp::identity(1);
        assert!(transform(&client, &server).is_err());
    }
}
