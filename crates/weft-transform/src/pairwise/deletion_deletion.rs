//! Deletion against deletion.

use weft_core::{Component, DocOp, DocOpBuilder};

use super::{finish, unexpected};
use crate::error::{Result, TransformError};
use crate::walk::{walk, PairRules, Side};

#[derive(Default)]
struct Rules {
    client: DocOpBuilder,
    server: DocOpBuilder,
}

fn same_kind(a: &Component, b: &Component) -> bool {
    matches!(
        (a, b),
        (Component::DeleteCharacters(_), Component::DeleteCharacters(_))
            | (
                Component::DeleteElementStart { .. },
                Component::DeleteElementStart { .. }
            )
            | (Component::DeleteElementEnd, Component::DeleteElementEnd)
    )
}

impl PairRules for Rules {
    fn event(&mut self, _side: Side, component: Component) -> Result<()> {
        Err(unexpected("deletion", &component))
    }

    fn overlap(&mut self, first: Component, second: Component) -> Result<()> {
        match (first, second) {
            (Component::Retain(n), Component::Retain(_)) => {
                self.client.retain(n);
                self.server.retain(n);
            }
            (Component::Retain(_), deleted) if deleted.is_deletion() => {
                self.server.push(deleted);
            }
            (deleted, Component::Retain(_)) if deleted.is_deletion() => {
                self.client.push(deleted);
            }
            (a, b) if same_kind(&a, &b) => {}
            (a, b) if a.is_deletion() && b.is_deletion() => {
                return Err(TransformError::Incompatible(format!(
                    "{:?} and {:?} delete the same item",
                    a, b
                )))
            }
            (a, b) => {
                let odd = if a.is_deletion() { b } else { a };
                return Err(unexpected("deletion", &odd));
            }
        }
        Ok(())
    }
}

/// Transform two concurrent deletions. Content both remove is removed once.
///
/// Returns `(client', server')`.
pub fn transform(client: &DocOp, server: &DocOp) -> Result<(DocOp, DocOp)> {
    let mut rules = Rules::default();
    walk(&mut rules, client, server)?;
    Ok((finish(rules.client), finish(rules.server)))
}
