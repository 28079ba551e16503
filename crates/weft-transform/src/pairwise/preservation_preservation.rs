//! Preservation against preservation.
//!
//! The first operand is the client's and wins every conflict: a replace
//! beats an update, and for an attribute or annotation key both sides
//! change, the client's new value is the one that survives.

use weft_core::{apply_boundary, ActiveAnnotations, Component, DocOp, DocOpBuilder, ValueChange};

use super::{finish, unexpected};
use crate::error::Result;
use crate::walk::{walk, PairRules, Side};

#[derive(Default)]
struct Rules {
    client: DocOpBuilder,
    server: DocOpBuilder,
    client_active: ActiveAnnotations,
    server_active: ActiveAnnotations,
}

impl Rules {
    /// Annotations for the client output: keys the server also changes
    /// start from the server's new value.
    fn client_desired(&self) -> ActiveAnnotations {
        self.client_active
            .iter()
            .map(|(key, change)| {
                let change = match self.server_active.get(key) {
                    Some(server) => ValueChange {
                        old: server.new.clone(),
                        new: change.new.clone(),
                    },
                    None => change.clone(),
                };
                (key.clone(), change)
            })
            .collect()
    }

    /// Annotations for the server output: keys the client changes are
    /// dropped.
    fn server_desired(&self) -> ActiveAnnotations {
        self.server_active
            .iter()
            .filter(|(key, _)| !self.client_active.contains_key(*key))
            .map(|(key, change)| (key.clone(), change.clone()))
            .collect()
    }

    fn emit(&mut self, client: Component, server: Component) {
        let client_desired = self.client_desired();
        let server_desired = self.server_desired();
        self.client.set_annotations(&client_desired).push(client);
        self.server.set_annotations(&server_desired).push(server);
    }
}

impl PairRules for Rules {
    fn event(&mut self, side: Side, component: Component) -> Result<()> {
        match (side, component) {
            (Side::First, Component::AnnotationBoundary(boundary)) => {
                apply_boundary(&mut self.client_active, &boundary)?;
                Ok(())
            }
            (Side::Second, Component::AnnotationBoundary(boundary)) => {
                apply_boundary(&mut self.server_active, &boundary)?;
                Ok(())
            }
            (_, component) => Err(unexpected("preservation", &component)),
        }
    }

    fn overlap(&mut self, first: Component, second: Component) -> Result<()> {
        use Component::*;
        let (client, server) = match (first, second) {
            (Retain(n), Retain(_)) => (Retain(n), Retain(n)),
            (Retain(_), server @ (ReplaceAttributes { .. } | UpdateAttributes(_))) => {
                (Retain(1), server)
            }
            (client @ (ReplaceAttributes { .. } | UpdateAttributes(_)), Retain(_)) => {
                (client, Retain(1))
            }
            (ReplaceAttributes { new, .. }, ReplaceAttributes { new: server_new, .. }) => (
                ReplaceAttributes {
                    old: server_new,
                    new,
                },
                Retain(1),
            ),
            (ReplaceAttributes { old, new }, UpdateAttributes(update)) => (
                ReplaceAttributes {
                    old: old.updated(&update),
                    new,
                },
                Retain(1),
            ),
            (UpdateAttributes(update), ReplaceAttributes { old, new }) => (
                Retain(1),
                ReplaceAttributes {
                    old: old.updated(&update),
                    new,
                },
            ),
            (UpdateAttributes(client), UpdateAttributes(server)) => (
                UpdateAttributes(client.rebase_onto(&server)),
                UpdateAttributes(server.without_keys_of(&client)),
            ),
            (Retain(_), other) | (other, _) => return Err(unexpected("preservation", &other)),
        };
        self.emit(client, server);
        Ok(())
    }
}

/// Transform two concurrent preservations, the client's first.
///
/// Returns `(client', server')`.
pub fn transform(client: &DocOp, server: &DocOp) -> Result<(DocOp, DocOp)> {
    let mut rules = Rules::default();
    walk(&mut rules, client, server)?;
    Ok((finish(rules.client), finish(rules.server)))
}
