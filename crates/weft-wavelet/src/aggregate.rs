//! Aggregate operations: a whole-wavelet edit in canonical form.
//!
//! An aggregate holds the participants a batch removes, the participants
//! it adds and the document operations it makes, per document. Both
//! participant lists are sorted by address and the document entries by id,
//! so compose and transform are merge passes over sorted lists.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use weft_core::{compose_all, invert, DocOp, DocumentId, ParticipantId};
use weft_transform::Transformer;

use crate::error::Result;
use crate::operation::{WaveletOperation, WaveletOperationContext, WaveletOperationKind};

/// The operations an aggregate makes on one document, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOperations {
    pub id: DocumentId,
    pub ops: Vec<DocOp>,
}

impl DocumentOperations {
    fn single(id: DocumentId, op: DocOp) -> Self {
        Self { id, ops: vec![op] }
    }

    /// All operations composed into one.
    pub fn composed(&self) -> Result<DocOp> {
        Ok(compose_all(&self.ops)?)
    }
}

/// A composable, transformable and invertible wavelet edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateOperation {
    to_remove: Vec<ParticipantId>,
    to_add: Vec<ParticipantId>,
    documents: Vec<DocumentOperations>,
}

impl AggregateOperation {
    /// The aggregate that does nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lift a single wavelet operation.
    ///
    /// No-ops and version updates lift to the empty aggregate.
    pub fn from_operation(op: &WaveletOperation) -> Self {
        match &op.kind {
            WaveletOperationKind::AddParticipant(p) => Self {
                to_add: vec![p.clone()],
                ..Self::default()
            },
            WaveletOperationKind::RemoveParticipant(p) => Self {
                to_remove: vec![p.clone()],
                ..Self::default()
            },
            WaveletOperationKind::Document { document_id, op } => Self {
                documents: vec![DocumentOperations::single(document_id.clone(), op.clone())],
                ..Self::default()
            },
            WaveletOperationKind::NoOp | WaveletOperationKind::VersionUpdate => Self::default(),
        }
    }

    pub fn participants_to_remove(&self) -> &[ParticipantId] {
        &self.to_remove
    }

    pub fn participants_to_add(&self) -> &[ParticipantId] {
        &self.to_add
    }

    pub fn documents(&self) -> &[DocumentOperations] {
        &self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty() && self.documents.is_empty()
    }

    /// Compose `ops` in order.
    ///
    /// Removing a participant the batch added cancels the addition, and
    /// adding one it removed cancels the removal. Document operations are
    /// concatenated per document; composing them is deferred until they
    /// are needed.
    pub fn compose<'a>(ops: impl IntoIterator<Item = &'a AggregateOperation>) -> Self {
        let mut to_remove = BTreeSet::new();
        let mut to_add = BTreeSet::new();
        let mut documents: BTreeMap<DocumentId, Vec<DocOp>> = BTreeMap::new();

        for op in ops {
            for p in &op.to_remove {
                if !to_add.remove(p) {
                    to_remove.insert(p.clone());
                }
            }
            for p in &op.to_add {
                if !to_remove.remove(p) {
                    to_add.insert(p.clone());
                }
            }
            for entry in &op.documents {
                documents
                    .entry(entry.id.clone())
                    .or_default()
                    .extend(entry.ops.iter().cloned());
            }
        }

        Self {
            to_remove: to_remove.into_iter().collect(),
            to_add: to_add.into_iter().collect(),
            documents: documents
                .into_iter()
                .map(|(id, ops)| DocumentOperations { id, ops })
                .collect(),
        }
    }

    /// Transform concurrent `client` and `server` aggregates.
    ///
    /// Participant changes both sides make are dropped from both outputs.
    /// Documents both sides edit have their composed operations
    /// transformed; the rest pass through.
    pub fn transform(
        client: &AggregateOperation,
        server: &AggregateOperation,
        transformer: &Transformer,
    ) -> Result<(AggregateOperation, AggregateOperation)> {
        let (client_remove, server_remove) = without_common(&client.to_remove, &server.to_remove);
        let (client_add, server_add) = without_common(&client.to_add, &server.to_add);
        let (client_documents, server_documents) =
            transform_documents(&client.documents, &server.documents, transformer)?;
        Ok((
            Self {
                to_remove: client_remove,
                to_add: client_add,
                documents: client_documents,
            },
            Self {
                to_remove: server_remove,
                to_add: server_add,
                documents: server_documents,
            },
        ))
    }

    /// The aggregate that undoes this one.
    ///
    /// Each document's operations collapse into one inverted operation, so
    /// inverting twice gives an aggregate with the same effect and the same
    /// composed operation per document, not necessarily an equal one.
    pub fn invert(&self) -> Result<Self> {
        let documents = self
            .documents
            .iter()
            .map(|entry| {
                Ok(DocumentOperations::single(
                    entry.id.clone(),
                    invert(&entry.composed()?),
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            to_remove: self.to_add.clone(),
            to_add: self.to_remove.clone(),
            documents,
        })
    }

    /// Expand into wavelet operations, each stamped with `context`:
    /// removals first, then one composed operation per document, then
    /// additions.
    pub fn to_wavelet_operations(
        &self,
        context: &WaveletOperationContext,
    ) -> Result<Vec<WaveletOperation>> {
        let mut ops = Vec::with_capacity(
            self.to_remove.len() + self.documents.len() + self.to_add.len(),
        );
        for p in &self.to_remove {
            ops.push(WaveletOperation::remove_participant(context.clone(), p.clone()));
        }
        for entry in &self.documents {
            ops.push(WaveletOperation::document(
                context.clone(),
                entry.id.clone(),
                entry.composed()?,
            ));
        }
        for p in &self.to_add {
            ops.push(WaveletOperation::add_participant(context.clone(), p.clone()));
        }
        Ok(ops)
    }
}

/// Split two sorted lists into their non-shared parts.
fn without_common(
    client: &[ParticipantId],
    server: &[ParticipantId],
) -> (Vec<ParticipantId>, Vec<ParticipantId>) {
    let (mut client_only, mut server_only) = (Vec::new(), Vec::new());
    let (mut i, mut j) = (0, 0);
    while i < client.len() && j < server.len() {
        match client[i].cmp(&server[j]) {
            Ordering::Less => {
                client_only.push(client[i].clone());
                i += 1;
            }
            Ordering::Greater => {
                server_only.push(server[j].clone());
                j += 1;
            }
            Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    client_only.extend_from_slice(&client[i..]);
    server_only.extend_from_slice(&server[j..]);
    (client_only, server_only)
}

fn transform_documents(
    client: &[DocumentOperations],
    server: &[DocumentOperations],
    transformer: &Transformer,
) -> Result<(Vec<DocumentOperations>, Vec<DocumentOperations>)> {
    let (mut client_out, mut server_out) = (Vec::new(), Vec::new());
    let (mut i, mut j) = (0, 0);
    while i < client.len() && j < server.len() {
        match client[i].id.cmp(&server[j].id) {
            Ordering::Less => {
                client_out.push(client[i].clone());
                i += 1;
            }
            Ordering::Greater => {
                server_out.push(server[j].clone());
                j += 1;
            }
            Ordering::Equal => {
                let (c, s) =
                    transformer.transform(&client[i].composed()?, &server[j].composed()?)?;
                client_out.push(DocumentOperations::single(client[i].id.clone(), c));
                server_out.push(DocumentOperations::single(server[j].id.clone(), s));
                i += 1;
                j += 1;
            }
        }
    }
    client_out.extend_from_slice(&client[i..]);
    server_out.extend_from_slice(&server[j..]);
    Ok((client_out, server_out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{Attributes, Document};

    fn context() -> WaveletOperationContext {
        WaveletOperationContext::new("alice@example.com".into())
    }

    fn add(p: &str) -> AggregateOperation {
        AggregateOperation::from_operation(&WaveletOperation::add_participant(context(), p.into()))
    }

    fn remove(p: &str) -> AggregateOperation {
        AggregateOperation::from_operation(&WaveletOperation::remove_participant(
            context(),
            p.into(),
        ))
    }

    fn edit(id: &str, op: DocOp) -> AggregateOperation {
        AggregateOperation::from_operation(&WaveletOperation::document(context(), id.into(), op))
    }

    fn body(text: &str) -> Document {
        Document::from_op(
            &DocOp::builder()
                .element_start("body", Attributes::new())
                .characters(text)
                .element_end()
                .build(),
        )
        .unwrap()
    }

    #[test]
    fn test_compose_cancels_participant_changes() {
        assert!(AggregateOperation::compose(&[add("bob@x"), remove("bob@x")]).is_empty());
        assert!(AggregateOperation::compose(&[remove("bob@x"), add("bob@x")]).is_empty());

        let composed = AggregateOperation::compose(&[add("carol@x"), add("bob@x")]);
        let added: Vec<_> = composed.participants_to_add().iter().map(|p| p.address()).collect();
        assert_eq!(added, vec!["bob@x", "carol@x"]);
    }

    #[test]
    fn test_compose_concatenates_document_ops_in_order() {
        let first = DocOp::builder().retain(1).characters("a").retain(1).build();
        let second = DocOp::builder().retain(2).characters("b").retain(1).build();
        let composed = AggregateOperation::compose(&[
            edit("b+2", DocOp::identity(2)),
            edit("b+1", first.clone()),
            edit("b+1", second.clone()),
        ]);
        let ids: Vec<_> = composed.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b+1", "b+2"]);
        assert_eq!(composed.documents()[0].ops, vec![first, second]);
    }

    #[test]
    fn test_transform_drops_shared_participant_changes() {
        let client = AggregateOperation::compose(&[add("bob@x"), add("carol@x")]);
        let server = AggregateOperation::compose(&[add("bob@x"), remove("dave@x")]);
        let (c, s) =
            AggregateOperation::transform(&client, &server, &Transformer::default()).unwrap();
        assert_eq!(c.participants_to_add(), &[ParticipantId::from("carol@x")]);
        assert!(s.participants_to_add().is_empty());
        assert_eq!(s.participants_to_remove(), &[ParticipantId::from("dave@x")]);
    }

    #[test]
    fn test_transform_document_ops_converge() {
        let doc = body("ab");
        let client = edit("b+1", DocOp::builder().retain(2).characters("X").retain(2).build());
        let server = AggregateOperation::compose(&[
            edit("b+1", DocOp::builder().retain(2).delete_characters("b").retain(1).build()),
            edit("b+2", DocOp::builder().characters("z").build()),
        ]);
        let (c, s) =
            AggregateOperation::transform(&client, &server, &Transformer::default()).unwrap();
        assert_eq!(s.documents().len(), 2);

        let c_op = c.documents()[0].composed().unwrap();
        let s_op = s.documents()[0].composed().unwrap();
        let one = doc
            .apply(&client.documents()[0].composed().unwrap())
            .and_then(|d| d.apply(&s_op))
            .unwrap();
        let two = doc
            .apply(&server.documents()[0].composed().unwrap())
            .and_then(|d| d.apply(&c_op))
            .unwrap();
        assert_eq!(one, two);
        assert_eq!(one.to_xml(), "<body>aX</body>");
    }

    #[test]
    fn test_invert_undoes() {
        let doc = body("ab");
        let op = AggregateOperation::compose(&[
            add("bob@x"),
            edit("b+1", DocOp::builder().retain(1).characters("hi").retain(3).build()),
            edit("b+1", DocOp::builder().retain(3).delete_characters("a").retain(2).build()),
        ]);
        let inverse = op.invert().unwrap();
        assert_eq!(inverse.participants_to_remove(), &[ParticipantId::from("bob@x")]);

        let forward = op.documents()[0].composed().unwrap();
        let backward = inverse.documents()[0].composed().unwrap();
        let edited = doc.apply(&forward).unwrap();
        assert_eq!(edited.to_xml(), "<body>hib</body>");
        assert_eq!(edited.apply(&backward).unwrap(), doc);
    }

    #[test]
    fn test_to_wavelet_operations_order() {
        let op = AggregateOperation::compose(&[
            add("bob@x"),
            edit("b+1", DocOp::identity(2)),
            remove("carol@x"),
        ]);
        let kinds: Vec<_> = op
            .to_wavelet_operations(&context())
            .unwrap()
            .into_iter()
            .map(|op| op.kind)
            .collect();
        assert!(matches!(kinds[0], WaveletOperationKind::RemoveParticipant(_)));
        assert!(matches!(kinds[1], WaveletOperationKind::Document { .. }));
        assert!(matches!(kinds[2], WaveletOperationKind::AddParticipant(_)));
    }

    proptest::proptest! {
        #[test]
        fn test_add_then_remove_cancels(
            names in proptest::collection::btree_set("[a-f]{1,3}@x", 1..5),
        ) {
            let adds: Vec<_> = names.iter().map(|n| add(n)).collect();
            let removes: Vec<_> = names.iter().map(|n| remove(n)).collect();
            let composed = AggregateOperation::compose(adds.iter().chain(removes.iter()));
            proptest::prop_assert!(composed.is_empty());
        }

        #[test]
        fn test_participant_invert_round_trips(
            added in proptest::collection::btree_set("[a-c]@x", 0..3),
            removed in proptest::collection::btree_set("[d-f]@x", 0..3),
        ) {
            let parts: Vec<_> = added
                .iter()
                .map(|n| add(n))
                .chain(removed.iter().map(|n| remove(n)))
                .collect();
            let op = AggregateOperation::compose(&parts);
            proptest::prop_assert_eq!(op.invert().unwrap().invert().unwrap(), op);
        }
    }
}
