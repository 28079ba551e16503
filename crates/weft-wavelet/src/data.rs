//! The state of one wavelet: participants, documents and version.

use std::collections::BTreeMap;

use weft_core::{Document, DocumentId, HashedVersion, ParticipantId, WaveletId};

use crate::error::{Result, WaveletError};
use crate::operation::{WaveletOperation, WaveletOperationKind};

/// Participants, documents and the hashed version of one wavelet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveletData {
    id: WaveletId,
    /// Insertion-ordered, unique.
    participants: Vec<ParticipantId>,
    documents: BTreeMap<DocumentId, Document>,
    version: HashedVersion,
    last_modified: i64,
}

impl WaveletData {
    /// An empty wavelet at version zero.
    pub fn new(id: WaveletId) -> Self {
        Self {
            id,
            participants: Vec::new(),
            documents: BTreeMap::new(),
            version: HashedVersion::ZERO,
            last_modified: 0,
        }
    }

    pub fn id(&self) -> &WaveletId {
        &self.id
    }

    pub fn participants(&self) -> &[ParticipantId] {
        &self.participants
    }

    pub fn is_participant(&self, participant: &ParticipantId) -> bool {
        self.participants.contains(participant)
    }

    /// The document with `id`. Documents never edited are absent.
    pub fn document(&self, id: &DocumentId) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn document_ids(&self) -> impl Iterator<Item = &DocumentId> {
        self.documents.keys()
    }

    pub fn version(&self) -> u64 {
        self.version.version
    }

    pub fn hashed_version(&self) -> HashedVersion {
        self.version
    }

    /// Timestamp of the last applied operation.
    pub fn last_modified(&self) -> i64 {
        self.last_modified
    }

    /// Apply `op`, advancing the version.
    ///
    /// Either the whole operation applies or the state is unchanged.
    pub fn apply(&mut self, op: &WaveletOperation) -> Result<()> {
        let next_version = match op.context.hashed_version {
            Some(stamped) => stamped,
            None => self
                .version
                .next(op.context.version_increment, &op.canonical_bytes()?)
                .ok_or(WaveletError::VersionOverflow {
                    version: self.version.version,
                    increment: op.context.version_increment,
                })?,
        };

        match &op.kind {
            WaveletOperationKind::AddParticipant(p) => {
                if self.is_participant(p) {
                    return Err(WaveletError::ParticipantPresent(p.clone()));
                }
                self.participants.push(p.clone());
            }
            WaveletOperationKind::RemoveParticipant(p) => {
                let index = self
                    .participants
                    .iter()
                    .position(|q| q == p)
                    .ok_or_else(|| WaveletError::ParticipantAbsent(p.clone()))?;
                self.participants.remove(index);
            }
            WaveletOperationKind::Document { document_id, op: doc_op } => {
                let current = self.documents.get(document_id).cloned().unwrap_or_default();
                let next = current
                    .apply(doc_op)
                    .map_err(|source| WaveletError::Apply {
                        document: document_id.clone(),
                        source,
                    })?;
                self.documents.insert(document_id.clone(), next);
            }
            WaveletOperationKind::NoOp | WaveletOperationKind::VersionUpdate => {}
        }

        self.version = next_version;
        self.last_modified = op.context.timestamp;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::WaveletOperationContext;
    use weft_core::{Attributes, DocOp};

    fn context() -> WaveletOperationContext {
        WaveletOperationContext::new("alice@example.com".into()).with_timestamp(42)
    }

    fn body() -> DocOp {
        DocOp::builder()
            .element_start("body", Attributes::new())
            .characters("hi")
            .element_end()
            .build()
    }

    #[test]
    fn test_participants_add_and_remove() {
        let mut data = WaveletData::new("w+1".into());
        let bob = ParticipantId::from("bob@example.com");
        data.apply(&WaveletOperation::add_participant(context(), bob.clone()))
            .unwrap();
        assert_eq!(data.participants(), &[bob.clone()]);
        assert!(matches!(
            data.apply(&WaveletOperation::add_participant(context(), bob.clone())),
            Err(WaveletError::ParticipantPresent(_))
        ));
        data.apply(&WaveletOperation::remove_participant(context(), bob.clone()))
            .unwrap();
        assert!(data.participants().is_empty());
        assert!(matches!(
            data.apply(&WaveletOperation::remove_participant(context(), bob)),
            Err(WaveletError::ParticipantAbsent(_))
        ));
    }

    #[test]
    fn test_document_edit_advances_version() {
        let mut data = WaveletData::new("w+1".into());
        let id = DocumentId::from("b+1");
        data.apply(&WaveletOperation::document(context(), id.clone(), body()))
            .unwrap();
        assert_eq!(data.document(&id).map(|d| d.to_xml()).as_deref(), Some("<body>hi</body>"));
        assert_eq!(data.version(), 1);
        assert_eq!(data.last_modified(), 42);
        assert_ne!(data.hashed_version().hash, [0u8; 32]);
    }

    #[test]
    fn test_failed_apply_leaves_state_unchanged() {
        let mut data = WaveletData::new("w+1".into());
        let id = DocumentId::from("b+1");
        data.apply(&WaveletOperation::document(context(), id.clone(), body()))
            .unwrap();
        let before = data.clone();
        let bad = WaveletOperation::document(context(), id, DocOp::identity(7));
        assert!(matches!(data.apply(&bad), Err(WaveletError::Apply { .. })));
        assert_eq!(data, before);
    }

    #[test]
    fn test_version_hash_chains() {
        let ops = [
            WaveletOperation::add_participant(context(), "bob@example.com".into()),
            WaveletOperation::document(context(), "b+1".into(), body()),
        ];
        let mut a = WaveletData::new("w+1".into());
        let mut b = WaveletData::new("w+1".into());
        for op in &ops {
            a.apply(op).unwrap();
            b.apply(op).unwrap();
        }
        assert_eq!(a.hashed_version(), b.hashed_version());

        let mut reversed = WaveletData::new("w+1".into());
        reversed.apply(&ops[1]).unwrap();
        reversed.apply(&ops[0]).unwrap();
        assert_eq!(reversed.version(), 2);
        assert_ne!(reversed.hashed_version(), a.hashed_version());
    }

    #[test]
    fn test_stamped_version_is_taken_verbatim() {
        let mut data = WaveletData::new("w+1".into());
        let stamped = HashedVersion {
            version: 10,
            hash: [7; 32],
        };
        data.apply(&WaveletOperation::version_update(
            context().with_hashed_version(Some(stamped)),
        ))
        .unwrap();
        assert_eq!(data.hashed_version(), stamped);
    }

    #[test]
    fn test_version_overflow_is_rejected() {
        let mut data = WaveletData::new("w+1".into());
        data.apply(&WaveletOperation::add_participant(context(), "bob@example.com".into()))
            .unwrap();
        let before = data.clone();
        let huge = WaveletOperation::add_participant(
            context().with_version_increment(u64::MAX),
            "carol@example.com".into(),
        );
        assert!(matches!(
            data.apply(&huge),
            Err(WaveletError::VersionOverflow { version: 1, increment: u64::MAX })
        ));
        assert_eq!(data, before);
    }
}
