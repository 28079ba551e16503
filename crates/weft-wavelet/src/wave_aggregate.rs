//! Aggregate operations that remember who authored each part.

use weft_core::{HashedVersion, ParticipantId};
use weft_transform::Transformer;

use crate::aggregate::AggregateOperation;
use crate::error::Result;
use crate::operation::{now_millis, WaveletOperation, WaveletOperationContext};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CreatorOp {
    creator: ParticipantId,
    op: AggregateOperation,
}

/// A sequence of `(creator, aggregate)` pairs.
///
/// Composition only merges consecutive parts by the same creator, so the
/// authorship of every part survives compose, transform and invert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaveAggregateOp {
    pairs: Vec<CreatorOp>,
}

impl WaveAggregateOp {
    pub fn new(op: AggregateOperation, creator: ParticipantId) -> Self {
        Self {
            pairs: vec![CreatorOp { creator, op }],
        }
    }

    /// Lift a wavelet operation, keeping its creator.
    pub fn from_operation(op: &WaveletOperation) -> Self {
        Self::new(AggregateOperation::from_operation(op), op.creator().clone())
    }

    /// The creator of each part, in order.
    pub fn creators(&self) -> impl Iterator<Item = &ParticipantId> {
        self.pairs.iter().map(|pair| &pair.creator)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Compose `ops` in order, merging runs by the same creator.
    pub fn compose(ops: &[WaveAggregateOp]) -> Self {
        let mut pairs: Vec<CreatorOp> = Vec::new();
        let mut run: Vec<&AggregateOperation> = Vec::new();
        let mut run_creator: Option<&ParticipantId> = None;

        for pair in ops.iter().flat_map(|op| op.pairs.iter()) {
            if run_creator != Some(&pair.creator) {
                if let Some(creator) = run_creator {
                    pairs.push(CreatorOp {
                        creator: creator.clone(),
                        op: AggregateOperation::compose(run.drain(..)),
                    });
                }
                run_creator = Some(&pair.creator);
            }
            run.push(&pair.op);
        }
        if let Some(creator) = run_creator {
            pairs.push(CreatorOp {
                creator: creator.clone(),
                op: AggregateOperation::compose(run.drain(..)),
            });
        }
        Self { pairs }
    }

    /// Transform concurrent `client` and `server` sequences.
    ///
    /// Each server part is transformed against the whole client sequence,
    /// which is rewritten as it goes.
    pub fn transform(
        client: &WaveAggregateOp,
        server: &WaveAggregateOp,
        transformer: &Transformer,
    ) -> Result<(WaveAggregateOp, WaveAggregateOp)> {
        let mut client_stream = client.pairs.clone();
        let mut server_out = Vec::with_capacity(server.pairs.len());

        for pair in &server.pairs {
            let mut server_part = pair.clone();
            for client_part in client_stream.iter_mut() {
                let (c, s) =
                    AggregateOperation::transform(&client_part.op, &server_part.op, transformer)?;
                client_part.op = c;
                server_part.op = s;
            }
            server_out.push(server_part);
        }

        Ok((Self { pairs: client_stream }, Self { pairs: server_out }))
    }

    /// The sequence that undoes this one: every part inverted, in reverse.
    pub fn invert(&self) -> Result<Self> {
        let mut pairs = self
            .pairs
            .iter()
            .map(|pair| {
                Ok(CreatorOp {
                    creator: pair.creator.clone(),
                    op: pair.op.invert()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        pairs.reverse();
        Ok(Self { pairs })
    }

    /// Expand into wavelet operations that do not advance the version.
    pub fn to_wavelet_operations(&self) -> Result<Vec<WaveletOperation>> {
        self.to_wavelet_operations_with_versions(0, None)
    }

    /// Expand into wavelet operations, stamping the last one with
    /// `version_increment` and `hashed_version`. The others advance the
    /// version by zero.
    pub fn to_wavelet_operations_with_versions(
        &self,
        version_increment: u64,
        hashed_version: Option<HashedVersion>,
    ) -> Result<Vec<WaveletOperation>> {
        let timestamp = now_millis();
        let mut ops = Vec::new();
        for pair in &self.pairs {
            let context = WaveletOperationContext::new(pair.creator.clone())
                .with_timestamp(timestamp)
                .with_version_increment(0);
            ops.extend(pair.op.to_wavelet_operations(&context)?);
        }
        if let Some(last) = ops.last_mut() {
            last.context.version_increment = version_increment;
            last.context.hashed_version = hashed_version;
        }
        Ok(ops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::WaveletOperationKind;
    use weft_core::DocOp;

    fn by(creator: &str, kind: WaveletOperationKind) -> WaveAggregateOp {
        WaveAggregateOp::from_operation(&WaveletOperation::new(
            WaveletOperationContext::new(creator.into()),
            kind,
        ))
    }

    fn insert(at: usize, text: &str, after: usize) -> WaveletOperationKind {
        WaveletOperationKind::Document {
            document_id: "b+1".into(),
            op: DocOp::builder().retain(at).characters(text).retain(after).build(),
        }
    }

    #[test]
    fn test_compose_merges_runs_by_creator() {
        let composed = WaveAggregateOp::compose(&[
            by("alice@x", insert(0, "a", 2)),
            by("alice@x", insert(1, "b", 2)),
            by("bob@x", insert(0, "c", 4)),
            by("alice@x", insert(0, "d", 5)),
        ]);
        let creators: Vec<_> = composed.creators().map(|c| c.address()).collect();
        assert_eq!(creators, vec!["alice@x", "bob@x", "alice@x"]);
    }

    #[test]
    fn test_transform_keeps_creators() {
        let client = WaveAggregateOp::compose(&[
            by("alice@x", insert(1, "a", 1)),
            by("bob@x", insert(1, "b", 2)),
        ]);
        let server = by("carol@x", insert(0, "c", 2));
        let (c, s) = WaveAggregateOp::transform(&client, &server, &Transformer::default()).unwrap();
        let creators: Vec<_> = c.creators().map(|c| c.address()).collect();
        assert_eq!(creators, vec!["alice@x", "bob@x"]);
        assert_eq!(s.creators().next().map(|c| c.address()), Some("carol@x"));

        let ops = s.to_wavelet_operations().unwrap();
        match &ops[0].kind {
            WaveletOperationKind::Document { op, .. } => assert_eq!(op.input_len(), 4),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invert_reverses_parts() {
        let op = WaveAggregateOp::compose(&[
            by("alice@x", WaveletOperationKind::AddParticipant("dave@x".into())),
            by("bob@x", WaveletOperationKind::RemoveParticipant("erin@x".into())),
        ]);
        let inverse = op.invert().unwrap();
        let creators: Vec<_> = inverse.creators().map(|c| c.address()).collect();
        assert_eq!(creators, vec!["bob@x", "alice@x"]);
        let kinds: Vec<_> = inverse
            .to_wavelet_operations()
            .unwrap()
            .into_iter()
            .map(|op| op.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                WaveletOperationKind::AddParticipant("erin@x".into()),
                WaveletOperationKind::RemoveParticipant("dave@x".into()),
            ]
        );
    }

    #[test]
    fn test_only_last_operation_carries_version() {
        let op = WaveAggregateOp::compose(&[
            by("alice@x", WaveletOperationKind::AddParticipant("dave@x".into())),
            by("bob@x", WaveletOperationKind::AddParticipant("erin@x".into())),
        ]);
        let stamped = HashedVersion::unsigned(9);
        let ops = op.to_wavelet_operations_with_versions(3, Some(stamped)).unwrap();
        assert_eq!(ops[0].context.version_increment, 0);
        assert_eq!(ops[0].context.hashed_version, None);
        assert_eq!(ops[1].context.version_increment, 3);
        assert_eq!(ops[1].context.hashed_version, Some(stamped));
        assert_eq!(ops[1].creator().address(), "bob@x");
    }
}
