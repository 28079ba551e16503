//! A one-step undo buffer.
//!
//! Local undoable edits are buffered as lifted aggregates. Edits that must
//! not be undone (remote operations, local non-undoable edits) are
//! transformed against the buffer so the buffer's inverse stays valid.

use tracing::debug;

use weft_transform::Transformer;

use crate::config::WaveletConfig;
use crate::error::Result;
use crate::operation::WaveletOperation;
use crate::wave_aggregate::WaveAggregateOp;

/// Holds zero or one composed batch of undoable edits.
///
/// The batch is kept as the list of lifted operations and composed the
/// next time it is used.
#[derive(Debug, Default)]
pub struct OneStepBuffer {
    buffered: Vec<WaveAggregateOp>,
    transformer: Transformer,
}

impl OneStepBuffer {
    pub fn new(config: &WaveletConfig) -> Self {
        Self {
            buffered: Vec::new(),
            transformer: Transformer::new(config.transform.clone()),
        }
    }

    pub fn has_operations(&self) -> bool {
        !self.buffered.is_empty()
    }

    /// Buffer an undoable operation that has already been applied.
    pub fn undoable(&mut self, op: &WaveletOperation) {
        self.buffered.push(WaveAggregateOp::from_operation(op));
    }

    /// Transform a non-undoable operation against the buffer.
    ///
    /// Returns the operations to apply in place of `op`, carrying `op`'s
    /// version increment and hashed version. If `update_undo_stack` is set
    /// the buffer is replaced by its transformed form; otherwise it keeps
    /// the untransformed composition. On error the buffer is unchanged.
    pub fn transform_non_undoable(
        &mut self,
        op: WaveletOperation,
        update_undo_stack: bool,
    ) -> Result<Vec<WaveletOperation>> {
        if self.buffered.is_empty() || op.is_no_op_or_version_update() {
            return Ok(vec![op]);
        }

        let composed = WaveAggregateOp::compose(&self.buffered);
        let lifted = WaveAggregateOp::from_operation(&op);
        let (buffer, transformed) =
            WaveAggregateOp::transform(&composed, &lifted, &self.transformer)?;
        let mut ops = transformed.to_wavelet_operations_with_versions(
            op.context.version_increment,
            op.context.hashed_version,
        )?;
        if ops.is_empty() {
            // Version bookkeeping survives even when nothing else does.
            ops.push(WaveletOperation::version_update(op.context.clone()));
        }

        self.buffered = vec![if update_undo_stack { buffer } else { composed }];
        Ok(ops)
    }

    /// Drain the buffer into operations without undoing them.
    pub fn flush(&mut self) -> Result<Vec<WaveletOperation>> {
        let ops = WaveAggregateOp::compose(&self.buffered).to_wavelet_operations()?;
        self.buffered.clear();
        Ok(ops)
    }

    /// Drain the buffer into the operations that undo it.
    pub fn revert(&mut self) -> Result<Vec<WaveletOperation>> {
        let inverse = WaveAggregateOp::compose(&self.buffered).invert()?;
        let ops = inverse.to_wavelet_operations()?;
        debug!(operations = ops.len(), "reverting buffered edits");
        self.buffered.clear();
        Ok(ops)
    }
}
