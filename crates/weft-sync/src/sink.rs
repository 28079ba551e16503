//! Operation sinks.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use weft_wavelet::WaveletOperation;

use crate::channel::OperationChannel;
use crate::error::{Result, SyncError};
use crate::sucker::ResumeHandle;

/// Something that consumes wavelet operations.
pub trait OperationSink {
    /// Consume one operation.
    fn consume(&self, op: WaveletOperation) -> Result<()>;

    /// Prepare to consume `op`.
    ///
    /// Returning false pauses delivery; the sink must later call
    /// [`ResumeHandle::resume`], from outside this call. Sinks with no flow
    /// control are always ready.
    fn flush(&self, _op: &WaveletOperation, _resume: ResumeHandle) -> bool {
        true
    }
}

/// Buffers operations until a target is set, then forwards them.
///
/// A target that refuses an operation is detached. The refused operation
/// and everything after it stay buffered for the next target.
#[derive(Default)]
pub struct ProxyOperationSink {
    buffered: RefCell<VecDeque<WaveletOperation>>,
    target: RefCell<Option<Rc<dyn OperationSink>>>,
}

impl ProxyOperationSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_target(&self) -> bool {
        self.target.borrow().is_some()
    }

    /// Operations waiting for a target.
    pub fn buffered_len(&self) -> usize {
        self.buffered.borrow().len()
    }

    /// Set the target and forward everything buffered, in order.
    ///
    /// The target can be set once while attached. Forwarding stops at the
    /// first failure, which detaches the target and is returned.
    pub fn set_target(&self, target: Rc<dyn OperationSink>) -> Result<()> {
        if self.has_target() {
            return Err(SyncError::TargetAlreadySet);
        }
        loop {
            let next = self.buffered.borrow_mut().pop_front();
            let Some(op) = next else { break };
            if let Err(error) = target.consume(op.clone()) {
                self.buffered.borrow_mut().push_front(op);
                return Err(error);
            }
        }
        *self.target.borrow_mut() = Some(target);
        Ok(())
    }

    /// Detach the target. Later operations are buffered again.
    pub fn clear_target(&self) {
        self.target.borrow_mut().take();
    }
}

impl OperationSink for ProxyOperationSink {
    fn consume(&self, op: WaveletOperation) -> Result<()> {
        let target = self.target.borrow().clone();
        match target {
            Some(target) => target.consume(op.clone()).map_err(|error| {
                self.clear_target();
                self.buffered.borrow_mut().push_back(op);
                error
            }),
            None => {
                self.buffered.borrow_mut().push_back(op);
                Ok(())
            }
        }
    }
}

/// Sends consumed operations over a channel.
pub struct ChannelSink {
    channel: Rc<dyn OperationChannel>,
}

impl ChannelSink {
    pub fn new(channel: Rc<dyn OperationChannel>) -> Self {
        Self { channel }
    }
}

impl OperationSink for ChannelSink {
    fn consume(&self, op: WaveletOperation) -> Result<()> {
        self.channel.send(std::slice::from_ref(&op))?;
        Ok(())
    }
}
