//! A wavelet under concurrency control, and its failure domain.
//!
//! A [`CcBasedWavelet`] is live until applying a remote operation fails.
//! It then fails for good: the sucker feeding it shuts down, its observers
//! are dropped, its failure handler is told, and every mutator returns
//! [`SyncError::WaveletFailed`]. Queries keep answering with the last good
//! state.
//!
//! A failed send tears down the channel binding instead. The unsent
//! operations stay buffered and go out first when the wavelet is bound
//! again.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, error, warn};

use weft_core::{DocOp, Document, DocumentId, HashedVersion, ParticipantId, WaveletId};
use weft_wavelet::{WaveletConfig, WaveletData, WaveletError, WaveletOperation, WaveletOperationContext};

use crate::applier::{DocumentFlusher, FailureHandler, OperationApplier, WaveletObserver};
use crate::channel::OperationChannel;
use crate::error::{Result, SyncError};
use crate::sink::{ChannelSink, OperationSink, ProxyOperationSink};
use crate::sucker::{OperationSucker, ResumeHandle};

/// Constructor-supplied callbacks for a wavelet.
#[derive(Clone, Default)]
pub struct WaveletHooks {
    pub observers: Vec<Rc<dyn WaveletObserver>>,
    pub failure_handler: Option<Rc<dyn FailureHandler>>,
    pub flusher: Option<Rc<dyn DocumentFlusher>>,
}

/// A wavelet that applies remote operations from a channel and sends its
/// local operations to it.
pub struct CcBasedWavelet {
    id: WaveletId,
    creator: ParticipantId,
    config: WaveletConfig,
    applier: OperationApplier,
    output: Rc<ProxyOperationSink>,
    sucker: RefCell<Option<Rc<OperationSucker>>>,
    failure_handler: Option<Rc<dyn FailureHandler>>,
    flusher: Option<Rc<dyn DocumentFlusher>>,
    failed: Cell<bool>,
    this: Weak<CcBasedWavelet>,
}

impl CcBasedWavelet {
    /// Wrap `data`. Local operations are authored by `creator`.
    pub fn new(
        data: WaveletData,
        creator: ParticipantId,
        config: WaveletConfig,
        hooks: WaveletHooks,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            id: data.id().clone(),
            creator,
            config,
            applier: OperationApplier::new(data, hooks.observers),
            output: Rc::new(ProxyOperationSink::new()),
            sucker: RefCell::new(None),
            failure_handler: hooks.failure_handler,
            flusher: hooks.flusher,
            failed: Cell::new(false),
            this: this.clone(),
        })
    }

    pub fn id(&self) -> &WaveletId {
        &self.id
    }

    /// The sink local operations go to: buffered until bound.
    pub fn output(&self) -> Rc<ProxyOperationSink> {
        Rc::clone(&self.output)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub fn participants(&self) -> Vec<ParticipantId> {
        self.applier.data().participants().to_vec()
    }

    pub fn document(&self, id: &DocumentId) -> Option<Document> {
        self.applier.data().document(id).cloned()
    }

    pub fn version(&self) -> u64 {
        self.applier.data().version()
    }

    pub fn hashed_version(&self) -> HashedVersion {
        self.applier.data().hashed_version()
    }

    pub fn is_failed(&self) -> bool {
        self.failed.get()
    }

    pub fn is_bound(&self) -> bool {
        self.sucker.borrow().is_some()
    }

    /// The last operation applied successfully.
    pub fn last_applied(&self) -> Option<WaveletOperation> {
        self.applier.last_applied()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Mutators
    // ─────────────────────────────────────────────────────────────────────

    pub fn add_participant(&self, participant: ParticipantId) -> Result<()> {
        self.submit(WaveletOperation::add_participant(self.context(), participant))
    }

    /// Add each participant in order, stopping at the first failure.
    pub fn add_participant_ids(&self, participants: &[ParticipantId]) -> Result<()> {
        for participant in participants {
            self.add_participant(participant.clone())?;
        }
        Ok(())
    }

    pub fn remove_participant(&self, participant: ParticipantId) -> Result<()> {
        self.submit(WaveletOperation::remove_participant(self.context(), participant))
    }

    pub fn submit_document_op(&self, document: DocumentId, op: DocOp) -> Result<()> {
        self.submit(WaveletOperation::document(self.context(), document, op))
    }

    /// Apply a local operation and send it.
    ///
    /// An operation that does not apply is rejected; the wavelet stays live.
    /// If the send fails the operation stays applied and buffered, and the
    /// channel binding is torn down.
    pub fn submit(&self, op: WaveletOperation) -> Result<()> {
        self.check_live()?;
        self.applier.consume(&op)?;
        self.output.consume(op).map_err(|error| {
            self.unbind(&error);
            error
        })
    }

    /// Bind to `channel`: local operations, including any buffered so far,
    /// flow out and remote ones flow in through a sucker.
    ///
    /// Buffered operations are sent before reception starts, so the channel
    /// can order remote operations after them. If sending them fails,
    /// reception never starts and the wavelet stays unbound.
    pub fn bind(&self, channel: Rc<dyn OperationChannel>) -> Result<()> {
        self.check_live()?;
        if self.is_bound() || self.output.has_target() {
            return Err(SyncError::AlreadyBound(self.id.clone()));
        }
        if let Err(error) = self
            .output
            .set_target(Rc::new(ChannelSink::new(Rc::clone(&channel))))
        {
            warn!(wavelet = %self.id, %error, "buffered operations not sent, wavelet left unbound");
            return Err(error);
        }
        let sink: Weak<dyn OperationSink> = self.this.clone();
        let sucker = OperationSucker::start(channel, sink);
        *self.sucker.borrow_mut() = Some(sucker);
        debug!(wavelet = %self.id, "wavelet bound to channel");
        Ok(())
    }

    /// Stop receiving remote operations.
    pub fn shutdown(&self) {
        if let Some(sucker) = self.sucker.borrow().as_ref() {
            sucker.shutdown();
        }
    }

    /// Drop the channel binding after a failed send.
    fn unbind(&self, cause: &SyncError) {
        self.output.clear_target();
        let sucker = self.sucker.borrow_mut().take();
        if let Some(sucker) = sucker {
            sucker.shutdown();
            warn!(wavelet = %self.id, error = %cause, "send failed, channel binding torn down");
        }
    }

    fn context(&self) -> WaveletOperationContext {
        WaveletOperationContext::new(self.creator.clone())
            .with_version_increment(self.config.version_increment)
    }

    fn check_live(&self) -> Result<()> {
        if self.failed.get() {
            return Err(SyncError::WaveletFailed(self.id.clone()));
        }
        Ok(())
    }

    fn fail(&self, cause: &WaveletError) {
        if self.failed.replace(true) {
            return;
        }
        error!(wavelet = %self.id, error = %cause, "wavelet failed");
        self.shutdown();
        self.applier.clear_observers();
        if let Some(handler) = &self.failure_handler {
            handler.on_failure(&self.id, cause);
        }
    }
}

impl OperationSink for CcBasedWavelet {
    /// Apply a remote operation. Failure to apply fails the wavelet.
    fn consume(&self, op: WaveletOperation) -> Result<()> {
        self.check_live()?;
        if let Err(cause) = self.applier.consume(&op) {
            self.fail(&cause);
            return Err(SyncError::Wavelet(cause));
        }
        Ok(())
    }

    fn flush(&self, op: &WaveletOperation, resume: ResumeHandle) -> bool {
        match (op.document_id(), &self.flusher) {
            (Some(document), Some(flusher)) => flusher.flush(document, op, resume),
            _ => true,
        }
    }
}
