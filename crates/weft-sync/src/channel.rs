//! Channel abstraction for wavelet operations.
//!
//! A channel is the transport's view of one wavelet: an ordered, replayable
//! source of remote operations and a sink for local ones. Implementations
//! may sit on any transport; [`memory`] provides in-process channels for
//! tests.

use std::rc::Rc;

use weft_core::WaveletId;
use weft_wavelet::WaveletOperation;

use crate::error::ChannelError;

/// Called whenever a channel has a new operation to deliver.
pub type ChannelListener = Rc<dyn Fn()>;

/// Called with a channel once it has been created.
pub type ChannelCallback = Box<dyn FnOnce(Rc<dyn OperationChannel>)>;

/// Transport channel for one wavelet.
pub trait OperationChannel {
    /// The next remote operation, without consuming it.
    fn peek(&self) -> Option<WaveletOperation>;

    /// Consume the next remote operation.
    fn receive(&self) -> Option<WaveletOperation>;

    /// Send local operations, in order.
    fn send(&self, ops: &[WaveletOperation]) -> Result<(), ChannelError>;

    /// Replace the listener notified when operations arrive.
    fn set_listener(&self, listener: Option<ChannelListener>);
}

/// Creates channels for wavelets.
pub trait ChannelMux {
    /// Request a channel for `id`. `on_created` may run before this returns
    /// or at any later point.
    fn create_channel(&self, id: &WaveletId, on_created: ChannelCallback);
}

/// In-memory channels for testing.
pub mod memory {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::{BTreeMap, VecDeque};

    use weft_transform::transform;
    use weft_wavelet::WaveletOperationKind;

    /// An in-memory operation channel.
    ///
    /// Remote operations are queued with [`MemoryChannel::deliver`]; sent
    /// operations are recorded. Optionally, each sent document operation
    /// transforms the queued remote operations on the same document, the
    /// way a server rebases pending operations over a concurrent send.
    #[derive(Default)]
    pub struct MemoryChannel {
        queue: RefCell<VecDeque<WaveletOperation>>,
        sent: RefCell<Vec<WaveletOperation>>,
        listener: RefCell<Option<ChannelListener>>,
        broken: Cell<bool>,
        closed: Cell<bool>,
        transform_on_send: Cell<bool>,
    }

    impl MemoryChannel {
        pub fn new() -> Rc<Self> {
            Rc::new(Self::default())
        }

        /// Queue a remote operation and notify the listener.
        pub fn deliver(&self, op: WaveletOperation) {
            self.queue.borrow_mut().push_back(op);
            let listener = self.listener.borrow().clone();
            if let Some(listener) = listener {
                listener();
            }
        }

        /// Operations sent so far.
        pub fn sent(&self) -> Vec<WaveletOperation> {
            self.sent.borrow().clone()
        }

        /// Remote operations not yet received.
        pub fn pending(&self) -> usize {
            self.queue.borrow().len()
        }

        pub fn has_listener(&self) -> bool {
            self.listener.borrow().is_some()
        }

        /// Make sends fail with [`ChannelError::Broken`].
        pub fn set_broken(&self, broken: bool) {
            self.broken.set(broken);
        }

        /// Make sends fail with [`ChannelError::Closed`] from now on.
        pub fn close(&self) {
            self.closed.set(true);
        }

        /// Transform queued document operations against each send.
        pub fn set_transform_on_send(&self, enabled: bool) {
            self.transform_on_send.set(enabled);
        }

        /// Rebase queued operations on `local`'s document over `local`.
        fn transform_queue(&self, local: &WaveletOperation) -> Result<(), ChannelError> {
            let (document_id, mut local_op) = match &local.kind {
                WaveletOperationKind::Document { document_id, op } => (document_id, op.clone()),
                _ => return Ok(()),
            };

            let mut rebased = self.queue.borrow().clone();
            for queued in rebased.iter_mut() {
                if let WaveletOperationKind::Document { document_id: id, op } = &mut queued.kind {
                    if id == document_id {
                        let (local_next, queued_next) = transform(&local_op, op)?;
                        *op = queued_next;
                        local_op = local_next;
                    }
                }
            }
            *self.queue.borrow_mut() = rebased;
            Ok(())
        }
    }

    impl OperationChannel for MemoryChannel {
        fn peek(&self) -> Option<WaveletOperation> {
            self.queue.borrow().front().cloned()
        }

        fn receive(&self) -> Option<WaveletOperation> {
            self.queue.borrow_mut().pop_front()
        }

        fn send(&self, ops: &[WaveletOperation]) -> Result<(), ChannelError> {
            if self.closed.get() {
                return Err(ChannelError::Closed);
            }
            if self.broken.get() {
                return Err(ChannelError::Broken("send refused".into()));
            }
            for op in ops {
                if self.transform_on_send.get() {
                    self.transform_queue(op)?;
                }
                self.sent.borrow_mut().push(op.clone());
            }
            Ok(())
        }

        fn set_listener(&self, listener: Option<ChannelListener>) {
            *self.listener.borrow_mut() = listener;
        }
    }

    /// An in-memory channel multiplexer.
    ///
    /// Creates a [`MemoryChannel`] per requested wavelet, either at once or,
    /// when deferred, on [`MemoryMux::complete_pending`].
    #[derive(Default)]
    pub struct MemoryMux {
        deferred: bool,
        pending: RefCell<Vec<(WaveletId, ChannelCallback)>>,
        channels: RefCell<BTreeMap<WaveletId, Rc<MemoryChannel>>>,
    }

    impl MemoryMux {
        /// A mux that creates channels immediately.
        pub fn new() -> Rc<Self> {
            Rc::new(Self::default())
        }

        /// A mux that holds requests until [`MemoryMux::complete_pending`].
        pub fn deferred() -> Rc<Self> {
            Rc::new(Self {
                deferred: true,
                ..Self::default()
            })
        }

        /// The channel created for `id`, if any.
        pub fn channel(&self, id: &WaveletId) -> Option<Rc<MemoryChannel>> {
            self.channels.borrow().get(id).cloned()
        }

        /// Ids with a channel request still outstanding.
        pub fn requested(&self) -> Vec<WaveletId> {
            self.pending.borrow().iter().map(|(id, _)| id.clone()).collect()
        }

        /// Create the channels for every outstanding request.
        pub fn complete_pending(&self) {
            let pending = std::mem::take(&mut *self.pending.borrow_mut());
            for (id, on_created) in pending {
                self.open(id, on_created);
            }
        }

        fn open(&self, id: WaveletId, on_created: ChannelCallback) {
            let channel = MemoryChannel::new();
            self.channels.borrow_mut().insert(id, Rc::clone(&channel));
            on_created(channel);
        }
    }

    impl ChannelMux for MemoryMux {
        fn create_channel(&self, id: &WaveletId, on_created: ChannelCallback) {
            if self.deferred {
                self.pending.borrow_mut().push((id.clone(), on_created));
            } else {
                self.open(id.clone(), on_created);
            }
        }
    }
}
