//! The operation sucker: pulls remote operations out of a channel into a
//! flow-controlled sink.
//!
//! States: idle, receiving, paused and shut down (terminal). A sink pauses
//! delivery by returning false from [`OperationSink::flush`] and resumes it
//! later through the [`ResumeHandle`] it was given.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::channel::OperationChannel;
use crate::sink::OperationSink;

/// Drains a channel into a sink.
pub struct OperationSucker {
    channel: Rc<dyn OperationChannel>,
    sink: Weak<dyn OperationSink>,
    paused: Cell<bool>,
    receiving: Cell<bool>,
    shutdown: Cell<bool>,
    this: Weak<OperationSucker>,
}

impl OperationSucker {
    /// Attach to `channel` and deliver whatever it already holds.
    ///
    /// The sucker listens on the channel until shut down. It holds the sink
    /// weakly and shuts down once the sink is gone.
    pub fn start(channel: Rc<dyn OperationChannel>, sink: Weak<dyn OperationSink>) -> Rc<Self> {
        let sucker = Rc::new_cyclic(|this| Self {
            channel,
            sink,
            paused: Cell::new(false),
            receiving: Cell::new(false),
            shutdown: Cell::new(false),
            this: this.clone(),
        });
        let listener = Rc::downgrade(&sucker);
        sucker.channel.set_listener(Some(Rc::new(move || {
            if let Some(sucker) = listener.upgrade() {
                sucker.on_operation_received();
            }
        })));
        sucker.on_operation_received();
        sucker
    }

    /// Channel callback: start receiving unless paused or already in the
    /// receive loop.
    pub fn on_operation_received(&self) {
        if self.paused.get() || self.receiving.get() || self.shutdown.get() {
            return;
        }
        self.receive_loop();
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.get()
    }

    /// Stop delivery. Takes effect at the next loop check.
    pub fn shutdown(&self) {
        if self.shutdown.replace(true) {
            return;
        }
        self.channel.set_listener(None);
        debug!("sucker shut down");
    }

    fn receive_loop(&self) {
        self.receiving.set(true);
        while !self.shutdown.get() {
            let sink = match self.sink.upgrade() {
                Some(sink) => sink,
                None => {
                    self.shutdown();
                    break;
                }
            };
            let next = match self.channel.peek() {
                Some(op) => op,
                None => break,
            };

            let resume = ResumeHandle {
                sucker: self.this.clone(),
            };
            if !sink.flush(&next, resume) {
                self.paused.set(true);
                debug!("reception paused");
                break;
            }
            if self.shutdown.get() {
                break;
            }
            // A local send during the flush may have transformed the head.
            if self.channel.peek().as_ref() != Some(&next) {
                continue;
            }

            let op = match self.channel.receive() {
                Some(op) => op,
                None => break,
            };
            if let Err(error) = sink.consume(op) {
                warn!(%error, "consume failed, shutting down");
                self.shutdown();
                break;
            }
        }
        self.receiving.set(false);
    }
}

/// Resumes a paused sucker.
#[derive(Clone)]
pub struct ResumeHandle {
    sucker: Weak<OperationSucker>,
}

impl ResumeHandle {
    /// Resume delivery.
    ///
    /// # Panics
    ///
    /// Panics if reception is not paused, which includes calling this from
    /// inside the flush that is about to pause it.
    pub fn resume(self) {
        if let Some(sucker) = self.sucker.upgrade() {
            assert!(
                sucker.paused.get(),
                "resume called while reception is not paused"
            );
            sucker.paused.set(false);
            debug!("reception resumed");
            sucker.on_operation_received();
        }
    }
}
