//! Applying operations to wavelet state, with observers.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use weft_core::{DocumentId, WaveletId};
use weft_wavelet::{WaveletData, WaveletError, WaveletOperation};

use crate::sucker::ResumeHandle;

/// Notified around every applied operation.
pub trait WaveletObserver {
    fn before_apply(&self, _op: &WaveletOperation) {}
    fn after_apply(&self, _op: &WaveletOperation) {}
}

/// Notified once when a wavelet fails.
pub trait FailureHandler {
    fn on_failure(&self, wavelet: &WaveletId, error: &WaveletError);
}

/// Flow control for operations on one document.
///
/// See [`crate::OperationSink::flush`].
pub trait DocumentFlusher {
    fn flush(&self, document: &DocumentId, op: &WaveletOperation, resume: ResumeHandle) -> bool;
}

/// Applies operations to one wavelet's data.
pub struct OperationApplier {
    data: RefCell<WaveletData>,
    observers: RefCell<Vec<Rc<dyn WaveletObserver>>>,
    last_applied: RefCell<Option<WaveletOperation>>,
}

impl OperationApplier {
    pub fn new(data: WaveletData, observers: Vec<Rc<dyn WaveletObserver>>) -> Self {
        Self {
            data: RefCell::new(data),
            observers: RefCell::new(observers),
            last_applied: RefCell::new(None),
        }
    }

    /// Apply `op`, notifying observers before and after.
    ///
    /// On failure the data is unchanged and `after_apply` is not called.
    pub fn consume(&self, op: &WaveletOperation) -> Result<(), WaveletError> {
        let observers = self.observers.borrow().clone();
        for observer in &observers {
            observer.before_apply(op);
        }
        self.data.borrow_mut().apply(op)?;
        *self.last_applied.borrow_mut() = Some(op.clone());
        for observer in &observers {
            observer.after_apply(op);
        }
        Ok(())
    }

    pub fn data(&self) -> Ref<'_, WaveletData> {
        self.data.borrow()
    }

    /// The last operation applied successfully.
    pub fn last_applied(&self) -> Option<WaveletOperation> {
        self.last_applied.borrow().clone()
    }

    pub fn clear_observers(&self) {
        self.observers.borrow_mut().clear();
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }
}
