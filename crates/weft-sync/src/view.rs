//! The set of wavelets a client currently shows, with change listeners.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use weft_core::WaveletId;

use crate::wavelet::CcBasedWavelet;

/// Notified when the view changes. Held weakly.
pub trait ViewListener {
    fn on_wavelet_added(&self, wavelet: &Rc<CcBasedWavelet>);
    fn on_wavelet_removed(&self, _id: &WaveletId) {}
}

#[derive(Default)]
pub struct WaveletView {
    wavelets: RefCell<BTreeMap<WaveletId, Rc<CcBasedWavelet>>>,
    listeners: RefCell<Vec<Weak<dyn ViewListener>>>,
}

impl WaveletView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a wavelet. Returns false, without notifying, if it is already
    /// shown.
    pub fn add(&self, wavelet: Rc<CcBasedWavelet>) -> bool {
        let id = wavelet.id().clone();
        if self.contains(&id) {
            return false;
        }
        self.wavelets.borrow_mut().insert(id, Rc::clone(&wavelet));
        for listener in self.live_listeners() {
            listener.on_wavelet_added(&wavelet);
        }
        true
    }

    pub fn remove(&self, id: &WaveletId) -> Option<Rc<CcBasedWavelet>> {
        let removed = self.wavelets.borrow_mut().remove(id);
        if removed.is_some() {
            for listener in self.live_listeners() {
                listener.on_wavelet_removed(id);
            }
        }
        removed
    }

    pub fn get(&self, id: &WaveletId) -> Option<Rc<CcBasedWavelet>> {
        self.wavelets.borrow().get(id).cloned()
    }

    pub fn contains(&self, id: &WaveletId) -> bool {
        self.wavelets.borrow().contains_key(id)
    }

    pub fn ids(&self) -> Vec<WaveletId> {
        self.wavelets.borrow().keys().cloned().collect()
    }

    pub fn add_listener(&self, listener: Weak<dyn ViewListener>) {
        self.listeners.borrow_mut().push(listener);
    }

    // Prunes dropped listeners; callbacks run with no borrow held.
    fn live_listeners(&self) -> Vec<Rc<dyn ViewListener>> {
        let mut listeners = self.listeners.borrow_mut();
        listeners.retain(|l| l.strong_count() > 0);
        listeners.iter().filter_map(Weak::upgrade).collect()
    }
}
