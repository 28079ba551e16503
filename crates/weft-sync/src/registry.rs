//! The registry of operationalized wavelets.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use weft_core::{ParticipantId, WaveletId};
use weft_wavelet::{WaveletConfig, WaveletData};

use crate::error::{Result, SyncError};
use crate::wavelet::{CcBasedWavelet, WaveletHooks};

/// Owns every [`CcBasedWavelet`] known to a client, keyed by id.
///
/// New wavelets share the registry's creator, configuration and hooks.
pub struct OperationalizerRegistry {
    creator: ParticipantId,
    config: WaveletConfig,
    hooks: WaveletHooks,
    entries: RefCell<BTreeMap<WaveletId, Rc<CcBasedWavelet>>>,
}

impl OperationalizerRegistry {
    pub fn new(creator: ParticipantId, config: WaveletConfig, hooks: WaveletHooks) -> Self {
        Self {
            creator,
            config,
            hooks,
            entries: RefCell::new(BTreeMap::new()),
        }
    }

    pub fn creator(&self) -> &ParticipantId {
        &self.creator
    }

    /// Create and register an empty wavelet.
    pub fn create(&self, id: WaveletId) -> Result<Rc<CcBasedWavelet>> {
        if self.contains(&id) {
            return Err(SyncError::AlreadyRegistered(id));
        }
        self.register(WaveletData::new(id))
    }

    /// Register a wavelet over existing data.
    pub fn register(&self, data: WaveletData) -> Result<Rc<CcBasedWavelet>> {
        let id = data.id().clone();
        if self.contains(&id) {
            return Err(SyncError::AlreadyRegistered(id));
        }
        let wavelet = CcBasedWavelet::new(
            data,
            self.creator.clone(),
            self.config.clone(),
            self.hooks.clone(),
        );
        debug!(wavelet = %id, "wavelet registered");
        self.entries.borrow_mut().insert(id, Rc::clone(&wavelet));
        Ok(wavelet)
    }

    pub fn get(&self, id: &WaveletId) -> Option<Rc<CcBasedWavelet>> {
        self.entries.borrow().get(id).cloned()
    }

    /// The registered wavelet with `id`, created if absent.
    pub fn get_or_create(&self, id: &WaveletId) -> Result<Rc<CcBasedWavelet>> {
        match self.get(id) {
            Some(wavelet) => Ok(wavelet),
            None => self.create(id.clone()),
        }
    }

    pub fn contains(&self, id: &WaveletId) -> bool {
        self.entries.borrow().contains_key(id)
    }

    pub fn ids(&self) -> Vec<WaveletId> {
        self.entries.borrow().keys().cloned().collect()
    }

    /// Unregister a wavelet, shutting down its reception.
    pub fn remove(&self, id: &WaveletId) -> Option<Rc<CcBasedWavelet>> {
        let removed = self.entries.borrow_mut().remove(id);
        if let Some(wavelet) = &removed {
            wavelet.shutdown();
        }
        removed
    }

    pub fn wavelets(&self) -> Vec<Rc<CcBasedWavelet>> {
        self.entries.borrow().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
