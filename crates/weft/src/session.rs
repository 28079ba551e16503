//! The Session: one user's wavelets, their channels and their lifecycle.
//!
//! A session owns the operationalizer registry, the wavelet view and a
//! live binder over a channel mux. Wavelets created locally request a
//! channel; channels opened remotely create their wavelet.

use std::rc::Rc;

use tracing::debug;

use weft_core::{IdGenerator, ParticipantId, WaveletId};
use weft_sync::{
    CcBasedWavelet, ChannelMux, LiveChannelBinder, OperationChannel, OperationalizerRegistry,
    WaveletHooks, WaveletView,
};
use weft_wavelet::WaveletConfig;

use crate::error::Result;

/// Configuration for a Session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Configuration shared by every wavelet.
    pub wavelet: WaveletConfig,
    /// Prefix of locally generated wavelet ids.
    pub id_prefix: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wavelet: WaveletConfig::default(),
            id_prefix: "w".to_string(),
        }
    }
}

/// The main Session struct.
pub struct Session {
    user: ParticipantId,
    config: SessionConfig,
    ids: IdGenerator,
    registry: Rc<OperationalizerRegistry>,
    view: Rc<WaveletView>,
    binder: Rc<LiveChannelBinder>,
}

impl Session {
    /// Create a session for `user`, obtaining channels from `mux`.
    ///
    /// `hooks` are installed on every wavelet the session creates.
    pub fn new(
        user: ParticipantId,
        mux: Rc<dyn ChannelMux>,
        config: SessionConfig,
        hooks: WaveletHooks,
    ) -> Self {
        let registry = Rc::new(OperationalizerRegistry::new(
            user.clone(),
            config.wavelet.clone(),
            hooks,
        ));
        let view = Rc::new(WaveletView::new());
        let binder = LiveChannelBinder::new(Rc::clone(&registry), Rc::clone(&view), mux);
        Self {
            ids: IdGenerator::new(config.id_prefix.clone()),
            user,
            config,
            registry,
            view,
            binder,
        }
    }

    pub fn user(&self) -> &ParticipantId {
        &self.user
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn view(&self) -> &Rc<WaveletView> {
        &self.view
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Wavelet lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a wavelet with the user as its first participant.
    ///
    /// The wavelet is usable at once; its operations are sent when the
    /// channel requested for it arrives.
    pub fn create_wavelet(&self) -> Result<Rc<CcBasedWavelet>> {
        let id = self.ids.next_wavelet_id();
        let wavelet = self.registry.create(id)?;
        wavelet.add_participant(self.user.clone())?;
        self.view.add(Rc::clone(&wavelet));
        debug!(wavelet = %wavelet.id(), "wavelet created locally");
        Ok(wavelet)
    }

    /// A channel for `id` was opened by the remote side.
    pub fn channel_opened(
        &self,
        id: &WaveletId,
        channel: Rc<dyn OperationChannel>,
    ) -> Result<Rc<CcBasedWavelet>> {
        Ok(self.binder.channel_opened(id, channel)?)
    }

    pub fn wavelet(&self, id: &WaveletId) -> Option<Rc<CcBasedWavelet>> {
        self.registry.get(id)
    }

    pub fn wavelet_ids(&self) -> Vec<WaveletId> {
        self.registry.ids()
    }

    /// Ids of the wavelets that have failed.
    pub fn failed_wavelets(&self) -> Vec<WaveletId> {
        self.registry
            .wavelets()
            .into_iter()
            .filter(|w| w.is_failed())
            .map(|w| w.id().clone())
            .collect()
    }

    /// Stop reception on every wavelet.
    pub fn shutdown(&self) {
        for wavelet in self.registry.wavelets() {
            wavelet.shutdown();
        }
        debug!(user = %self.user, "session shut down");
    }
}
