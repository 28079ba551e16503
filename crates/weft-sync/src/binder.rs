//! Binding wavelets to channels.
//!
//! [`StaticChannelBinder`] wires one registered wavelet to one channel.
//! [`LiveChannelBinder`] does the same for wavelets as they appear, in
//! either order:
//!
//! - local-first: a wavelet is added to the view, a channel is requested
//!   from the mux and the wavelet is bound when the channel arrives;
//! - remote-first: a channel is opened for an unknown wavelet, the wavelet
//!   is created through the registry, added to the view and bound.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use weft_core::WaveletId;

use crate::channel::{ChannelMux, OperationChannel};
use crate::error::{Result, SyncError};
use crate::registry::OperationalizerRegistry;
use crate::view::{ViewListener, WaveletView};
use crate::wavelet::CcBasedWavelet;

pub struct StaticChannelBinder;

impl StaticChannelBinder {
    /// Bind the registered wavelet `id` to `channel`.
    pub fn bind(
        registry: &OperationalizerRegistry,
        id: &WaveletId,
        channel: Rc<dyn OperationChannel>,
    ) -> Result<()> {
        let wavelet = registry
            .get(id)
            .ok_or_else(|| SyncError::UnknownWavelet(id.clone()))?;
        debug!(wavelet = %id, "binding wavelet to channel");
        wavelet.bind(channel)
    }
}

pub struct LiveChannelBinder {
    registry: Rc<OperationalizerRegistry>,
    view: Rc<WaveletView>,
    mux: Rc<dyn ChannelMux>,
    /// Channels opened remotely whose wavelet is not yet in the view.
    remote_channels: RefCell<BTreeMap<WaveletId, Rc<dyn OperationChannel>>>,
    this: Weak<LiveChannelBinder>,
}

impl LiveChannelBinder {
    /// Create a binder listening to `view`.
    pub fn new(
        registry: Rc<OperationalizerRegistry>,
        view: Rc<WaveletView>,
        mux: Rc<dyn ChannelMux>,
    ) -> Rc<Self> {
        let binder = Rc::new_cyclic(|this| Self {
            registry,
            view,
            mux,
            remote_channels: RefCell::new(BTreeMap::new()),
            this: this.clone(),
        });
        let listener: Weak<LiveChannelBinder> = Rc::downgrade(&binder);
        binder.view.add_listener(listener);
        binder
    }

    pub fn registry(&self) -> &Rc<OperationalizerRegistry> {
        &self.registry
    }

    pub fn view(&self) -> &Rc<WaveletView> {
        &self.view
    }

    /// A channel for `id` was opened by the remote side.
    pub fn channel_opened(
        &self,
        id: &WaveletId,
        channel: Rc<dyn OperationChannel>,
    ) -> Result<Rc<CcBasedWavelet>> {
        if let Some(wavelet) = self.view.get(id) {
            wavelet.bind(channel)?;
            return Ok(wavelet);
        }

        self.remote_channels
            .borrow_mut()
            .insert(id.clone(), channel);
        let wavelet = match self.registry.get_or_create(id) {
            Ok(wavelet) => wavelet,
            Err(e) => {
                self.remote_channels.borrow_mut().remove(id);
                return Err(e);
            }
        };
        self.view.add(Rc::clone(&wavelet));

        let pending = self.remote_channels.borrow_mut().remove(id);
        if let Some(channel) = pending {
            debug!(wavelet = %id, "binding remotely opened channel");
            StaticChannelBinder::bind(&self.registry, id, channel)?;
        }
        Ok(wavelet)
    }

    fn request_channel(&self, id: &WaveletId) {
        debug!(wavelet = %id, "requesting channel");
        let binder = self.this.clone();
        let target = id.clone();
        self.mux.create_channel(
            id,
            Box::new(move |channel| {
                let Some(binder) = binder.upgrade() else {
                    return;
                };
                if let Err(e) = StaticChannelBinder::bind(&binder.registry, &target, channel) {
                    warn!(wavelet = %target, error = %e, "deferred bind failed");
                }
            }),
        );
    }
}

impl ViewListener for LiveChannelBinder {
    fn on_wavelet_added(&self, wavelet: &Rc<CcBasedWavelet>) {
        let id = wavelet.id();
        if wavelet.is_bound() || self.remote_channels.borrow().contains_key(id) {
            return;
        }
        self.request_channel(id);
    }
}
