//! # Weft Sync
//!
//! Drives wavelets over operation channels.
//!
//! ## Overview
//!
//! Each wavelet is wired to one [`OperationChannel`]:
//!
//! ```text
//!   channel ──▶ OperationSucker ──▶ CcBasedWavelet ──▶ OperationApplier
//!   channel ◀── ChannelSink ◀── ProxyOperationSink ◀── local mutators
//! ```
//!
//! The [`OperationSucker`] pulls remote operations in order and may pause
//! when the wavelet's flusher is not ready. Local operations are applied
//! immediately and buffered in a [`ProxyOperationSink`] until the wavelet
//! is bound.
//!
//! Every wavelet is its own failure domain: a remote operation that fails
//! to apply moves that wavelet, and only that wavelet, to a terminal failed
//! state.
//!
//! Everything here is single-threaded. Shared state uses `Rc` and `RefCell`
//! and back references are `Weak`.
//!
//! ## Usage
//!
//! ```rust
//! use std::rc::Rc;
//! use weft_sync::memory::MemoryMux;
//! use weft_sync::{LiveChannelBinder, OperationalizerRegistry, WaveletHooks, WaveletView};
//! use weft_wavelet::WaveletConfig;
//!
//! let registry = Rc::new(OperationalizerRegistry::new(
//!     "alice@example.com".into(),
//!     WaveletConfig::default(),
//!     WaveletHooks::default(),
//! ));
//! let mux = MemoryMux::new();
//! let binder = LiveChannelBinder::new(registry.clone(), Rc::new(WaveletView::new()), mux.clone());
//!
//! let wavelet = registry.create("w+1".into()).unwrap();
//! binder.view().add(wavelet.clone());
//! assert!(wavelet.is_bound());
//! ```

pub mod applier;
pub mod binder;
pub mod channel;
pub mod error;
pub mod registry;
pub mod sink;
pub mod sucker;
pub mod view;
pub mod wavelet;

pub use applier::{DocumentFlusher, FailureHandler, OperationApplier, WaveletObserver};
pub use binder::{LiveChannelBinder, StaticChannelBinder};
pub use channel::{memory, ChannelCallback, ChannelListener, ChannelMux, OperationChannel};
pub use error::{ChannelError, Result, SyncError};
pub use registry::OperationalizerRegistry;
pub use sink::{ChannelSink, OperationSink, ProxyOperationSink};
pub use sucker::{OperationSucker, ResumeHandle};
pub use view::{ViewListener, WaveletView};
pub use wavelet::{CcBasedWavelet, WaveletHooks};
