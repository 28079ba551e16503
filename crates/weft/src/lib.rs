//! # Weft
//!
//! Operational transformation for collaborative, tree-structured documents
//! grouped into wavelets.
//!
//! ## Overview
//!
//! - **DocOp**: an edit script over a document of characters and elements,
//!   with attributes and annotations.
//! - **Transform**: rewrites two concurrent operations so that applying
//!   them in either order converges.
//! - **Wavelet**: participants plus named documents, versioned by a hash
//!   chain over every applied operation.
//! - **Sync**: drives each wavelet over an operation channel, in its own
//!   failure domain.
//!
//! ## Usage
//!
//! ```rust
//! use weft::core::{Attributes, DocOp};
//! use weft::sync::memory::MemoryMux;
//! use weft::{Session, SessionConfig, WaveletHooks};
//!
//! let mux = MemoryMux::new();
//! let session = Session::new(
//!     "alice@example.com".into(),
//!     mux.clone(),
//!     SessionConfig::default(),
//!     WaveletHooks::default(),
//! );
//!
//! let wavelet = session.create_wavelet().unwrap();
//! let op = DocOp::builder()
//!     .element_start("body", Attributes::new())
//!     .characters("hello")
//!     .element_end()
//!     .build();
//! wavelet.submit_document_op("b+main".into(), op).unwrap();
//!
//! let channel = mux.channel(wavelet.id()).unwrap();
//! assert_eq!(channel.sent().len(), 2);
//! ```
//!
//! ## Re-exports
//!
//! - `weft::core` - documents, operations, composition, ids
//! - `weft::transform` - the transform engine
//! - `weft::wavelet` - wavelet state, aggregates and undo
//! - `weft::sync` - channels, sinks and binders

pub mod error;
pub mod session;

pub use weft_core as core;
pub use weft_sync as sync;
pub use weft_transform as transform;
pub use weft_wavelet as wavelet;

pub use error::{Result, WeftError};
pub use session::{Session, SessionConfig};

pub use weft_core::{DocOp, Document, DocumentId, HashedVersion, ParticipantId, WaveletId};
pub use weft_sync::{CcBasedWavelet, WaveletHooks};
pub use weft_wavelet::{AggregateOperation, OneStepBuffer, WaveAggregateOp, WaveletOperation};
