//! # Weft Wavelet
//!
//! Wavelet-level operations and state for Weft.
//!
//! ## Overview
//!
//! A wavelet groups a participant list and a set of documents. Every
//! change to it is a [`WaveletOperation`]: a participant added or removed,
//! or a document operation, each with the context of who made it.
//!
//! ## Key Types
//!
//! - [`WaveletData`] - Participants, documents and hashed version
//! - [`AggregateOperation`] - A whole-wavelet edit that composes,
//!   transforms and inverts
//! - [`WaveAggregateOp`] - Aggregate parts tagged with their creators
//! - [`OneStepBuffer`] - Buffered undoable edits
//!
//! ## Versions
//!
//! Applying an operation advances the version by the operation's
//! increment and chains the history hash:
//! `Blake3(previous_hash || canonical_bytes(op))`, unless the operation
//! carries a version stamped by the server.

pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod operation;
pub mod undo;
pub mod wave_aggregate;

pub use aggregate::{AggregateOperation, DocumentOperations};
pub use config::WaveletConfig;
pub use data::WaveletData;
pub use error::{Result, WaveletError};
pub use operation::{now_millis, WaveletOperation, WaveletOperationContext, WaveletOperationKind};
pub use undo::OneStepBuffer;
pub use wave_aggregate::WaveAggregateOp;
