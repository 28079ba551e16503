//! # Weft Core
//!
//! Pure primitives for Weft: document operations, documents, identifiers
//! and canonicalization.
//!
//! This crate contains no I/O and no shared state. It is pure computation
//! over document operations.
//!
//! ## Key Types
//!
//! - [`DocOp`] - An immutable edit script over a tree-shaped document
//! - [`DocOpBuilder`] - Normalising builder, also a [`DocOpCursor`]
//! - [`Document`] - A concrete document state that operations apply to
//! - [`HashedVersion`] - Wavelet version plus history hash
//! - [`ParticipantId`], [`DocumentId`], [`WaveletId`] - Identifiers
//!
//! ## Algebra
//!
//! Operations compose ([`compose`]), invert ([`invert`]) and validate
//! ([`validate`]). `compose(x, invert(x))` is a pure retain.
//!
//! ```rust
//! use weft_core::{compose, Attributes, DocOp, Document};
//!
//! let doc = Document::from_op(
//!     &DocOp::builder()
//!         .element_start("body", Attributes::new())
//!         .characters("ab")
//!         .element_end()
//!         .build(),
//! )
//! .unwrap();
//!
//! let insert = DocOp::builder().retain(2).characters("X").retain(2).build();
//! assert_eq!(doc.apply(&insert).unwrap().to_xml(), "<body>aXb</body>");
//! assert!(compose(&insert, &insert.invert()).unwrap().is_identity());
//! ```
//!
//! ## Canonicalization
//!
//! Operations are hashed through deterministic CBOR. See [`canonical`].

pub mod annotations;
pub mod attributes;
pub mod canonical;
pub mod compose;
pub mod docop;
pub mod document;
pub mod error;
pub mod invert;
pub mod types;
pub mod validation;

pub use annotations::{
    annotate, apply_boundary, ActiveAnnotations, AnnotationBoundary, ValueChange,
};
pub use attributes::{AttributeChange, Attributes, AttributesUpdate};
pub use canonical::canonical_bytes;
pub use compose::{compose, compose_all};
pub use docop::{Component, DocOp, DocOpBuilder, DocOpCursor};
pub use document::{Document, Item, ItemKind};
pub use error::{ApplyError, ComposeError, CoreError, ValidationError};
pub use invert::invert;
pub use types::{DocumentId, HashedVersion, IdGenerator, ParticipantId, WaveletId};
pub use validation::validate;
