//! # Weft Testkit
//!
//! Testing utilities for Weft.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: transform cases with the document both orders must produce
//! - **Generators**: Proptest strategies for documents and operations valid against them
//! - **Fixtures**: Sessions over in-memory channels with recording hooks
//!
//! ## Golden Vectors
//!
//! ```rust
//! use weft_testkit::vectors::verify_all_vectors;
//!
//! for report in verify_all_vectors() {
//!     assert!(report.passed, "{}: {}", report.name, report.client_first);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use weft_testkit::generators::ConcurrentEdits;
//!
//! proptest! {
//!     #[test]
//!     fn transform_converges(edits: ConcurrentEdits) {
//!         let (c2, s2) = weft_transform::transform(&edits.client, &edits.server).unwrap();
//!         let a = edits.document.apply(&edits.client).unwrap().apply(&s2).unwrap();
//!         let b = edits.document.apply(&edits.server).unwrap().apply(&c2).unwrap();
//!         prop_assert_eq!(a, b);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use weft_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new("alice@example.com");
//! let wavelet = fixture.session.create_wavelet().unwrap();
//! assert_eq!(fixture.sent(wavelet.id()).len(), 1);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{multi_party_fixtures, FlushingSink, RecordingFailureHandler, RecordingObserver, TestFixture};
pub use generators::{doc_op_for, document, ConcurrentEdits};
pub use vectors::{all_vectors, verify_all_vectors, GoldenVector, VectorReport};
