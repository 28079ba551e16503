//! # Weft Transform
//!
//! Operational transformation of concurrent document operations.
//!
//! ## Overview
//!
//! Two operations produced against the same document state are rewritten
//! so they can be applied in the opposite order:
//!
//! ```text
//!     client ; server'  ==  server ; client'
//! ```
//!
//! Each operation is first decomposed into insertion, preservation and
//! deletion parts ([`decompose`]). Six pairwise transformers ([`pairwise`])
//! rewrite the parts against each other in a fixed order and the results
//! are composed back into one operation per side ([`Transformer`]).
//!
//! At the same position the client's insertion comes first, and the client
//! wins attribute and annotation conflicts.
//!
//! ## Usage
//!
//! ```rust
//! use weft_core::DocOp;
//! use weft_transform::transform;
//!
//! let client = DocOp::builder().retain(2).characters("X").retain(2).build();
//! let server = DocOp::builder().retain(2).delete_characters("b").retain(1).build();
//!
//! let (client2, server2) = transform(&client, &server).unwrap();
//! assert_eq!(client2.input_len(), server.output_len());
//! assert_eq!(server2.input_len(), client.output_len());
//! ```

pub mod decompose;
pub mod engine;
pub mod error;
pub mod pairwise;
pub mod position;
pub mod tameness;
pub mod walk;

pub use decompose::{decompose, Decomposition};
pub use engine::{transform, TransformConfig, Transformer};
pub use error::{Result, TransformError};
pub use position::{PositionTracker, RelativePosition};
pub use tameness::{check_tameness, is_tame};
pub use walk::{walk, PairRules, RangeCache, Side};
