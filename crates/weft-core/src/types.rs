//! Strong type definitions for Weft.
//!
//! All identifiers are newtypes to prevent mixing a document id with a
//! wavelet id at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Create an identifier from any string-like value.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// A participant, identified by its address.
    ///
    /// Participants are totally ordered by address. Aggregate composition and
    /// transform rely on this order for their sorted merge passes.
    ParticipantId
);

string_id!(
    /// Identifier of a document inside a wavelet.
    DocumentId
);

string_id!(
    /// Identifier of a wavelet.
    WaveletId
);

impl ParticipantId {
    /// The address of this participant.
    pub fn address(&self) -> &str {
        &self.0
    }
}

/// A wavelet version paired with the hash of the history that produced it.
///
/// The hash chains: each applied operation derives the next hash as
/// `Blake3(previous_hash || operation_bytes)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HashedVersion {
    /// Number of version increments applied so far.
    pub version: u64,
    /// History hash at this version.
    pub hash: [u8; 32],
}

impl HashedVersion {
    /// A version with the zero history hash.
    pub const fn unsigned(version: u64) -> Self {
        Self {
            version,
            hash: [0u8; 32],
        }
    }

    /// Derive the successor version after applying an operation.
    ///
    /// Returns `None` if the version number would overflow.
    pub fn next(&self, increment: u64, operation_bytes: &[u8]) -> Option<Self> {
        let version = self.version.checked_add(increment)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"weft-version-v0:");
        hasher.update(&self.hash);
        hasher.update(operation_bytes);
        Some(Self {
            version,
            hash: *hasher.finalize().as_bytes(),
        })
    }

    /// Convert the hash to a hex string.
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }

    /// The starting version of every wavelet.
    pub const ZERO: Self = Self::unsigned(0);
}

impl Default for HashedVersion {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Debug for HashedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HashedVersion({}, {})",
            self.version,
            &self.hash_hex()[..16]
        )
    }
}

impl fmt::Display for HashedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.version, &self.hash_hex()[..16])
    }
}

/// Generates wavelet ids that are unique across sessions.
///
/// Each generator draws a random seed once; ids are `<prefix>+<seed><n>`.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    seed: String,
    counter: std::cell::Cell<u64>,
}

impl IdGenerator {
    /// Create a generator with a fresh random seed.
    pub fn new(prefix: impl Into<String>) -> Self {
        use rand::Rng;
        let seed: [u8; 6] = rand::thread_rng().gen();
        Self::with_seed(prefix, hex::encode(seed))
    }

    /// Create a generator with an explicit seed (deterministic, for tests).
    pub fn with_seed(prefix: impl Into<String>, seed: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            seed: seed.into(),
            counter: std::cell::Cell::new(0),
        }
    }

    /// Produce the next wavelet id.
    pub fn next_wavelet_id(&self) -> WaveletId {
        let n = self.counter.get();
        self.counter.set(n + 1);
        WaveletId(format!("{}+{}{}", self.prefix, self.seed, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_order_is_by_address() {
        let mut ids = vec![
            ParticipantId::from("carol@example.com"),
            ParticipantId::from("alice@example.com"),
            ParticipantId::from("bob@example.com"),
        ];
        ids.sort();
        let addresses: Vec<_> = ids.iter().map(|p| p.address()).collect();
        assert_eq!(
            addresses,
            vec!["alice@example.com", "bob@example.com", "carol@example.com"]
        );
    }

    #[test]
    fn test_id_display_and_debug() {
        let id = DocumentId::from("b+main");
        assert_eq!(format!("{}", id), "b+main");
        assert_eq!(format!("{:?}", id), "DocumentId(b+main)");
    }

    #[test]
    fn test_hashed_version_chains() {
        let v0 = HashedVersion::ZERO;
        let v1 = v0.next(1, b"op-a").unwrap();
        let v2 = v1.next(1, b"op-b").unwrap();
        assert_eq!(v1.version, 1);
        assert_eq!(v2.version, 2);
        assert_ne!(v1.hash, v2.hash);

        // Same history, same hash.
        let again = HashedVersion::ZERO
            .next(1, b"op-a")
            .and_then(|v| v.next(1, b"op-b"))
            .unwrap();
        assert_eq!(again, v2);

        // Different order, different hash.
        let swapped = HashedVersion::ZERO
            .next(1, b"op-b")
            .and_then(|v| v.next(1, b"op-a"))
            .unwrap();
        assert_ne!(swapped.hash, v2.hash);
    }

    #[test]
    fn test_hashed_version_overflow() {
        let top = HashedVersion::unsigned(u64::MAX - 1);
        assert_eq!(top.next(1, b"op").map(|v| v.version), Some(u64::MAX));
        assert!(top.next(2, b"op").is_none());
    }

    #[test]
    fn test_hashed_version_display() {
        let v = HashedVersion {
            version: 7,
            hash: [0xab; 32],
        };
        assert_eq!(format!("{}", v), "7:abababababababab");
    }

    #[test]
    fn test_id_generator_is_sequential_and_prefixed() {
        let ids = IdGenerator::with_seed("w", "seed");
        assert_eq!(ids.next_wavelet_id().as_str(), "w+seed0");
        assert_eq!(ids.next_wavelet_id().as_str(), "w+seed1");
    }

    #[test]
    fn test_random_generators_do_not_collide() {
        let a = IdGenerator::new("w");
        let b = IdGenerator::new("w");
        assert_ne!(a.next_wavelet_id(), b.next_wavelet_id());
    }
}
