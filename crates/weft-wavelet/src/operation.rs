//! Wavelet operations: participant changes and document edits, each
//! carrying the context of who made it and which version it produces.

use ciborium::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

use weft_core::canonical::{doc_op_value, encode_canonical};
use weft_core::{CoreError, DocOp, DocumentId, HashedVersion, ParticipantId};

/// Kind tags for canonical encoding.
mod tags {
    pub const ADD_PARTICIPANT: u64 = 0;
    pub const REMOVE_PARTICIPANT: u64 = 1;
    pub const DOCUMENT: u64 = 2;
    pub const NO_OP: u64 = 3;
    pub const VERSION_UPDATE: u64 = 4;
}

/// Who made an operation and how it moves the wavelet version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveletOperationContext {
    /// The participant that authored the operation.
    pub creator: ParticipantId,
    /// Author-claimed creation time (Unix milliseconds). Untrusted.
    pub timestamp: i64,
    /// How far applying the operation advances the version.
    pub version_increment: u64,
    /// The version the server assigned, once known.
    pub hashed_version: Option<HashedVersion>,
}

impl WaveletOperationContext {
    /// A context stamped now, advancing the version by one.
    pub fn new(creator: ParticipantId) -> Self {
        Self {
            creator,
            timestamp: now_millis(),
            version_increment: 1,
            hashed_version: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_version_increment(mut self, increment: u64) -> Self {
        self.version_increment = increment;
        self
    }

    pub fn with_hashed_version(mut self, version: Option<HashedVersion>) -> Self {
        self.hashed_version = version;
        self
    }
}

/// What a wavelet operation does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveletOperationKind {
    AddParticipant(ParticipantId),
    RemoveParticipant(ParticipantId),
    Document { document_id: DocumentId, op: DocOp },
    NoOp,
    VersionUpdate,
}

impl fmt::Display for WaveletOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddParticipant(p) => write!(f, "add {}", p),
            Self::RemoveParticipant(p) => write!(f, "remove {}", p),
            Self::Document { document_id, op } => write!(f, "{}: {}", document_id, op),
            Self::NoOp => f.write_str("no-op"),
            Self::VersionUpdate => f.write_str("version update"),
        }
    }
}

/// One operation on a wavelet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveletOperation {
    pub context: WaveletOperationContext,
    pub kind: WaveletOperationKind,
}

impl WaveletOperation {
    pub fn new(context: WaveletOperationContext, kind: WaveletOperationKind) -> Self {
        Self { context, kind }
    }

    pub fn add_participant(context: WaveletOperationContext, participant: ParticipantId) -> Self {
        Self::new(context, WaveletOperationKind::AddParticipant(participant))
    }

    pub fn remove_participant(
        context: WaveletOperationContext,
        participant: ParticipantId,
    ) -> Self {
        Self::new(context, WaveletOperationKind::RemoveParticipant(participant))
    }

    pub fn document(context: WaveletOperationContext, document_id: DocumentId, op: DocOp) -> Self {
        Self::new(context, WaveletOperationKind::Document { document_id, op })
    }

    pub fn no_op(context: WaveletOperationContext) -> Self {
        Self::new(context, WaveletOperationKind::NoOp)
    }

    pub fn version_update(context: WaveletOperationContext) -> Self {
        Self::new(context, WaveletOperationKind::VersionUpdate)
    }

    pub fn creator(&self) -> &ParticipantId {
        &self.context.creator
    }

    /// The document this operation edits, if it is a document operation.
    pub fn document_id(&self) -> Option<&DocumentId> {
        match &self.kind {
            WaveletOperationKind::Document { document_id, .. } => Some(document_id),
            _ => None,
        }
    }

    /// Whether the operation changes nothing but the version.
    pub fn is_no_op_or_version_update(&self) -> bool {
        matches!(
            self.kind,
            WaveletOperationKind::NoOp | WaveletOperationKind::VersionUpdate
        )
    }

    /// Canonical bytes of the creator and kind, used for version hashing.
    ///
    /// The timestamp and version stamps are not part of the encoding.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, CoreError> {
        let creator = Value::Text(self.context.creator.address().to_string());
        let tagged = |tag: u64, mut fields: Vec<Value>| {
            fields.insert(0, Value::Integer(tag.into()));
            fields.insert(0, creator.clone());
            Value::Array(fields)
        };
        let value = match &self.kind {
            WaveletOperationKind::AddParticipant(p) => tagged(
                tags::ADD_PARTICIPANT,
                vec![Value::Text(p.address().to_string())],
            ),
            WaveletOperationKind::RemoveParticipant(p) => tagged(
                tags::REMOVE_PARTICIPANT,
                vec![Value::Text(p.address().to_string())],
            ),
            WaveletOperationKind::Document { document_id, op } => tagged(
                tags::DOCUMENT,
                vec![Value::Text(document_id.to_string()), doc_op_value(op)],
            ),
            WaveletOperationKind::NoOp => tagged(tags::NO_OP, Vec::new()),
            WaveletOperationKind::VersionUpdate => tagged(tags::VERSION_UPDATE, Vec::new()),
        };
        encode_canonical(&value)
    }
}

impl fmt::Display for WaveletOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.kind, self.context.creator)
    }
}

/// Current time in Unix milliseconds.
pub fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
