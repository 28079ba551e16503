//! Canonical CBOR encoding for deterministic serialization.
//!
//! This module implements RFC 8949 Core Deterministic Encoding:
//! - Map keys sorted by encoded byte comparison
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - No floats
//!
//! The canonical encoding feeds the wavelet version hash chain, so the same
//! operation must produce identical bytes on every replica.

use ciborium::value::Value;

use crate::annotations::AnnotationBoundary;
use crate::attributes::{Attributes, AttributesUpdate};
use crate::docop::{Component, DocOp};
use crate::error::CoreError;

/// Component tags (integer discriminators for compact encoding).
///
/// Tags 0-23 encode as single bytes in CBOR.
mod tags {
    pub const RETAIN: u64 = 0;
    pub const CHARACTERS: u64 = 1;
    pub const ELEMENT_START: u64 = 2;
    pub const ELEMENT_END: u64 = 3;
    pub const DELETE_CHARACTERS: u64 = 4;
    pub const DELETE_ELEMENT_START: u64 = 5;
    pub const DELETE_ELEMENT_END: u64 = 6;
    pub const REPLACE_ATTRIBUTES: u64 = 7;
    pub const UPDATE_ATTRIBUTES: u64 = 8;
    pub const ANNOTATION_BOUNDARY: u64 = 9;
}

/// Encode a document operation to canonical CBOR bytes.
pub fn canonical_bytes(op: &DocOp) -> Result<Vec<u8>, CoreError> {
    encode_canonical(&doc_op_value(op))
}

/// Convert a document operation to a CBOR value: an array of components,
/// each an array headed by its tag.
pub fn doc_op_value(op: &DocOp) -> Value {
    Value::Array(op.components().iter().map(component_value).collect())
}

fn tagged(tag: u64, mut fields: Vec<Value>) -> Value {
    fields.insert(0, Value::Integer(tag.into()));
    Value::Array(fields)
}

fn optional_text(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

fn attributes_value(attributes: &Attributes) -> Value {
    Value::Map(
        attributes
            .iter()
            .map(|(k, v)| (Value::Text(k.to_string()), Value::Text(v.to_string())))
            .collect(),
    )
}

fn update_value(update: &AttributesUpdate) -> Value {
    Value::Array(
        update
            .changes()
            .iter()
            .map(|c| {
                Value::Array(vec![
                    Value::Text(c.key.clone()),
                    optional_text(&c.old),
                    optional_text(&c.new),
                ])
            })
            .collect(),
    )
}

fn boundary_value(boundary: &AnnotationBoundary) -> Value {
    let ends = boundary
        .ends
        .iter()
        .map(|k| Value::Text(k.clone()))
        .collect();
    let changes = boundary
        .changes
        .iter()
        .map(|(k, change)| {
            (
                Value::Text(k.clone()),
                Value::Array(vec![optional_text(&change.old), optional_text(&change.new)]),
            )
        })
        .collect();
    Value::Array(vec![Value::Array(ends), Value::Map(changes)])
}

fn component_value(component: &Component) -> Value {
    match component {
        Component::Retain(n) => tagged(tags::RETAIN, vec![Value::Integer((*n as u64).into())]),
        Component::Characters(s) => tagged(tags::CHARACTERS, vec![Value::Text(s.clone())]),
        Component::ElementStart { tag, attributes } => tagged(
            tags::ELEMENT_START,
            vec![Value::Text(tag.clone()), attributes_value(attributes)],
        ),
        Component::ElementEnd => tagged(tags::ELEMENT_END, Vec::new()),
        Component::DeleteCharacters(s) => {
            tagged(tags::DELETE_CHARACTERS, vec![Value::Text(s.clone())])
        }
        Component::DeleteElementStart { tag, attributes } => tagged(
            tags::DELETE_ELEMENT_START,
            vec![Value::Text(tag.clone()), attributes_value(attributes)],
        ),
        Component::DeleteElementEnd => tagged(tags::DELETE_ELEMENT_END, Vec::new()),
        Component::ReplaceAttributes { old, new } => tagged(
            tags::REPLACE_ATTRIBUTES,
            vec![attributes_value(old), attributes_value(new)],
        ),
        Component::UpdateAttributes(update) => {
            tagged(tags::UPDATE_ATTRIBUTES, vec![update_value(update)])
        }
        Component::AnnotationBoundary(boundary) => {
            tagged(tags::ANNOTATION_BOUNDARY, vec![boundary_value(boundary)])
        }
    }
}

/// Encode a CBOR Value to canonical bytes.
///
/// This function ensures:
/// - Map keys are sorted by encoded byte comparison
/// - Integers use smallest encoding
/// - Definite lengths only
pub fn encode_canonical(value: &Value) -> Result<Vec<u8>, CoreError> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value)?;
    Ok(buf)
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) -> Result<(), CoreError> {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(items) => {
            encode_uint(buf, 4, items.len() as u64);
            for item in items {
                encode_value_to(buf, item)?;
            }
        }
        Value::Map(entries) => encode_map_canonical(buf, entries)?,
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        Value::Float(_) => return Err(CoreError::UnsupportedValue("float")),
        _ => return Err(CoreError::UnsupportedValue("tag or unknown simple value")),
    }
    Ok(())
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a map canonically (major type 5).
///
/// Keys are sorted by their encoded byte comparison.
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) -> Result<(), CoreError> {
    let mut pairs = Vec::with_capacity(entries.len());
    for (k, v) in entries {
        let mut key_buf = Vec::new();
        encode_value_to(&mut key_buf, k)?;
        pairs.push((key_buf, v));
    }
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    encode_uint(buf, 5, pairs.len() as u64);
    for (key_bytes, value) in pairs {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value)?;
    }
    Ok(())
}
