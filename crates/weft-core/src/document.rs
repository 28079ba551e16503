//! An in-memory document: a flat sequence of items forming a tree.
//!
//! Each item is a character, an element start or an element end, and
//! carries its own annotation values.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::annotations::{annotate, apply_boundary, ActiveAnnotations};
use crate::attributes::Attributes;
use crate::docop::{Component, DocOp};
use crate::error::ApplyError;
use crate::validation::validate;

/// What an item is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Char(char),
    Start { tag: String, attributes: Attributes },
    End,
}

/// One document item with its annotation values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ItemKind,
    pub annotations: BTreeMap<String, String>,
}

impl Item {
    fn inserted(kind: ItemKind, active: &ActiveAnnotations) -> Self {
        let annotations = active
            .iter()
            .filter_map(|(key, change)| change.new.clone().map(|value| (key.clone(), value)))
            .collect();
        Self { kind, annotations }
    }
}

/// A document state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    items: Vec<Item>,
}

impl Document {
    /// The empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// The document an insertion-only operation produces from nothing.
    pub fn from_op(op: &DocOp) -> Result<Self, ApplyError> {
        Self::new().apply(op)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The character content, without markup.
    pub fn text(&self) -> String {
        self.items
            .iter()
            .filter_map(|item| match item.kind {
                ItemKind::Char(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    /// Annotation values of the item at `index`.
    pub fn annotations_at(&self, index: usize) -> Option<&BTreeMap<String, String>> {
        self.items.get(index).map(|item| &item.annotations)
    }

    /// An operation that retains the whole document.
    pub fn identity(&self) -> DocOp {
        DocOp::identity(self.len())
    }

    /// Apply `op`, producing the resulting document.
    ///
    /// Deletions and attribute changes must match the content they touch.
    /// Annotation old values are not checked.
    pub fn apply(&self, op: &DocOp) -> Result<Document, ApplyError> {
        validate(op)?;

        let len = self.items.len();
        let mut out = Vec::with_capacity(len + op.output_len());
        let mut position = 0usize;
        let mut active = ActiveAnnotations::new();

        for (index, component) in op.components().iter().enumerate() {
            let consumed = component.input_len();
            if position + consumed > len {
                return Err(ApplyError::PastEnd { index, len });
            }
            let mismatch = |position: usize, reason: String| ApplyError::Mismatch {
                index,
                position,
                reason,
            };

            match component {
                Component::Retain(n) => {
                    for item in &self.items[position..position + n] {
                        let mut item = item.clone();
                        annotate(&mut item.annotations, &active);
                        out.push(item);
                    }
                }
                Component::Characters(s) => {
                    out.extend(s.chars().map(|c| Item::inserted(ItemKind::Char(c), &active)));
                }
                Component::ElementStart { tag, attributes } => {
                    out.push(Item::inserted(
                        ItemKind::Start {
                            tag: tag.clone(),
                            attributes: attributes.clone(),
                        },
                        &active,
                    ));
                }
                Component::ElementEnd => out.push(Item::inserted(ItemKind::End, &active)),
                Component::DeleteCharacters(s) => {
                    for (offset, expected) in s.chars().enumerate() {
                        let at = position + offset;
                        if self.items[at].kind != ItemKind::Char(expected) {
                            return Err(mismatch(
                                at,
                                format!("expected character {:?}", expected),
                            ));
                        }
                    }
                }
                Component::DeleteElementStart { tag, attributes } => {
                    let expected = ItemKind::Start {
                        tag: tag.clone(),
                        attributes: attributes.clone(),
                    };
                    if self.items[position].kind != expected {
                        return Err(mismatch(position, format!("expected start of <{}>", tag)));
                    }
                }
                Component::DeleteElementEnd => {
                    if self.items[position].kind != ItemKind::End {
                        return Err(mismatch(position, "expected element end".into()));
                    }
                }
                Component::ReplaceAttributes { old, new } => match &self.items[position].kind {
                    ItemKind::Start { tag, attributes } if attributes == old => {
                        let mut item = Item {
                            kind: ItemKind::Start {
                                tag: tag.clone(),
                                attributes: new.clone(),
                            },
                            annotations: self.items[position].annotations.clone(),
                        };
                        annotate(&mut item.annotations, &active);
                        out.push(item);
                    }
                    _ => {
                        return Err(mismatch(
                            position,
                            "old attributes do not match element".into(),
                        ))
                    }
                },
                Component::UpdateAttributes(update) => match &self.items[position].kind {
                    ItemKind::Start { tag, attributes } if update.matches(attributes) => {
                        let mut item = Item {
                            kind: ItemKind::Start {
                                tag: tag.clone(),
                                attributes: attributes.updated(update),
                            },
                            annotations: self.items[position].annotations.clone(),
                        };
                        annotate(&mut item.annotations, &active);
                        out.push(item);
                    }
                    _ => {
                        return Err(mismatch(
                            position,
                            "update old values do not match element".into(),
                        ))
                    }
                },
                Component::AnnotationBoundary(boundary) => {
                    apply_boundary(&mut active, boundary)?;
                }
            }
            position += consumed;
        }

        if position != len {
            return Err(ApplyError::TooShort {
                covered: position,
                len,
            });
        }
        if !is_balanced(&out) {
            return Err(ApplyError::Unbalanced);
        }
        Ok(Document { items: out })
    }

    /// Render as XML, without annotations.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        let mut open: Vec<&str> = Vec::new();
        for item in &self.items {
            match &item.kind {
                ItemKind::Char(c) => match c {
                    '<' => xml.push_str("&lt;"),
                    '>' => xml.push_str("&gt;"),
                    '&' => xml.push_str("&amp;"),
                    c => xml.push(*c),
                },
                ItemKind::Start { tag, attributes } => {
                    xml.push('<');
                    xml.push_str(tag);
                    for (key, value) in attributes.iter() {
                        xml.push_str(&format!(" {}=\"{}\"", key, value.replace('"', "&quot;")));
                    }
                    xml.push('>');
                    open.push(tag);
                }
                ItemKind::End => {
                    xml.push_str("</");
                    xml.push_str(open.pop().unwrap_or_default());
                    xml.push('>');
                }
            }
        }
        xml
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

fn is_balanced(items: &[Item]) -> bool {
    let mut depth = 0usize;
    for item in items {
        match item.kind {
            ItemKind::Start { .. } => depth += 1,
            ItemKind::End => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            ItemKind::Char(_) => {}
        }
    }
    depth == 0
}
