//! Sequential composition of document operations.
//!
//! `compose(a, b)` walks `a`'s output and `b`'s input in lockstep. The
//! result applies to `a`'s input document and produces `b`'s output
//! document.

use crate::annotations::{apply_boundary, ActiveAnnotations, ValueChange};
use crate::attributes::Attributes;
use crate::docop::{Component, DocOp, DocOpBuilder};
use crate::error::ComposeError;

/// Compose two operations: the result has the effect of `a` followed by `b`.
pub fn compose(a: &DocOp, b: &DocOp) -> Result<DocOp, ComposeError> {
    if a.output_len() != b.input_len() {
        return Err(ComposeError::LengthMismatch {
            first: a.output_len(),
            second: b.input_len(),
        });
    }
    Composer::new(a, b).run()
}

/// Compose a sequence of operations left to right.
///
/// An empty sequence composes to the empty operation.
pub fn compose_all(ops: &[DocOp]) -> Result<DocOp, ComposeError> {
    let mut iter = ops.iter();
    let first = match iter.next() {
        Some(op) => op.clone(),
        None => return Ok(DocOp::default()),
    };
    iter.try_fold(first, |acc, op| compose(&acc, op))
}

/// Cursor over an operation's components that can hand out partial pieces.
struct Walker<'a> {
    components: &'a [Component],
    next: usize,
    current: Option<Component>,
}

impl<'a> Walker<'a> {
    fn new(op: &'a DocOp) -> Self {
        let mut walker = Self {
            components: op.components(),
            next: 0,
            current: None,
        };
        walker.fill();
        walker
    }

    fn fill(&mut self) {
        if self.current.is_none() && self.next < self.components.len() {
            self.current = Some(self.components[self.next].clone());
            self.next += 1;
        }
    }

    fn peek(&self) -> Option<&Component> {
        self.current.as_ref()
    }

    fn pending(&self) -> Vec<&Component> {
        self.current
            .iter()
            .chain(self.components[self.next..].iter())
            .collect()
    }

    fn take_whole(&mut self) -> Option<Component> {
        let taken = self.current.take();
        self.fill();
        taken
    }

    fn take(&mut self, n: usize) -> Option<Component> {
        let (head, tail) = self.current.take()?.split_at(n);
        self.current = tail;
        self.fill();
        Some(head)
    }

    /// Drop `n` units of pending content.
    fn skip_units(&mut self, mut n: usize) {
        while n > 0 {
            let len = match self.peek() {
                Some(c) if c.is_deletion() => c.input_len(),
                Some(c) => c.output_len(),
                None => return,
            };
            self.take(n.min(len));
            n -= n.min(len);
        }
    }
}

#[derive(PartialEq)]
enum Unit<'a> {
    Char(char),
    Start(&'a str, &'a Attributes),
    End,
}

/// The units of one complete element that `components` insert or delete,
/// or `None` if the element is interrupted by anything else.
fn element_units<'a>(components: Vec<&'a Component>, deleted: bool) -> Option<Vec<Unit<'a>>> {
    let mut units = Vec::new();
    let mut depth = 0usize;
    for component in components {
        match (component, deleted) {
            (Component::ElementStart { tag, attributes }, false)
            | (Component::DeleteElementStart { tag, attributes }, true) => {
                depth += 1;
                units.push(Unit::Start(tag, attributes));
            }
            (Component::ElementEnd, false) | (Component::DeleteElementEnd, true) => {
                depth = depth.checked_sub(1)?;
                units.push(Unit::End);
                if depth == 0 {
                    return Some(units);
                }
            }
            (Component::Characters(s), false) | (Component::DeleteCharacters(s), true) => {
                units.extend(s.chars().map(Unit::Char));
            }
            _ => return None,
        }
    }
    None
}

fn combine(a: &ActiveAnnotations, b: &ActiveAnnotations) -> ActiveAnnotations {
    let mut combined = a.clone();
    for (key, change) in b {
        let old = match a.get(key) {
            Some(first) => first.old.clone(),
            None => change.old.clone(),
        };
        combined.insert(
            key.clone(),
            ValueChange {
                old,
                new: change.new.clone(),
            },
        );
    }
    combined
}

struct Composer<'a> {
    a: Walker<'a>,
    b: Walker<'a>,
    a_active: ActiveAnnotations,
    b_active: ActiveAnnotations,
    out: DocOpBuilder,
    /// Open deleted elements in the output.
    deleting: usize,
    /// Open inserted elements in the output.
    inserting: usize,
}

impl<'a> Composer<'a> {
    fn new(a: &'a DocOp, b: &'a DocOp) -> Self {
        Self {
            a: Walker::new(a),
            b: Walker::new(b),
            a_active: ActiveAnnotations::new(),
            b_active: ActiveAnnotations::new(),
            out: DocOpBuilder::new(),
            deleting: 0,
            inserting: 0,
        }
    }

    fn run(mut self) -> Result<DocOp, ComposeError> {
        loop {
            if let Some(Component::AnnotationBoundary(boundary)) = self.a.peek() {
                apply_boundary(&mut self.a_active, boundary)?;
                self.a.take_whole();
                continue;
            }
            if let Some(Component::AnnotationBoundary(boundary)) = self.b.peek() {
                apply_boundary(&mut self.b_active, boundary)?;
                self.b.take_whole();
                continue;
            }
            if self.cancel_reinsertion() {
                continue;
            }
            if self.a.peek().map_or(false, Component::is_deletion) {
                if let Some(piece) = self.a.take_whole() {
                    self.emit(piece);
                }
                continue;
            }
            if self.b.peek().map_or(false, Component::is_insertion) {
                if let Some(piece) = self.b.take_whole() {
                    let active = self.b_active.clone();
                    self.out.set_annotations(&active);
                    self.emit(piece);
                }
                continue;
            }
            let (a_len, b_len) = match (self.a.peek(), self.b.peek()) {
                (None, None) => break,
                (Some(a), Some(b)) => (a.output_len(), b.input_len()),
                (a, b) => {
                    return Err(ComposeError::Incompatible(format!(
                        "unmatched component {:?} against {:?}",
                        a, b
                    )))
                }
            };
            if a_len == 0 {
                self.a.take_whole();
                continue;
            }
            if b_len == 0 {
                self.b.take_whole();
                continue;
            }
            let n = a_len.min(b_len);
            if let (Some(a_piece), Some(b_piece)) = (self.a.take(n), self.b.take(n)) {
                self.aligned(a_piece, b_piece)?;
            }
        }
        self.out.set_annotations(&ActiveAnnotations::new());
        Ok(self.out.build())
    }

    /// An `a` deletion followed by a `b` insertion of the same content
    /// becomes a retain, when no annotation change is active on either side.
    fn cancel_reinsertion(&mut self) -> bool {
        if self.deleting > 0
            || self.inserting > 0
            || !self.a_active.is_empty()
            || !self.b_active.is_empty()
        {
            return false;
        }
        let n = match (self.a.peek(), self.b.peek()) {
            (Some(Component::DeleteCharacters(deleted)), Some(Component::Characters(inserted))) => {
                deleted
                    .chars()
                    .zip(inserted.chars())
                    .take_while(|(d, i)| d == i)
                    .count()
            }
            (Some(Component::DeleteElementStart { .. }), Some(Component::ElementStart { .. })) => {
                match (
                    element_units(self.a.pending(), true),
                    element_units(self.b.pending(), false),
                ) {
                    (Some(deleted), Some(inserted)) if deleted == inserted => deleted.len(),
                    _ => 0,
                }
            }
            _ => 0,
        };
        if n == 0 {
            return false;
        }
        self.out.set_annotations(&ActiveAnnotations::new());
        self.out.retain(n);
        self.a.skip_units(n);
        self.b.skip_units(n);
        true
    }

    fn emit(&mut self, piece: Component) {
        match &piece {
            Component::DeleteElementStart { .. } => self.deleting += 1,
            Component::DeleteElementEnd => self.deleting = self.deleting.saturating_sub(1),
            Component::ElementStart { .. } => self.inserting += 1,
            Component::ElementEnd => self.inserting = self.inserting.saturating_sub(1),
            _ => {}
        }
        self.out.push(piece);
    }

    /// Combine an `a` output piece with the `b` input piece covering the
    /// same items.
    fn aligned(&mut self, a: Component, b: Component) -> Result<(), ComposeError> {
        use Component::*;
        let result = match (a, b) {
            (Retain(_), b) => Some(b),

            (Characters(s), Retain(_)) => Some(Characters(s)),
            (Characters(_), DeleteCharacters(_)) => None,

            (ElementStart { tag, attributes }, Retain(_)) => Some(ElementStart { tag, attributes }),
            (ElementStart { tag, .. }, ReplaceAttributes { new, .. }) => Some(ElementStart {
                tag,
                attributes: new,
            }),
            (ElementStart { tag, attributes }, UpdateAttributes(update)) => Some(ElementStart {
                tag,
                attributes: attributes.updated(&update),
            }),
            (ElementStart { .. }, DeleteElementStart { .. }) => None,

            (ElementEnd, Retain(_)) => Some(ElementEnd),
            (ElementEnd, DeleteElementEnd) => None,

            (ReplaceAttributes { old, new }, Retain(_)) => Some(ReplaceAttributes { old, new }),
            (ReplaceAttributes { old, .. }, ReplaceAttributes { new, .. }) => {
                Some(ReplaceAttributes { old, new })
            }
            (ReplaceAttributes { old, new }, UpdateAttributes(update)) => {
                Some(ReplaceAttributes {
                    old,
                    new: new.updated(&update),
                })
            }
            (ReplaceAttributes { old, .. }, DeleteElementStart { tag, .. }) => {
                Some(DeleteElementStart {
                    tag,
                    attributes: old,
                })
            }

            (UpdateAttributes(update), Retain(_)) => Some(UpdateAttributes(update)),
            (UpdateAttributes(update), ReplaceAttributes { old, new }) => {
                Some(ReplaceAttributes {
                    old: old.updated(&update.invert()),
                    new,
                })
            }
            (UpdateAttributes(first), UpdateAttributes(second)) => {
                Some(UpdateAttributes(first.compose(&second)))
            }
            (UpdateAttributes(update), DeleteElementStart { tag, attributes }) => {
                Some(DeleteElementStart {
                    tag,
                    attributes: attributes.updated(&update.invert()),
                })
            }

            (a, b) => {
                return Err(ComposeError::Incompatible(format!(
                    "{:?} followed by {:?}",
                    a, b
                )))
            }
        };
        if let Some(piece) = result {
            if !piece.is_deletion() {
                let combined = combine(&self.a_active, &self.b_active);
                self.out.set_annotations(&combined);
            }
            self.emit(piece);
        }
        Ok(())
    }
}
