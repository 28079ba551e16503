//! Document operations: components, the cursor interface and the
//! normalising builder.
//!
//! A [`DocOp`] is an edit script walked from the start of a document to its
//! end. Every component either consumes items of the input document
//! (retain, deletions, attribute changes), produces items of the output
//! document (retain, insertions, attribute changes), or neither (annotation
//! boundaries).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::annotations::{ActiveAnnotations, AnnotationBoundary};
use crate::attributes::{Attributes, AttributesUpdate};

/// One component of a document operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Retain(usize),
    Characters(String),
    ElementStart { tag: String, attributes: Attributes },
    ElementEnd,
    DeleteCharacters(String),
    DeleteElementStart { tag: String, attributes: Attributes },
    DeleteElementEnd,
    ReplaceAttributes { old: Attributes, new: Attributes },
    UpdateAttributes(AttributesUpdate),
    AnnotationBoundary(AnnotationBoundary),
}

impl Component {
    /// Number of input-document items this component consumes.
    pub fn input_len(&self) -> usize {
        match self {
            Component::Retain(n) => *n,
            Component::DeleteCharacters(s) => s.chars().count(),
            Component::DeleteElementStart { .. }
            | Component::DeleteElementEnd
            | Component::ReplaceAttributes { .. }
            | Component::UpdateAttributes(_) => 1,
            Component::Characters(_)
            | Component::ElementStart { .. }
            | Component::ElementEnd
            | Component::AnnotationBoundary(_) => 0,
        }
    }

    /// Number of output-document items this component produces.
    pub fn output_len(&self) -> usize {
        match self {
            Component::Retain(n) => *n,
            Component::Characters(s) => s.chars().count(),
            Component::ElementStart { .. }
            | Component::ElementEnd
            | Component::ReplaceAttributes { .. }
            | Component::UpdateAttributes(_) => 1,
            Component::DeleteCharacters(_)
            | Component::DeleteElementStart { .. }
            | Component::DeleteElementEnd
            | Component::AnnotationBoundary(_) => 0,
        }
    }

    pub fn is_insertion(&self) -> bool {
        matches!(
            self,
            Component::Characters(_) | Component::ElementStart { .. } | Component::ElementEnd
        )
    }

    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            Component::DeleteCharacters(_)
                | Component::DeleteElementStart { .. }
                | Component::DeleteElementEnd
        )
    }

    pub fn is_attribute_change(&self) -> bool {
        matches!(
            self,
            Component::ReplaceAttributes { .. } | Component::UpdateAttributes(_)
        )
    }

    pub fn is_boundary(&self) -> bool {
        matches!(self, Component::AnnotationBoundary(_))
    }

    /// Whether this component has no effect and no length.
    pub fn is_empty(&self) -> bool {
        match self {
            Component::Retain(n) => *n == 0,
            Component::Characters(s) | Component::DeleteCharacters(s) => s.is_empty(),
            Component::AnnotationBoundary(b) => b.is_empty(),
            _ => false,
        }
    }

    /// The component with insertion and deletion swapped and every change
    /// reversed.
    pub fn inverted(&self) -> Component {
        match self {
            Component::Retain(n) => Component::Retain(*n),
            Component::Characters(s) => Component::DeleteCharacters(s.clone()),
            Component::ElementStart { tag, attributes } => Component::DeleteElementStart {
                tag: tag.clone(),
                attributes: attributes.clone(),
            },
            Component::ElementEnd => Component::DeleteElementEnd,
            Component::DeleteCharacters(s) => Component::Characters(s.clone()),
            Component::DeleteElementStart { tag, attributes } => Component::ElementStart {
                tag: tag.clone(),
                attributes: attributes.clone(),
            },
            Component::DeleteElementEnd => Component::ElementEnd,
            Component::ReplaceAttributes { old, new } => Component::ReplaceAttributes {
                old: new.clone(),
                new: old.clone(),
            },
            Component::UpdateAttributes(u) => Component::UpdateAttributes(u.invert()),
            Component::AnnotationBoundary(b) => Component::AnnotationBoundary(b.inverted()),
        }
    }

    /// Split a ranged component after `n` units.
    ///
    /// Only retains and character runs have more than one unit; any other
    /// component is returned whole.
    pub fn split_at(self, n: usize) -> (Component, Option<Component>) {
        match self {
            Component::Retain(total) if n < total => {
                (Component::Retain(n), Some(Component::Retain(total - n)))
            }
            Component::Characters(s) => match split_chars(s, n) {
                (head, Some(tail)) => (
                    Component::Characters(head),
                    Some(Component::Characters(tail)),
                ),
                (head, None) => (Component::Characters(head), None),
            },
            Component::DeleteCharacters(s) => match split_chars(s, n) {
                (head, Some(tail)) => (
                    Component::DeleteCharacters(head),
                    Some(Component::DeleteCharacters(tail)),
                ),
                (head, None) => (Component::DeleteCharacters(head), None),
            },
            other => (other, None),
        }
    }
}

fn split_chars(s: String, n: usize) -> (String, Option<String>) {
    match s.char_indices().nth(n) {
        Some((at, _)) if at > 0 => {
            let mut head = s;
            let tail = head.split_off(at);
            (head, Some(tail))
        }
        _ => (s, None),
    }
}

/// Receives the components of an operation one at a time.
pub trait DocOpCursor {
    fn retain(&mut self, count: usize);
    fn characters(&mut self, chars: &str);
    fn element_start(&mut self, tag: &str, attributes: &Attributes);
    fn element_end(&mut self);
    fn delete_characters(&mut self, chars: &str);
    fn delete_element_start(&mut self, tag: &str, attributes: &Attributes);
    fn delete_element_end(&mut self);
    fn replace_attributes(&mut self, old: &Attributes, new: &Attributes);
    fn update_attributes(&mut self, update: &AttributesUpdate);
    fn annotation_boundary(&mut self, boundary: &AnnotationBoundary);
}

/// An immutable document operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocOp {
    components: Vec<Component>,
}

impl DocOp {
    /// Wrap components as they are, without normalisation.
    pub fn from_components(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// Start building an operation.
    pub fn builder() -> DocOpBuilder {
        DocOpBuilder::new()
    }

    /// An operation that retains `len` items.
    pub fn identity(len: usize) -> Self {
        DocOpBuilder::new().retain(len).build()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Number of components.
    pub fn size(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Length of the document this operation applies to.
    pub fn input_len(&self) -> usize {
        self.components.iter().map(Component::input_len).sum()
    }

    /// Length of the document this operation produces.
    pub fn output_len(&self) -> usize {
        self.components.iter().map(Component::output_len).sum()
    }

    /// Whether the operation only retains.
    pub fn is_identity(&self) -> bool {
        self.components
            .iter()
            .all(|c| matches!(c, Component::Retain(_)))
    }

    /// Feed component `index` to `cursor`.
    ///
    /// Panics if `index` is out of range, like slice indexing.
    pub fn apply_component<C: DocOpCursor + ?Sized>(&self, index: usize, cursor: &mut C) {
        match &self.components[index] {
            Component::Retain(n) => cursor.retain(*n),
            Component::Characters(s) => cursor.characters(s),
            Component::ElementStart { tag, attributes } => cursor.element_start(tag, attributes),
            Component::ElementEnd => cursor.element_end(),
            Component::DeleteCharacters(s) => cursor.delete_characters(s),
            Component::DeleteElementStart { tag, attributes } => {
                cursor.delete_element_start(tag, attributes)
            }
            Component::DeleteElementEnd => cursor.delete_element_end(),
            Component::ReplaceAttributes { old, new } => cursor.replace_attributes(old, new),
            Component::UpdateAttributes(u) => cursor.update_attributes(u),
            Component::AnnotationBoundary(b) => cursor.annotation_boundary(b),
        }
    }

    /// Feed every component to `cursor` in order.
    pub fn apply_to<C: DocOpCursor + ?Sized>(&self, cursor: &mut C) {
        for index in 0..self.size() {
            self.apply_component(index, cursor);
        }
    }

    /// The operation that undoes this one.
    pub fn invert(&self) -> DocOp {
        crate::invert::invert(self)
    }
}

impl fmt::Display for DocOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.components {
            match c {
                Component::Retain(n) => write!(f, "__{}; ", n)?,
                Component::Characters(s) => write!(f, "++{:?}; ", s)?,
                Component::ElementStart { tag, attributes } => {
                    write!(f, "<< {}{}; ", tag, AttrsDisplay(attributes))?
                }
                Component::ElementEnd => write!(f, ">>; ")?,
                Component::DeleteCharacters(s) => write!(f, "--{:?}; ", s)?,
                Component::DeleteElementStart { tag, attributes } => {
                    write!(f, "x< {}{}; ", tag, AttrsDisplay(attributes))?
                }
                Component::DeleteElementEnd => write!(f, "x>; ")?,
                Component::ReplaceAttributes { old, new } => write!(
                    f,
                    "r@{} -> {}; ",
                    AttrsDisplay(old),
                    AttrsDisplay(new)
                )?,
                Component::UpdateAttributes(u) => {
                    write!(f, "u@")?;
                    for change in u.changes() {
                        write!(f, " {}: {:?} -> {:?}", change.key, change.old, change.new)?;
                    }
                    write!(f, "; ")?
                }
                Component::AnnotationBoundary(b) => {
                    write!(f, "||")?;
                    for key in &b.ends {
                        write!(f, " end {}", key)?;
                    }
                    for (key, change) in &b.changes {
                        write!(f, " {}: {:?} -> {:?}", key, change.old, change.new)?;
                    }
                    write!(f, "; ")?
                }
            }
        }
        Ok(())
    }
}

struct AttrsDisplay<'a>(&'a Attributes);

impl fmt::Display for AttrsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " {{")?;
        for (i, (k, v)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", k, v)?;
        }
        write!(f, "}}")
    }
}

/// Builds a [`DocOp`] incrementally, normalising as it goes.
///
/// - adjacent retains, character insertions and character deletions merge;
/// - empty components are dropped;
/// - an empty attribute update becomes `retain(1)`;
/// - consecutive annotation boundaries fold into one boundary, computed as
///   the difference between the annotations active before and after them.
#[derive(Debug, Default)]
pub struct DocOpBuilder {
    components: Vec<Component>,
    active: ActiveAnnotations,
    pending: Option<ActiveAnnotations>,
}

impl DocOpBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retain(&mut self, count: usize) -> &mut Self {
        self.push(Component::Retain(count))
    }

    pub fn characters(&mut self, chars: &str) -> &mut Self {
        self.push(Component::Characters(chars.to_string()))
    }

    pub fn element_start(&mut self, tag: &str, attributes: Attributes) -> &mut Self {
        self.push(Component::ElementStart {
            tag: tag.to_string(),
            attributes,
        })
    }

    pub fn element_end(&mut self) -> &mut Self {
        self.push(Component::ElementEnd)
    }

    pub fn delete_characters(&mut self, chars: &str) -> &mut Self {
        self.push(Component::DeleteCharacters(chars.to_string()))
    }

    pub fn delete_element_start(&mut self, tag: &str, attributes: Attributes) -> &mut Self {
        self.push(Component::DeleteElementStart {
            tag: tag.to_string(),
            attributes,
        })
    }

    pub fn delete_element_end(&mut self) -> &mut Self {
        self.push(Component::DeleteElementEnd)
    }

    pub fn replace_attributes(&mut self, old: Attributes, new: Attributes) -> &mut Self {
        self.push(Component::ReplaceAttributes { old, new })
    }

    pub fn update_attributes(&mut self, update: AttributesUpdate) -> &mut Self {
        self.push(Component::UpdateAttributes(update))
    }

    pub fn annotation_boundary(&mut self, boundary: AnnotationBoundary) -> &mut Self {
        self.push(Component::AnnotationBoundary(boundary))
    }

    /// Make `desired` the active annotation changes for the components that
    /// follow, emitting whatever boundary that takes.
    pub fn set_annotations(&mut self, desired: &ActiveAnnotations) -> &mut Self {
        self.pending = Some(desired.clone());
        self
    }

    /// The annotation changes active for the next component.
    pub fn annotations(&self) -> &ActiveAnnotations {
        self.pending.as_ref().unwrap_or(&self.active)
    }

    /// Append a component.
    pub fn push(&mut self, component: Component) -> &mut Self {
        match component {
            Component::AnnotationBoundary(boundary) => {
                let mut desired = self.pending.take().unwrap_or_else(|| self.active.clone());
                for key in &boundary.ends {
                    desired.remove(key);
                }
                for (key, change) in boundary.changes {
                    desired.insert(key, change);
                }
                self.pending = Some(desired);
            }
            Component::UpdateAttributes(update) if update.is_empty() => {
                self.push(Component::Retain(1));
            }
            other if other.is_empty() => {}
            other => {
                self.flush_annotations();
                match (self.components.last_mut(), other) {
                    (Some(Component::Retain(n)), Component::Retain(m)) => *n += m,
                    (Some(Component::Characters(s)), Component::Characters(t)) => s.push_str(&t),
                    (Some(Component::DeleteCharacters(s)), Component::DeleteCharacters(t)) => {
                        s.push_str(&t)
                    }
                    (_, other) => self.components.push(other),
                }
            }
        }
        self
    }

    fn flush_annotations(&mut self) {
        if let Some(desired) = self.pending.take() {
            let boundary = AnnotationBoundary::between(&self.active, &desired);
            if !boundary.is_empty() {
                self.components.push(Component::AnnotationBoundary(boundary));
            }
            self.active = desired;
        }
    }

    /// Finish the operation and reset the builder.
    pub fn build(&mut self) -> DocOp {
        self.flush_annotations();
        self.active.clear();
        DocOp {
            components: std::mem::take(&mut self.components),
        }
    }
}

impl DocOpCursor for DocOpBuilder {
    fn retain(&mut self, count: usize) {
        DocOpBuilder::retain(self, count);
    }

    fn characters(&mut self, chars: &str) {
        DocOpBuilder::characters(self, chars);
    }

    fn element_start(&mut self, tag: &str, attributes: &Attributes) {
        DocOpBuilder::element_start(self, tag, attributes.clone());
    }

    fn element_end(&mut self) {
        DocOpBuilder::element_end(self);
    }

    fn delete_characters(&mut self, chars: &str) {
        DocOpBuilder::delete_characters(self, chars);
    }

    fn delete_element_start(&mut self, tag: &str, attributes: &Attributes) {
        DocOpBuilder::delete_element_start(self, tag, attributes.clone());
    }

    fn delete_element_end(&mut self) {
        DocOpBuilder::delete_element_end(self);
    }

    fn replace_attributes(&mut self, old: &Attributes, new: &Attributes) {
        DocOpBuilder::replace_attributes(self, old.clone(), new.clone());
    }

    fn update_attributes(&mut self, update: &AttributesUpdate) {
        DocOpBuilder::update_attributes(self, update.clone());
    }

    fn annotation_boundary(&mut self, boundary: &AnnotationBoundary) {
        DocOpBuilder::annotation_boundary(self, boundary.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_merges_adjacent_components() {
        let op = DocOpBuilder::new()
            .retain(1)
            .retain(2)
            .characters("ab")
            .characters("c")
            .delete_characters("x")
            .delete_characters("y")
            .retain(0)
            .characters("")
            .build();
        assert_eq!(
            op.components(),
            &[
                Component::Retain(3),
                Component::Characters("abc".into()),
                Component::DeleteCharacters("xy".into()),
            ]
        );
    }

    #[test]
    fn test_builder_folds_boundaries() {
        let op = DocOpBuilder::new()
            .annotation_boundary(AnnotationBoundary::new().change("a", None, Some("1")))
            .annotation_boundary(AnnotationBoundary::new().change("b", None, Some("2")))
            .retain(1)
            .annotation_boundary(AnnotationBoundary::new().end("a"))
            .annotation_boundary(AnnotationBoundary::new().end("b"))
            .build();
        assert_eq!(op.size(), 3);
        match &op.components()[0] {
            Component::AnnotationBoundary(b) => assert_eq!(b.changes.len(), 2),
            other => panic!("expected boundary, got {:?}", other),
        }
        match &op.components()[2] {
            Component::AnnotationBoundary(b) => assert_eq!(b.ends.len(), 2),
            other => panic!("expected boundary, got {:?}", other),
        }
    }

    #[test]
    fn test_builder_drops_boundary_that_cancels() {
        let op = DocOpBuilder::new()
            .retain(1)
            .annotation_boundary(AnnotationBoundary::new().change("a", None, Some("1")))
            .annotation_boundary(AnnotationBoundary::new().end("a"))
            .retain(1)
            .build();
        assert_eq!(op.components(), &[Component::Retain(2)]);
    }

    #[test]
    fn test_empty_update_becomes_retain() {
        let op = DocOpBuilder::new()
            .retain(1)
            .update_attributes(AttributesUpdate::new())
            .build();
        assert_eq!(op.components(), &[Component::Retain(2)]);
    }

    #[test]
    fn test_lengths() {
        let op = DocOpBuilder::new()
            .retain(2)
            .characters("héllo")
            .element_start("p", Attributes::new())
            .element_end()
            .delete_characters("xy")
            .retain(1)
            .build();
        assert_eq!(op.input_len(), 5);
        assert_eq!(op.output_len(), 10);
    }

    #[test]
    fn test_split_at_respects_char_boundaries() {
        let (head, tail) = Component::Characters("héllo".into()).split_at(2);
        assert_eq!(head, Component::Characters("hé".into()));
        assert_eq!(tail, Some(Component::Characters("llo".into())));

        let (head, tail) = Component::Retain(3).split_at(3);
        assert_eq!(head, Component::Retain(3));
        assert_eq!(tail, None);
    }

    #[test]
    fn test_apply_to_replays_through_builder() {
        let op = DocOpBuilder::new()
            .retain(1)
            .element_start("p", Attributes::new().with("k", "v"))
            .characters("x")
            .element_end()
            .build();
        let mut copy = DocOpBuilder::new();
        op.apply_to(&mut copy);
        assert_eq!(copy.build(), op);
    }

    #[test]
    fn test_display_is_concise() {
        let op = DocOpBuilder::new().retain(2).characters("X").retain(1).build();
        assert_eq!(op.to_string(), "__2; ++\"X\"; __1; ");
    }

    #[test]
    fn test_json_roundtrip() {
        let op = DocOpBuilder::new()
            .retain(1)
            .replace_attributes(Attributes::new(), Attributes::new().with("a", "1"))
            .build();
        let json = serde_json::to_string(&op).unwrap();
        let back: DocOp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, op);
    }
}
