//! Decomposition of an operation into insertion, preservation and deletion
//! parts.
//!
//! Applying the three parts in that order has the same effect as the
//! original operation.

use weft_core::{AnnotationBoundary, Attributes, AttributesUpdate, DocOp, DocOpBuilder, DocOpCursor};

/// The three parts of a decomposed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    /// Insertions only; applies to the original input.
    pub insertion: DocOp,
    /// Attribute changes and annotations only; applies after `insertion`.
    pub preservation: DocOp,
    /// Deletions only; applies after `preservation`.
    pub deletion: DocOp,
}

/// Split `op` into its insertion, preservation and deletion parts.
pub fn decompose(op: &DocOp) -> Decomposition {
    let mut decomposer = Decomposer::default();
    op.apply_to(&mut decomposer);
    Decomposition {
        insertion: decomposer.insertion.build(),
        preservation: decomposer.preservation.build(),
        deletion: decomposer.deletion.build(),
    }
}

#[derive(Default)]
struct Decomposer {
    insertion: DocOpBuilder,
    preservation: DocOpBuilder,
    deletion: DocOpBuilder,
}

impl Decomposer {
    fn inserted(&mut self, len: usize) {
        self.preservation.retain(len);
        self.deletion.retain(len);
    }

    fn deleted(&mut self, len: usize) {
        self.insertion.retain(len);
        self.preservation.retain(len);
    }
}

impl DocOpCursor for Decomposer {
    fn retain(&mut self, count: usize) {
        self.insertion.retain(count);
        self.preservation.retain(count);
        self.deletion.retain(count);
    }

    fn characters(&mut self, chars: &str) {
        self.insertion.characters(chars);
        self.inserted(chars.chars().count());
    }

    fn element_start(&mut self, tag: &str, attributes: &Attributes) {
        self.insertion.element_start(tag, attributes.clone());
        self.inserted(1);
    }

    fn element_end(&mut self) {
        self.insertion.element_end();
        self.inserted(1);
    }

    fn delete_characters(&mut self, chars: &str) {
        self.deleted(chars.chars().count());
        self.deletion.delete_characters(chars);
    }

    fn delete_element_start(&mut self, tag: &str, attributes: &Attributes) {
        self.deleted(1);
        self.deletion.delete_element_start(tag, attributes.clone());
    }

    fn delete_element_end(&mut self) {
        self.deleted(1);
        self.deletion.delete_element_end();
    }

    fn replace_attributes(&mut self, old: &Attributes, new: &Attributes) {
        self.insertion.retain(1);
        self.preservation.replace_attributes(old.clone(), new.clone());
        self.deletion.retain(1);
    }

    fn update_attributes(&mut self, update: &AttributesUpdate) {
        self.insertion.retain(1);
        self.preservation.update_attributes(update.clone());
        self.deletion.retain(1);
    }

    fn annotation_boundary(&mut self, boundary: &AnnotationBoundary) {
        self.preservation.annotation_boundary(boundary.clone());
    }
}
