//! Proptest generators for property-based testing.
//!
//! Documents are a `<body>` holding text runs and `<p a="…">` paragraphs.
//! Operations generated for a document are valid against it: deletions
//! name the content they remove, attribute updates name the current value
//! and annotations open and close within the operation.

use proptest::prelude::*;

use weft_core::{AnnotationBoundary, Attributes, AttributesUpdate, DocOp, Document, ItemKind};

/// Annotation key used by generated operations.
pub const ANNOTATION_KEY: &str = "style/weight";

#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    Paragraph { a: u8, text: String },
}

fn text() -> impl Strategy<Value = String> {
    "[a-e]{1,4}"
}

fn segment() -> impl Strategy<Value = Segment> {
    prop_oneof![
        text().prop_map(Segment::Text),
        (0u8..3, "[a-e]{0,3}").prop_map(|(a, text)| Segment::Paragraph { a, text }),
    ]
}

/// Generate a document.
pub fn document() -> impl Strategy<Value = Document> {
    prop::collection::vec(segment(), 0..5).prop_map(|segments| {
        let mut builder = DocOp::builder();
        builder.element_start("body", Attributes::new());
        for segment in segments {
            match segment {
                Segment::Text(text) => {
                    builder.characters(&text);
                }
                Segment::Paragraph { a, text } => {
                    builder
                        .element_start("p", Attributes::new().with("a", a.to_string()))
                        .characters(&text)
                        .element_end();
                }
            }
        }
        builder.element_end();
        // Insertion-only operations always apply to the empty document.
        Document::from_op(&builder.build()).unwrap_or_default()
    })
}

/// Random choices from which [`build_op`] derives an operation.
#[derive(Debug, Clone)]
struct OpChoices {
    /// One per item: what to do with it.
    items: Vec<u8>,
    /// One per gap before an item: characters to insert there.
    inserts: Vec<Option<String>>,
    /// Gaps at which an annotation starts and ends, as fractions.
    annotation: Option<(u8, u8, bool)>,
}

/// Generate an operation that applies to `doc`.
pub fn doc_op_for(doc: &Document) -> BoxedStrategy<DocOp> {
    let len = doc.len();
    let doc = doc.clone();
    (
        prop::collection::vec(any::<u8>(), len),
        prop::collection::vec(prop::option::weighted(0.2, "[x-z]{1,2}"), len),
        prop::option::weighted(0.3, (any::<u8>(), any::<u8>(), any::<bool>())),
    )
        .prop_map(move |(items, inserts, annotation)| {
            build_op(
                &doc,
                &OpChoices {
                    items,
                    inserts,
                    annotation,
                },
            )
        })
        .boxed()
}

fn matching_ends(doc: &Document) -> Vec<usize> {
    let items = doc.items();
    let mut ends = vec![0; items.len()];
    let mut open = Vec::new();
    for (i, item) in items.iter().enumerate() {
        match item.kind {
            ItemKind::Start { .. } => open.push(i),
            ItemKind::End => {
                if let Some(start) = open.pop() {
                    ends[start] = i;
                }
            }
            ItemKind::Char(_) => {}
        }
    }
    ends
}

fn build_op(doc: &Document, choices: &OpChoices) -> DocOp {
    let items = doc.items();
    let len = items.len();
    let ends = matching_ends(doc);
    let mut builder = DocOp::builder();

    // Gaps strictly inside the root element.
    let annotated = match choices.annotation {
        Some((from, to, bold)) if len > 2 => {
            let inner = len - 1;
            let a = 1 + from as usize % (inner - 1).max(1);
            let b = a + 1 + to as usize % (inner - a).max(1);
            Some((a, b.min(inner), if bold { "bold" } else { "light" }))
        }
        _ => None,
    };

    let mut deleting_until: Option<usize> = None;
    for (i, item) in items.iter().enumerate() {
        if let Some((from, to, value)) = annotated {
            if i == from {
                builder.annotation_boundary(AnnotationBoundary::new().change(
                    ANNOTATION_KEY,
                    None,
                    Some(value),
                ));
            }
            if i == to {
                builder.annotation_boundary(AnnotationBoundary::new().end(ANNOTATION_KEY));
            }
        }
        if deleting_until.is_none() && i > 0 {
            if let Some(chars) = choices.inserts.get(i).and_then(|c| c.as_deref()) {
                builder.characters(chars);
            }
        }

        if let Some(end) = deleting_until {
            delete_item(&mut builder, &item.kind);
            if i == end {
                deleting_until = None;
            }
            continue;
        }
        if i == 0 || i + 1 == len {
            builder.retain(1);
            continue;
        }

        let choice = choices.items.get(i).copied().unwrap_or(0);
        match &item.kind {
            ItemKind::Char(_) if choice % 3 == 0 => delete_item(&mut builder, &item.kind),
            ItemKind::Start { .. } if choice % 5 == 0 => {
                deleting_until = Some(ends[i]);
                delete_item(&mut builder, &item.kind);
            }
            ItemKind::Start { attributes, .. } if choice % 5 == 1 => {
                let old = attributes.get("a");
                let new = (choice / 5 % 3).to_string();
                builder.update_attributes(AttributesUpdate::new().with("a", old, Some(new.as_str())));
            }
            _ => {
                builder.retain(1);
            }
        }
    }
    builder.build()
}

fn delete_item(builder: &mut weft_core::DocOpBuilder, kind: &ItemKind) {
    match kind {
        ItemKind::Char(c) => {
            builder.delete_characters(c.encode_utf8(&mut [0; 4]));
        }
        ItemKind::Start { tag, attributes } => {
            builder.delete_element_start(tag, attributes.clone());
        }
        ItemKind::End => {
            builder.delete_element_end();
        }
    }
}

/// A document with two operations produced concurrently against it.
#[derive(Debug, Clone)]
pub struct ConcurrentEdits {
    pub document: Document,
    pub client: DocOp,
    pub server: DocOp,
}

impl Arbitrary for ConcurrentEdits {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        document()
            .prop_flat_map(|document| {
                let client = doc_op_for(&document);
                let server = doc_op_for(&document);
                (Just(document), client, server)
            })
            .prop_map(|(document, client, server)| ConcurrentEdits {
                document,
                client,
                server,
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::{compose, validate};

    fn doc_with_op() -> impl Strategy<Value = (Document, DocOp)> {
        document().prop_flat_map(|doc| {
            let op = doc_op_for(&doc);
            (Just(doc), op)
        })
    }

    proptest! {
        #[test]
        fn test_generated_ops_apply((doc, op) in doc_with_op()) {
            prop_assert!(validate(&op).is_ok());
            prop_assert!(doc.apply(&op).is_ok());
        }

        #[test]
        fn test_inverse_restores_document(edits: ConcurrentEdits) {
            let after = edits.document.apply(&edits.client).unwrap();
            let back = after.apply(&edits.client.invert()).unwrap();
            prop_assert_eq!(back.to_xml(), edits.document.to_xml());
        }

        #[test]
        fn test_compose_matches_sequential_apply(
            (doc, first, second) in doc_with_op().prop_flat_map(|(doc, first)| {
                let after = doc.apply(&first).unwrap_or_default();
                let second = doc_op_for(&after);
                (Just(doc), Just(first), second)
            })
        ) {
            let composed = compose(&first, &second).unwrap();
            let sequential = doc.apply(&first).and_then(|d| d.apply(&second)).unwrap();
            prop_assert_eq!(doc.apply(&composed).unwrap(), sequential);
        }
    }
}
