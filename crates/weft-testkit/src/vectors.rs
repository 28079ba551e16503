//! Golden transform vectors.
//!
//! Each vector is a base document, a client and a server operation made
//! concurrently against it, and the XML both application orders must
//! produce. They pin the tie-breaking rules: at one position the client's
//! insertion comes first, and deletion wins over concurrent edits to the
//! deleted content.

use serde::{Deserialize, Serialize};

use weft_core::{Attributes, AttributesUpdate, DocOp, Document};
use weft_transform::transform;

/// A golden transform vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Insertion-only operation building the base document.
    pub base: DocOp,
    pub client: DocOp,
    pub server: DocOp,
    /// Expected XML after either order.
    pub expected: &'static str,
}

/// The outcome of checking one vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorReport {
    pub name: String,
    /// Result of client then server'.
    pub client_first: String,
    /// Result of server then client'.
    pub server_first: String,
    pub passed: bool,
}

fn body(text: &str) -> DocOp {
    DocOp::builder()
        .element_start("body", Attributes::new())
        .characters(text)
        .element_end()
        .build()
}

fn paragraph(key: &str, value: &str, text: &str) -> DocOp {
    DocOp::builder()
        .element_start("body", Attributes::new())
        .element_start("p", Attributes::new().with(key, value))
        .characters(text)
        .element_end()
        .element_end()
        .build()
}

/// Get all golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "insert against delete",
            base: body("ab"),
            client: DocOp::builder().retain(2).characters("X").retain(2).build(),
            server: DocOp::builder()
                .retain(2)
                .delete_characters("b")
                .retain(1)
                .build(),
            expected: "<body>aX</body>",
        },
        GoldenVector {
            name: "inserts at one position put client first",
            base: body("ab"),
            client: DocOp::builder().retain(2).characters("C").retain(2).build(),
            server: DocOp::builder().retain(2).characters("S").retain(2).build(),
            expected: "<body>aCSb</body>",
        },
        GoldenVector {
            name: "overlapping deletions",
            base: body("abcd"),
            client: DocOp::builder()
                .retain(1)
                .delete_characters("abc")
                .retain(2)
                .build(),
            server: DocOp::builder()
                .retain(2)
                .delete_characters("bcd")
                .retain(1)
                .build(),
            expected: "<body></body>",
        },
        GoldenVector {
            name: "attribute change against element deletion",
            base: paragraph("k", "0", "x"),
            client: DocOp::builder()
                .retain(1)
                .update_attributes(AttributesUpdate::new().with("k", Some("0"), Some("1")))
                .retain(3)
                .build(),
            server: DocOp::builder()
                .retain(1)
                .delete_element_start("p", Attributes::new().with("k", "0"))
                .delete_characters("x")
                .delete_element_end()
                .retain(1)
                .build(),
            expected: "<body></body>",
        },
        GoldenVector {
            name: "identical deletions",
            base: body("abc"),
            client: DocOp::builder()
                .retain(2)
                .delete_characters("b")
                .retain(2)
                .build(),
            server: DocOp::builder()
                .retain(2)
                .delete_characters("b")
                .retain(2)
                .build(),
            expected: "<body>ac</body>",
        },
    ]
}

/// Check one vector in both application orders.
pub fn verify_vector(vector: &GoldenVector) -> VectorReport {
    let render = |doc: Result<Document, String>| match doc {
        Ok(doc) => doc.to_xml(),
        Err(e) => format!("error: {}", e),
    };
    let base = Document::from_op(&vector.base).map_err(|e| e.to_string());
    let transformed = transform(&vector.client, &vector.server).map_err(|e| e.to_string());

    let (client_first, server_first) = match (&base, &transformed) {
        (Ok(base), Ok((client2, server2))) => (
            render(
                base.apply(&vector.client)
                    .and_then(|d| d.apply(server2))
                    .map_err(|e| e.to_string()),
            ),
            render(
                base.apply(&vector.server)
                    .and_then(|d| d.apply(client2))
                    .map_err(|e| e.to_string()),
            ),
        ),
        (Err(e), _) | (_, Err(e)) => (format!("error: {}", e), format!("error: {}", e)),
    };

    VectorReport {
        name: vector.name.to_string(),
        passed: client_first == vector.expected && server_first == vector.expected,
        client_first,
        server_first,
    }
}

/// Verify all golden vectors.
pub fn verify_all_vectors() -> Vec<VectorReport> {
    all_vectors().iter().map(verify_vector).collect()
}
