//! The transform engine.
//!
//! Both operations are decomposed into insertion, preservation and deletion
//! parts; the parts are transformed pairwise in a fixed order and each
//! side's transformed parts are composed back into one operation.

use tracing::{error, trace};

use weft_core::{compose_all, DocOp};

use crate::decompose::decompose;
use crate::error::{Result, TransformError};
use crate::pairwise::{
    deletion_deletion, insertion_deletion, insertion_insertion, insertion_preservation,
    preservation_deletion, preservation_preservation,
};
use crate::tameness::check_tameness;

/// Configuration for the transform engine.
#[derive(Debug, Clone)]
pub struct TransformConfig {
    /// Upper bound on preservation/deletion rounds before giving up.
    pub max_tameness_iterations: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            max_tameness_iterations: 16,
        }
    }
}

/// Transforms pairs of concurrent operations.
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    config: TransformConfig,
}

impl Transformer {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Transform `client` and `server`, two operations on the same
    /// document, into `(client', server')` such that `client` then
    /// `server'` has the same effect as `server` then `client'`.
    ///
    /// At the same position the client's insertion comes first, and the
    /// client wins attribute and annotation conflicts.
    pub fn transform(&self, client: &DocOp, server: &DocOp) -> Result<(DocOp, DocOp)> {
        if client.input_len() != server.input_len() {
            return Err(TransformError::LengthMismatch {
                first: client.input_len(),
                second: server.input_len(),
            });
        }

        // 1. Decompose both
        let c = decompose(client);
        let s = decompose(server);

        // 2. Insertions against each other
        let (ci, si) = insertion_insertion::transform(&c.insertion, &s.insertion)?;

        // 3. Insertions against the other side's preservation
        let (ci, sp) = insertion_preservation::transform(&ci, &s.preservation)?;
        let (si, cp) = insertion_preservation::transform(&si, &c.preservation)?;

        // 4. Insertions against the other side's deletion
        let (ci, mut sd) = insertion_deletion::transform(&ci, &s.deletion)?;
        let (si, mut cd) = insertion_deletion::transform(&si, &c.deletion)?;

        // 5. Collect
        let mut client_parts = vec![ci];
        let mut server_parts = vec![si];

        // 6. Preservations until only tame leftovers remain
        let (mut cp, mut sp) = (cp, sp);
        let mut iterations = 0;
        while !check_tameness(&cp, &sp, &cd, &sd)? {
            if iterations == self.config.max_tameness_iterations {
                error!(iterations, "annotation tameness did not settle");
                return Err(TransformError::NoFixedPoint { iterations });
            }
            iterations += 1;
            trace!(iteration = iterations, "transforming preservations");

            let (client_p, server_p) = preservation_preservation::transform(&cp, &sp)?;
            let from_server = preservation_deletion::transform(&server_p, &cd)?;
            let from_client = preservation_deletion::transform(&client_p, &sd)?;

            client_parts.push(from_client.preservation);
            server_parts.push(from_server.preservation);

            cp = from_server.residue;
            cd = from_server.deletion;
            sp = from_client.residue;
            sd = from_client.deletion;
        }

        // 7. Deletions against each other
        let (cd, sd) = deletion_deletion::transform(&cd, &sd)?;
        client_parts.push(cd);
        server_parts.push(sd);

        // 8. Compose each side
        Ok((compose_all(&client_parts)?, compose_all(&server_parts)?))
    }
}

/// Transform with the default configuration.
pub fn transform(client: &DocOp, server: &DocOp) -> Result<(DocOp, DocOp)> {
    Transformer::default().transform(client, server)
}
