//! Speculative dispatch over candidate schemas.
//!
//! Some tags have carried incompatible layouts across format revisions. Each
//! layout is a [`Candidate`]; [`speculate`] tries them in order against the
//! same node and commits to the first that decodes. Candidates only read the
//! node, so a rejected attempt leaves nothing behind.

use crate::error::{Result, UrdfError};
use crate::registry::TypeRegistry;
use crate::xml::XmlNode;

/// Decoder for one schema a node may follow.
pub type CandidateFn<T> = fn(&XmlNode, &TypeRegistry) -> Result<T>;

/// A named schema candidate.
pub struct Candidate<T> {
    /// Schema name, reported when nothing matches.
    pub name: &'static str,
    /// Decoder for the schema.
    pub read: CandidateFn<T>,
}

impl<T> Clone for Candidate<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Candidate<T> {}

impl<T> std::fmt::Debug for Candidate<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate").field("name", &self.name).finish()
    }
}

/// Decode `node` with the first candidate that accepts it.
///
/// # Errors
///
/// Returns [`UrdfError::NoMatchingSchema`] carrying the last candidate's
/// error when every candidate fails.
pub fn speculate<T>(
    node: &XmlNode,
    registry: &TypeRegistry,
    candidates: &[Candidate<T>],
) -> Result<T> {
    let mut last_error = None;

    for candidate in candidates {
        match (candidate.read)(node, registry) {
            Ok(value) => {
                tracing::trace!(element = %node.name, schema = candidate.name, "schema accepted");
                return Ok(value);
            }
            Err(e) => {
                tracing::debug!(
                    element = %node.name,
                    schema = candidate.name,
                    error = %e,
                    "schema rejected"
                );
                last_error = Some(e);
            }
        }
    }

    Err(UrdfError::NoMatchingSchema {
        element: node.name.clone(),
        candidates: candidates.iter().map(|c| c.name).collect(),
        source: last_error.map(Box::new),
    })
}
