//! Spatial relative resolver.

use crate::candidate::Candidate;
use crate::descriptor::Relation;
use crate::driver::Rect;
use crate::{Error, Result};

impl Relation {
    /// Whether `candidate` lies in this relation to `anchor`. Touching edges count.
    pub fn holds(&self, candidate: &Rect, anchor: &Rect) -> bool {
        match self {
            Relation::Above => anchor.top >= candidate.bottom,
            Relation::Below => anchor.bottom <= candidate.top,
            Relation::ToLeftOf => anchor.left >= candidate.right,
            Relation::ToRightOf => anchor.right <= candidate.left,
            Relation::Within => anchor.encloses(candidate),
        }
    }
}

/// Pick one operand, optionally constrained by `relation` to `anchor`.
///
/// Without a relation the first operand wins. `Ok(None)` means nothing
/// survived; the caller knows which descriptors to name in the failure.
pub fn resolve_relative(
    operands: &[Candidate],
    relation: Option<Relation>,
    anchor: Option<&Candidate>,
) -> Result<Option<Candidate>> {
    match (relation, anchor) {
        (None, None) => Ok(operands.first().cloned()),
        (Some(relation), Some(anchor)) => Ok(operands
            .iter()
            .find(|c| relation.holds(&c.rect, &anchor.rect))
            .cloned()),
        (Some(relation), None) => Err(Error::ContractViolation(format!(
            "relation '{}' has no anchor element",
            relation
        ))),
        (None, Some(anchor)) => Err(Error::ContractViolation(format!(
            "anchor <{}> given without a relation",
            anchor.tag_name
        ))),
    }
}
