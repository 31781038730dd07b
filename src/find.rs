//! Descriptor stack walker: the `find` entry point.
//!
//! A stack reads `target (relation anchor)*`. It is parsed into a [`Plan`]
//! before any driver call, so a malformed stack fails without touching the
//! page. After every locatable is resolved the plan is folded right to
//! left: the last operand's first match anchors the relation before it,
//! and so on until the target is left.

use crate::candidate::Candidate;
use crate::descriptor::{ActionIntent, Descriptor, Relation};
use crate::driver::Driver;
use crate::search::{resolve_stack, StackItem};
use crate::spatial::resolve_relative;
use crate::{Error, Result};
use tracing::debug;

/// Validated shape of a descriptor stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Stack positions of the locatable entries, target first.
    pub operands: Vec<usize>,
    /// `relations[k]` constrains operand `k` relative to operand `k + 1`.
    pub relations: Vec<Relation>,
}

impl Plan {
    /// Check `stack` against `locatable (location locatable)*`.
    pub fn parse(stack: &[Descriptor]) -> Result<Self> {
        if stack.is_empty() {
            return Err(Error::ContractViolation("empty descriptor stack".into()));
        }

        let mut operands = Vec::new();
        let mut relations = Vec::new();
        let mut want_locatable = true;
        for (position, descriptor) in stack.iter().enumerate() {
            match (descriptor, want_locatable) {
                (Descriptor::Location(relation), false) => relations.push(*relation),
                (Descriptor::Location(relation), true) => {
                    return Err(Error::ContractViolation(format!(
                        "location '{}' at position {} has no operand before it",
                        relation, position
                    )))
                }
                (_, true) => operands.push(position),
                (descriptor, false) => {
                    return Err(Error::ContractViolation(format!(
                        "{} at position {} follows another locatable with no location between them",
                        descriptor, position
                    )))
                }
            }
            want_locatable = !want_locatable;
        }

        if want_locatable {
            return Err(Error::ContractViolation(format!(
                "location '{}' ends the stack with no anchor after it",
                relations.last().map(Relation::as_str).unwrap_or_default()
            )));
        }
        Ok(Self {
            operands,
            relations,
        })
    }

    /// Narrow resolved `items` (indexed like the parsed stack) to one element.
    pub fn reduce(&self, items: &[StackItem]) -> Result<Candidate> {
        let (&last, _) = self
            .operands
            .split_last()
            .ok_or_else(|| Error::ContractViolation("plan has no operands".into()))?;
        let mut element = resolve_relative(matches_at(items, last)?, None, None)?
            .ok_or_else(|| Error::not_found(id_at(items, last)))?;

        for (k, relation) in self.relations.iter().enumerate().rev() {
            let operand = self.operands[k];
            let anchor = self.operands[k + 1];
            element = resolve_relative(matches_at(items, operand)?, Some(*relation), Some(&element))?
                .ok_or_else(|| Error::NotFound {
                    id: id_at(items, operand),
                    relation: Some(*relation),
                    anchor: Some(id_at(items, anchor)),
                })?;
            debug!(
                "'{}' {} '{}' -> <{}>",
                id_at(items, operand),
                relation,
                id_at(items, anchor),
                element.tag_name
            );
        }
        Ok(element)
    }
}

fn id_at(items: &[StackItem], position: usize) -> String {
    items
        .get(position)
        .and_then(|item| item.descriptor.id())
        .unwrap_or_default()
        .to_string()
}

fn matches_at(items: &[StackItem], position: usize) -> Result<&[Candidate]> {
    items
        .get(position)
        .map(|item| item.matches.as_slice())
        .ok_or_else(|| Error::ContractViolation(format!("no stack item at position {}", position)))
}

/// Resolve `stack` to exactly one rendered element.
///
/// The first descriptor is the target and is narrowed for `intent`; the
/// rest are spatial references. Each call starts from the default
/// document and reads the page afresh.
pub async fn find<D: Driver + ?Sized>(
    driver: &D,
    stack: &[Descriptor],
    intent: Option<ActionIntent>,
) -> Result<Candidate> {
    let plan = Plan::parse(stack)?;
    let mut items: Vec<StackItem> = stack.iter().cloned().map(StackItem::from).collect();
    resolve_stack(driver, &mut items, intent).await?;

    let found = plan.reduce(&items)?;
    debug!(
        "resolved {} to <{}> in {}",
        stack[0], found.tag_name, found.frame
    );
    Ok(found)
}
