//! Action filter: narrow candidates to valid targets for an action intent.
//!
//! Each intent has an ordered list of [`Strategy`]s. The first one that
//! yields an acceptable candidate wins; when none does, the unfiltered
//! matches are kept and absence is left for the caller to report.

use crate::candidate::{locate, Candidate};
use crate::descriptor::{ActionIntent, Descriptor, Traversal};
use crate::driver::{Driver, Frame};
use crate::query::synthesize;
use crate::Result;
use tracing::debug;

/// Where to look for an action target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// The descriptor's own matches.
    SameNode,
    /// Writable elements reached from the matches along a traversal.
    Widen(Traversal),
    /// The intent's dedicated query (nearby `select`, preceding checkbox).
    IntentQuery,
}

/// Fallback order for `intent` on `descriptor`.
///
/// Rows and columns have no widening queries, so only their own matches
/// are narrowed.
pub fn strategies(descriptor: &Descriptor, intent: ActionIntent) -> &'static [Strategy] {
    if !matches!(descriptor, Descriptor::Element(_)) {
        return &[Strategy::SameNode];
    }
    match intent {
        ActionIntent::Write => &[
            Strategy::SameNode,
            Strategy::Widen(Traversal::Descendant),
            Strategy::Widen(Traversal::Following),
        ],
        ActionIntent::Select | ActionIntent::Check => {
            &[Strategy::SameNode, Strategy::IntentQuery]
        }
    }
}

/// Whether `candidate` can receive `intent`.
pub fn accepts(intent: ActionIntent, candidate: &Candidate) -> bool {
    match intent {
        ActionIntent::Write => {
            matches!(candidate.tag_name.as_str(), "input" | "textarea") || candidate.is_editable()
        }
        ActionIntent::Select => candidate.tag_name == "select",
        ActionIntent::Check => candidate.tag_name == "input",
    }
}

/// Keep the candidates that can receive `intent`.
pub fn filter_for_action(candidates: &[Candidate], intent: ActionIntent) -> Vec<Candidate> {
    candidates
        .iter()
        .filter(|c| accepts(intent, c))
        .cloned()
        .collect()
}

/// Locate `descriptor` in `frame`, narrowed for `intent`.
///
/// Falls back to the plain matches when no strategy yields a valid target.
pub async fn locate_for_action<D: Driver + ?Sized>(
    driver: &D,
    frame: Frame,
    descriptor: &Descriptor,
    intent: Option<ActionIntent>,
) -> Result<Vec<Candidate>> {
    let all = locate(driver, frame, &synthesize(descriptor, None, None)?).await?;
    let Some(intent) = intent else {
        return Ok(all);
    };

    for strategy in strategies(descriptor, intent) {
        let found = match strategy {
            Strategy::SameNode => filter_for_action(&all, intent),
            Strategy::Widen(traversal) => {
                let query = synthesize(descriptor, Some(intent), Some(*traversal))?;
                filter_for_action(&locate(driver, frame, &query).await?, intent)
            }
            Strategy::IntentQuery => {
                let query = synthesize(descriptor, Some(intent), None)?;
                filter_for_action(&locate(driver, frame, &query).await?, intent)
            }
        };
        if !found.is_empty() {
            debug!(
                "{} target for {} via {:?}: {} candidate(s)",
                intent,
                descriptor,
                strategy,
                found.len()
            );
            return Ok(found);
        }
    }

    debug!(
        "no {} target for {}, keeping {} unfiltered match(es)",
        intent,
        descriptor,
        all.len()
    );
    Ok(all)
}
