use crate::config::{ElementRef, Expect, Lookup};
use crate::{Error, Result};
use std::time::{Duration, Instant};
use tracing::debug;
use xlocate::{find, Candidate, Driver};

/// Delay between attempts of a lookup with a timeout.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Outcome of one lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupOutcome {
    /// Element name, with any replace text.
    pub name: String,
    pub expect: Expect,
    /// The resolved element; `None` for a confirmed absence.
    pub found: Option<Candidate>,
}

/// Resolve `element` until it meets `lookup.expect` or the timeout passes.
///
/// An absence expectation is met only by `NotFound`; every other resolution
/// error ends the lookup at once.
pub async fn resolve<D: Driver + ?Sized>(
    driver: &D,
    element: &ElementRef,
    lookup: &Lookup,
) -> Result<LookupOutcome> {
    let deadline = Instant::now() + Duration::from_millis(lookup.timeout_ms);
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let outcome = find(driver, &element.stack, lookup.action).await;
        let last = Instant::now() >= deadline;

        match (outcome, lookup.expect) {
            (Ok(found), Expect::Present) => {
                debug!(
                    "'{}' resolved to <{}> in {} after {} attempt(s)",
                    element.name, found.tag_name, found.frame, attempts
                );
                return Ok(LookupOutcome {
                    name: element.name.clone(),
                    expect: lookup.expect,
                    found: Some(found),
                });
            }
            (Err(e), Expect::Absent) if e.is_not_found() => {
                debug!("'{}' absent after {} attempt(s)", element.name, attempts);
                return Ok(LookupOutcome {
                    name: element.name.clone(),
                    expect: lookup.expect,
                    found: None,
                });
            }
            (Ok(found), Expect::Absent) if last => {
                return Err(Error::AssertionFailed(format!(
                    "'{}' expected absent but resolved to <{}>",
                    element.name, found.tag_name
                )));
            }
            (Err(e), Expect::Present) if e.is_not_found() && last => return Err(e.into()),
            (Err(e), _) if !e.is_not_found() => return Err(e.into()),
            _ => {
                driver.release().await?;
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }
    }
}
