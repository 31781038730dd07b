//! Frame-aware search orchestrator.
//!
//! Every locatable stack item is looked up in the default document first.
//! Items still empty afterwards are retried frame by frame, in document
//! order, until each has matches or the frames run out.

use crate::candidate::{locate, Candidate};
use crate::descriptor::{ActionIntent, Descriptor};
use crate::driver::{Driver, DriverError, Frame};
use crate::filter::locate_for_action;
use crate::query::synthesize;
use crate::{Error, Result};
use tracing::debug;

/// A descriptor and the candidates found for it so far.
#[derive(Debug, Clone, PartialEq)]
pub struct StackItem {
    pub descriptor: Descriptor,
    pub matches: Vec<Candidate>,
}

impl StackItem {
    pub fn new(descriptor: Descriptor) -> Self {
        Self {
            descriptor,
            matches: Vec::new(),
        }
    }

    fn pending(&self) -> bool {
        self.descriptor.is_locatable() && self.matches.is_empty()
    }
}

impl From<Descriptor> for StackItem {
    fn from(descriptor: Descriptor) -> Self {
        Self::new(descriptor)
    }
}

/// Fill `matches` of every locatable item in `stack`.
///
/// The first item is the action target and goes through the action filter;
/// the others are positional anchors and are located as-is. Items that
/// already hold matches are left untouched. Fails with `NotFound` naming
/// the first item that stays empty after every frame.
pub async fn resolve_stack<D: Driver + ?Sized>(
    driver: &D,
    stack: &mut [StackItem],
    intent: Option<ActionIntent>,
) -> Result<()> {
    let frame = Frame::Default;
    for (position, item) in stack.iter_mut().enumerate() {
        if item.pending() {
            item.matches = lookup(driver, frame, item, position, intent).await?;
        }
    }

    if stack.iter().any(StackItem::pending) {
        let frames = driver.frames().await?.len();
        debug!(
            "{} item(s) unresolved in default document, searching {} frame(s)",
            stack.iter().filter(|i| i.pending()).count(),
            frames
        );

        for index in 0..frames {
            let frame = Frame::Index(index);
            for (position, item) in stack.iter_mut().enumerate() {
                if !item.pending() {
                    continue;
                }
                match lookup(driver, frame, item, position, intent).await {
                    Ok(found) => {
                        if !found.is_empty() {
                            debug!("{} found in {}", item.descriptor, frame);
                        }
                        item.matches = found;
                    }
                    Err(Error::Driver(DriverError::NoSuchFrame(n))) => {
                        debug!("frame {} has no accessible document, skipping", n);
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
            if !stack.iter().any(StackItem::pending) {
                break;
            }
        }
    }

    match stack.iter().find(|i| i.pending()) {
        Some(item) => Err(Error::not_found(item.descriptor.id().unwrap_or_default())),
        None => Ok(()),
    }
}

async fn lookup<D: Driver + ?Sized>(
    driver: &D,
    frame: Frame,
    item: &StackItem,
    position: usize,
    intent: Option<ActionIntent>,
) -> Result<Vec<Candidate>> {
    if position == 0 {
        locate_for_action(driver, frame, &item.descriptor, intent).await
    } else {
        locate(driver, frame, &synthesize(&item.descriptor, None, None)?).await
    }
}
