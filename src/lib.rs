//! # xlocate
//!
//! Resolve declarative element descriptors to exactly one live DOM element.
//!
//! A descriptor stack names a target ("the input labelled *Email*") and,
//! optionally, spatial references to other described elements ("below the
//! *Billing* heading"). Resolution synthesizes XPath queries from the loose
//! descriptors, narrows candidates for the intended action, searches every
//! iframe when the default document has no match, and disambiguates with
//! bounding-box geometry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xlocate::memory::{Document, El, MemoryDriver};
//! use xlocate::{find, ActionIntent, Descriptor, Relation};
//!
//! # #[tokio::main]
//! # async fn main() -> xlocate::Result<()> {
//! let mut doc = Document::new();
//! let body = doc.body();
//! doc.append(body, El::new("label").text("Email").at(10.0, 0.0, 30.0, 80.0));
//! doc.append(body, El::new("input").attr("type", "text").at(40.0, 0.0, 60.0, 200.0));
//! let driver = MemoryDriver::new(doc);
//!
//! let stack = vec![
//!     Descriptor::element("Email"),
//!     Descriptor::Location(Relation::Below),
//!     Descriptor::element("Email"),
//! ];
//! let found = find(&driver, &stack, Some(ActionIntent::Write)).await?;
//! println!("{} at {:?}", found.tag_name, found.rect);
//! # Ok(())
//! # }
//! ```

pub mod candidate;
pub mod descriptor;
pub mod driver;
pub mod filter;
pub mod find;
pub mod memory;
pub mod query;
pub mod search;
pub mod spatial;
pub mod xpath;

pub use candidate::{locate, Candidate};
pub use descriptor::{ActionIntent, Descriptor, Indexed, Matcher, Relation, Traversal};
pub use driver::{Driver, DriverError, Frame, NodeHandle, Rect};
pub use filter::{filter_for_action, Strategy};
pub use find::{find, Plan};
pub use query::synthesize;
pub use search::{resolve_stack, StackItem};
pub use spatial::resolve_relative;
pub use xpath::XPath;

/// Result type for xlocate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that end a resolution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No live candidate satisfied a descriptor after every fallback and frame.
    #[error("{}", not_found_message(.id, .relation, .anchor))]
    NotFound {
        id: String,
        relation: Option<Relation>,
        anchor: Option<String>,
    },

    #[error("unsupported relation '{0}'")]
    UnsupportedRelation(String),

    #[error("contract violation: {0}")]
    ContractViolation(String),

    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

impl Error {
    pub(crate) fn not_found(id: impl Into<String>) -> Self {
        Error::NotFound {
            id: id.into(),
            relation: None,
            anchor: None,
        }
    }

    /// Whether this error reports absence rather than a broken call.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

fn not_found_message(id: &str, relation: &Option<Relation>, anchor: &Option<String>) -> String {
    match (relation, anchor) {
        (Some(rel), Some(anchor)) => {
            format!("'{}' {} '{}' has no matching elements on page", id, rel, anchor)
        }
        _ => format!("'{}' has no matching elements on page", id),
    }
}
