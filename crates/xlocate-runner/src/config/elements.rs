//! Named descriptor stacks and dynamic element names.

use crate::{Error, Result};
use std::collections::BTreeMap;
use xlocate::Descriptor;

/// Placeholder in descriptor ids filled in at lookup time.
pub const REPLACE_TEXT: &str = "<ReplaceText>";

/// Descriptor stacks keyed by element name.
pub type Elements = BTreeMap<String, Vec<Descriptor>>;

/// A descriptor stack ready for resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRef {
    /// Display name; dynamic lookups append the replace text.
    pub name: String,
    pub stack: Vec<Descriptor>,
}

/// Look up `name`, filling `<ReplaceText>` with `replace` when given.
///
/// A dynamic lookup of `"Row for"` with `"alice"` is named `"Row for alice"`.
pub fn element(elements: &Elements, name: &str, replace: Option<&str>) -> Result<ElementRef> {
    let stack = elements
        .get(name)
        .ok_or_else(|| Error::UnknownElement(name.to_string()))?;

    let Some(replace) = replace else {
        return Ok(ElementRef {
            name: name.to_string(),
            stack: stack.clone(),
        });
    };

    let stack = stack
        .iter()
        .cloned()
        .map(|mut d| {
            d.replace_id(REPLACE_TEXT, replace);
            d
        })
        .collect();
    Ok(ElementRef {
        name: format!("{} {}", name, replace),
        stack,
    })
}
