use crate::Error;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

/// How a descriptor's `id` is compared against attributes and text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Matcher {
    /// Attribute or normalized-text value to look for.
    pub id: String,
    /// Whole-value equality instead of substring containment.
    #[serde(default)]
    pub exact: bool,
}

impl Matcher {
    /// Substring match.
    pub fn contains(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            exact: false,
        }
    }

    /// Whole-value match.
    pub fn exact(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            exact: true,
        }
    }
}

/// A matcher plus an optional 1-based ordinal among equal matches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "IndexedFields")]
pub struct Indexed {
    pub matcher: Matcher,
    pub index: Option<NonZeroUsize>,
}

/// Flat YAML shape of [`Indexed`].
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct IndexedFields {
    id: String,
    #[serde(default)]
    exact: bool,
    #[serde(default)]
    index: Option<NonZeroUsize>,
}

impl From<IndexedFields> for Indexed {
    fn from(fields: IndexedFields) -> Self {
        Self {
            matcher: Matcher {
                id: fields.id,
                exact: fields.exact,
            },
            index: fields.index,
        }
    }
}

impl Indexed {
    /// Select the `n`-th match. `0` clears the ordinal.
    pub fn nth(mut self, n: usize) -> Self {
        self.index = NonZeroUsize::new(n);
        self
    }
}

impl From<Matcher> for Indexed {
    fn from(matcher: Matcher) -> Self {
        Self {
            matcher,
            index: None,
        }
    }
}

/// One entry of a descriptor stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    /// A free-standing element.
    Element(Indexed),
    /// A table body row containing a matching cell.
    Row(Indexed),
    /// The body cells under a matching header cell.
    Column(Matcher),
    /// Spatial relation between the locatable before it and the one after it.
    Location(Relation),
}

impl Descriptor {
    /// Element matched by substring.
    pub fn element(id: impl Into<String>) -> Self {
        Descriptor::Element(Matcher::contains(id).into())
    }

    /// Row matched by substring.
    pub fn row(id: impl Into<String>) -> Self {
        Descriptor::Row(Matcher::contains(id).into())
    }

    /// Column matched by substring.
    pub fn column(id: impl Into<String>) -> Self {
        Descriptor::Column(Matcher::contains(id))
    }

    /// The matcher of a locatable descriptor.
    pub fn matcher(&self) -> Option<&Matcher> {
        match self {
            Descriptor::Element(i) | Descriptor::Row(i) => Some(&i.matcher),
            Descriptor::Column(m) => Some(m),
            Descriptor::Location(_) => None,
        }
    }

    /// The `id` of a locatable descriptor.
    pub fn id(&self) -> Option<&str> {
        self.matcher().map(|m| m.id.as_str())
    }

    pub fn is_locatable(&self) -> bool {
        !matches!(self, Descriptor::Location(_))
    }

    /// Replace every occurrence of `from` in the matcher id.
    pub fn replace_id(&mut self, from: &str, to: &str) {
        let matcher = match self {
            Descriptor::Element(i) | Descriptor::Row(i) => &mut i.matcher,
            Descriptor::Column(m) => m,
            Descriptor::Location(_) => return,
        };
        matcher.id = matcher.id.replace(from, to);
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Element(i) => write!(f, "element '{}'", i.matcher.id),
            Descriptor::Row(i) => write!(f, "row '{}'", i.matcher.id),
            Descriptor::Column(m) => write!(f, "column '{}'", m.id),
            Descriptor::Location(r) => write!(f, "{}", r),
        }
    }
}

/// Spatial predicate evaluated against bounding rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Above,
    Below,
    ToLeftOf,
    ToRightOf,
    Within,
}

const RELATION_NAMES: &[&str] = &["above", "below", "toLeftOf", "toRightOf", "within"];

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Above => "above",
            Relation::Below => "below",
            Relation::ToLeftOf => "toLeftOf",
            Relation::ToRightOf => "toRightOf",
            Relation::Within => "within",
        }
    }
}

impl FromStr for Relation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "above" => Ok(Relation::Above),
            "below" => Ok(Relation::Below),
            "toLeftOf" => Ok(Relation::ToLeftOf),
            "toRightOf" => Ok(Relation::ToRightOf),
            "within" => Ok(Relation::Within),
            other => Err(Error::UnsupportedRelation(other.to_string())),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller intends to do with the resolved element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionIntent {
    Write,
    Select,
    Check,
}

impl FromStr for ActionIntent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "write" => Ok(ActionIntent::Write),
            "select" => Ok(ActionIntent::Select),
            "check" => Ok(ActionIntent::Check),
            other => Err(Error::ContractViolation(format!(
                "unknown action intent '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for ActionIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionIntent::Write => "write",
            ActionIntent::Select => "select",
            ActionIntent::Check => "check",
        })
    }
}

/// Axis used to widen a `write` query past the matched node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    Descendant,
    Following,
}

impl FromStr for Traversal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "descendant" => Ok(Traversal::Descendant),
            "following" => Ok(Traversal::Following),
            other => Err(Error::UnsupportedRelation(other.to_string())),
        }
    }
}

const DESCRIPTOR_KEYS: &[&str] = &["element", "row", "column", "location"];

impl<'de> Deserialize<'de> for Descriptor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DescriptorVisitor)
    }
}

struct DescriptorVisitor;

impl<'de> Visitor<'de> for DescriptorVisitor {
    type Value = Descriptor;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a relation name, or a map with a single element/row/column/location key")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        value
            .parse()
            .map(Descriptor::Location)
            .map_err(|_| de::Error::unknown_variant(value, RELATION_NAMES))
    }

    fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let key: String = map
            .next_key()?
            .ok_or_else(|| de::Error::custom("expected descriptor type key"))?;

        let descriptor = match key.as_str() {
            "element" => Descriptor::Element(map.next_value()?),
            "row" => Descriptor::Row(map.next_value()?),
            "column" => Descriptor::Column(map.next_value()?),
            "location" => {
                let name: String = map.next_value()?;
                let relation = name.parse().map_err(de::Error::custom)?;
                Descriptor::Location(relation)
            }
            other => return Err(de::Error::unknown_variant(other, DESCRIPTOR_KEYS)),
        };

        if map.next_key::<String>()?.is_some() {
            return Err(de::Error::custom(format!(
                "descriptor '{}' must be the only key in its map",
                key
            )));
        }
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Vec<Descriptor> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_locatables() {
        let stack = parse(
            r#"
- element:
    id: "Submit"
    exact: true
    index: 2
- row:
    id: "Alice"
- column:
    id: "Email"
"#,
        );
        assert_eq!(stack.len(), 3);

        if let Descriptor::Element(i) = &stack[0] {
            assert_eq!(i.matcher.id, "Submit");
            assert!(i.matcher.exact);
            assert_eq!(i.index.map(|n| n.get()), Some(2));
        } else {
            panic!("Expected Element descriptor");
        }

        if let Descriptor::Row(i) = &stack[1] {
            assert!(!i.matcher.exact);
            assert!(i.index.is_none());
        } else {
            panic!("Expected Row descriptor");
        }

        assert_eq!(stack[2], Descriptor::column("Email"));
    }

    #[test]
    fn test_parse_locations() {
        let stack = parse(
            r#"
- element: { id: "Save" }
- below
- element: { id: "Details" }
- location: toRightOf
- element: { id: "Sidebar" }
"#,
        );
        assert_eq!(stack[1], Descriptor::Location(Relation::Below));
        assert_eq!(stack[3], Descriptor::Location(Relation::ToRightOf));
    }

    #[test]
    fn test_unknown_relation_is_rejected() {
        let result: Result<Vec<Descriptor>, _> = serde_yaml::from_str("- beside");
        assert!(result.unwrap_err().to_string().contains("beside"));

        let result: Result<Vec<Descriptor>, _> = serde_yaml::from_str("- location: beside");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("unsupported relation 'beside'"));
    }

    #[test]
    fn test_index_zero_is_rejected() {
        let result: Result<Vec<Descriptor>, _> =
            serde_yaml::from_str("- element: { id: \"x\", index: 0 }");
        assert!(result.is_err());
    }

    #[test]
    fn test_extra_key_is_rejected() {
        let result: Result<Vec<Descriptor>, _> =
            serde_yaml::from_str("- { element: { id: \"a\" }, row: { id: \"b\" } }");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_matcher_keys_are_rejected() {
        let result: Result<Vec<Descriptor>, _> =
            serde_yaml::from_str("- column: { id: \"Email\", index: 2 }");
        assert!(result.unwrap_err().to_string().contains("index"));

        let result: Result<Vec<Descriptor>, _> =
            serde_yaml::from_str("- element: { id: \"x\", exakt: true }");
        assert!(result.unwrap_err().to_string().contains("exakt"));

        let result: Result<Vec<Descriptor>, _> =
            serde_yaml::from_str("- row: { id: \"x\", exakt: true }");
        assert!(result.is_err());
    }

    #[test]
    fn relation_round_trips_names() {
        for name in RELATION_NAMES {
            let relation: Relation = name.parse().unwrap();
            assert_eq!(relation.to_string(), *name);
        }
        assert!(matches!(
            "beside".parse::<Relation>(),
            Err(Error::UnsupportedRelation(r)) if r == "beside"
        ));
    }

    #[test]
    fn traversal_rejects_other_axes() {
        assert_eq!("following".parse::<Traversal>().unwrap(), Traversal::Following);
        assert!(matches!(
            "ancestor".parse::<Traversal>(),
            Err(Error::UnsupportedRelation(_))
        ));
    }

    #[test]
    fn replace_id_rewrites_placeholder() {
        let mut d = Descriptor::row("Order <ReplaceText>");
        d.replace_id("<ReplaceText>", "42");
        assert_eq!(d.id(), Some("Order 42"));

        let mut loc = Descriptor::Location(Relation::Within);
        loc.replace_id("<ReplaceText>", "42");
        assert_eq!(loc.id(), None);
        assert!(!loc.is_locatable());
    }
}
