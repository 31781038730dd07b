//! Typed XPath 1.0 expressions.
//!
//! Queries are built as trees and rendered with `Display` for real
//! browsers. The in-memory driver walks the tree directly.

use std::fmt;
use std::num::NonZeroUsize;

/// A node-set expression.
#[derive(Debug, Clone, PartialEq)]
pub enum XPath {
    /// `.`, the context node. Only meaningful inside predicates.
    Context,
    /// `//test[predicates]`
    Anywhere {
        test: NodeTest,
        predicates: Vec<Predicate>,
    },
    /// `base/axis::test[predicates]`
    Path {
        base: Box<XPath>,
        axis: Axis,
        test: NodeTest,
        predicates: Vec<Predicate>,
    },
    /// `(base)[n]`
    Nth { base: Box<XPath>, n: NonZeroUsize },
    /// `a | b | ...`
    Union(Vec<XPath>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    Following,
    PrecedingSibling,
    SelfNode,
}

impl Axis {
    fn name(&self) -> &'static str {
        match self {
            Axis::Child => "child",
            Axis::Descendant => "descendant",
            Axis::Following => "following",
            Axis::PrecedingSibling => "preceding-sibling",
            Axis::SelfNode => "self",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeTest {
    /// `*`
    Any,
    /// An element name.
    Tag(String),
}

impl NodeTest {
    pub fn tag(name: impl Into<String>) -> Self {
        NodeTest::Tag(name.into())
    }

    pub fn matches(&self, tag: &str) -> bool {
        match self {
            NodeTest::Any => true,
            NodeTest::Tag(name) => name.eq_ignore_ascii_case(tag),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `[cond]`
    Where(Cond),
    /// `[n]` or `[count(expr)+1]`
    Position(Position),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    Nth(NonZeroUsize),
    /// One past the size of a node-set evaluated from the document root.
    CountPlusOne(Box<XPath>),
}

/// Comparison applied to an attribute or to normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Equals,
    Contains,
}

impl Cmp {
    pub fn exact(exact: bool) -> Self {
        if exact {
            Cmp::Equals
        } else {
            Cmp::Contains
        }
    }

    pub fn test(&self, haystack: &str, needle: &str) -> bool {
        match self {
            Cmp::Equals => haystack == needle,
            Cmp::Contains => haystack.contains(needle),
        }
    }
}

/// Boolean expression inside a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    Or(Vec<Cond>),
    And(Vec<Cond>),
    Not(Box<Cond>),
    /// `@name='v'` or `contains(@name,'v')`
    Attr { name: String, cmp: Cmp, value: String },
    /// `normalize-space(.)='v'` or `contains(normalize-space(.),'v')`
    Text { cmp: Cmp, value: String },
    /// Non-empty relative node-set.
    Exists(Box<XPath>),
}

impl XPath {
    pub fn anywhere(test: NodeTest, predicates: Vec<Predicate>) -> Self {
        XPath::Anywhere { test, predicates }
    }

    /// Append a location step to this expression.
    pub fn step(self, axis: Axis, test: NodeTest, predicates: Vec<Predicate>) -> Self {
        XPath::Path {
            base: Box::new(self),
            axis,
            test,
            predicates,
        }
    }

    pub fn nth(self, n: NonZeroUsize) -> Self {
        XPath::Nth {
            base: Box::new(self),
            n,
        }
    }
}

/// Quote a string as an XPath literal, falling back to `concat()` when it
/// holds both quote characters.
pub fn literal(s: &str) -> String {
    if !s.contains('\'') {
        return format!("'{}'", s);
    }
    if !s.contains('"') {
        return format!("\"{}\"", s);
    }
    let parts: Vec<String> = s
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XPath::Context => f.write_str("."),
            XPath::Anywhere { test, predicates } => {
                write!(f, "//{}", test)?;
                write_predicates(f, predicates)
            }
            XPath::Path {
                base,
                axis,
                test,
                predicates,
            } => {
                match base.as_ref() {
                    XPath::Context => {}
                    XPath::Union(_) => write!(f, "({})/", base)?,
                    other => write!(f, "{}/", other)?,
                }
                if *axis != Axis::Child {
                    write!(f, "{}::", axis.name())?;
                }
                write!(f, "{}", test)?;
                write_predicates(f, predicates)
            }
            XPath::Nth { base, n } => write!(f, "({})[{}]", base, n),
            XPath::Union(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{}", part)?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for NodeTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeTest::Any => f.write_str("*"),
            NodeTest::Tag(name) => f.write_str(name),
        }
    }
}

fn write_predicates(f: &mut fmt::Formatter<'_>, predicates: &[Predicate]) -> fmt::Result {
    for predicate in predicates {
        match predicate {
            Predicate::Where(cond) => write!(f, "[{}]", cond)?,
            Predicate::Position(Position::Nth(n)) => write!(f, "[{}]", n)?,
            Predicate::Position(Position::CountPlusOne(expr)) => {
                write!(f, "[count({})+1]", expr)?
            }
        }
    }
    Ok(())
}

impl Cond {
    fn precedence(&self) -> u8 {
        match self {
            Cond::Or(_) => 1,
            Cond::And(_) => 2,
            _ => 3,
        }
    }

    fn write_at(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        if self.precedence() < min {
            f.write_str("(")?;
            self.write_bare(f)?;
            return f.write_str(")");
        }
        self.write_bare(f)
    }

    fn write_bare(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cond::Or(parts) => write_joined(f, parts, " or ", 1, "false()"),
            Cond::And(parts) => write_joined(f, parts, " and ", 2, "true()"),
            Cond::Not(inner) => write!(f, "not({})", inner),
            Cond::Attr { name, cmp, value } => match cmp {
                Cmp::Equals => write!(f, "@{}={}", name, literal(value)),
                Cmp::Contains => write!(f, "contains(@{},{})", name, literal(value)),
            },
            Cond::Text { cmp, value } => match cmp {
                Cmp::Equals => write!(f, "normalize-space(.)={}", literal(value)),
                Cmp::Contains => write!(f, "contains(normalize-space(.),{})", literal(value)),
            },
            Cond::Exists(path) => write!(f, "{}", path),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    parts: &[Cond],
    sep: &str,
    min: u8,
    empty: &str,
) -> fmt::Result {
    if parts.is_empty() {
        return f.write_str(empty);
    }
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        part.write_at(f, min)?;
    }
    Ok(())
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_bare(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(name: &str, value: &str) -> Cond {
        Cond::Attr {
            name: name.into(),
            cmp: Cmp::Equals,
            value: value.into(),
        }
    }

    #[test]
    fn literal_quoting() {
        assert_eq!(literal("Submit"), "'Submit'");
        assert_eq!(literal("Don't"), "\"Don't\"");
        assert_eq!(
            literal(r#"say "it's""#),
            r#"concat('say "it', "'", 's"')"#
        );
    }

    #[test]
    fn and_wraps_nested_or() {
        let cond = Cond::And(vec![
            Cond::Or(vec![attr("id", "a"), attr("name", "a")]),
            Cond::Not(Box::new(attr("class", "x"))),
        ]);
        assert_eq!(
            cond.to_string(),
            "(@id='a' or @name='a') and not(@class='x')"
        );
    }

    #[test]
    fn or_does_not_wrap_nested_and() {
        let cond = Cond::Or(vec![
            attr("id", "a"),
            Cond::And(vec![
                Cond::Text {
                    cmp: Cmp::Contains,
                    value: "a".into(),
                },
                attr("name", "b"),
            ]),
        ]);
        assert_eq!(
            cond.to_string(),
            "@id='a' or contains(normalize-space(.),'a') and @name='b'"
        );
    }

    #[test]
    fn renders_paths_and_positions() {
        let header = XPath::anywhere(NodeTest::tag("thead"), vec![])
            .step(Axis::Descendant, NodeTest::tag("th"), vec![])
            .step(Axis::PrecedingSibling, NodeTest::tag("th"), vec![]);
        let cells = XPath::anywhere(NodeTest::tag("tbody"), vec![])
            .step(Axis::Child, NodeTest::tag("tr"), vec![])
            .step(
                Axis::Child,
                NodeTest::Any,
                vec![Predicate::Position(Position::CountPlusOne(Box::new(header)))],
            );
        assert_eq!(
            cells.to_string(),
            "//tbody/tr/*[count(//thead/descendant::th/preceding-sibling::th)+1]"
        );
    }

    #[test]
    fn renders_union_and_nth() {
        let base = XPath::anywhere(NodeTest::Any, vec![Predicate::Where(attr("id", "x"))])
            .nth(NonZeroUsize::new(2).unwrap());
        let union = XPath::Union(vec![
            base.clone().step(Axis::Descendant, NodeTest::tag("select"), vec![]),
            base.step(Axis::Following, NodeTest::tag("select"), vec![]),
        ]);
        assert_eq!(
            union.to_string(),
            "(//*[@id='x'])[2]/descendant::select | (//*[@id='x'])[2]/following::select"
        );
    }

    #[test]
    fn relative_steps_omit_context_prefix() {
        let rel = XPath::Context.step(Axis::SelfNode, NodeTest::tag("textarea"), vec![]);
        assert_eq!(rel.to_string(), "self::textarea");
    }

    #[test]
    fn empty_boolean_groups() {
        assert_eq!(Cond::Or(vec![]).to_string(), "false()");
        assert_eq!(Cond::And(vec![]).to_string(), "true()");
    }
}
