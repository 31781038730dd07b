//! Query synthesis: descriptor + action intent -> XPath.

use crate::descriptor::{ActionIntent, Descriptor, Indexed, Matcher, Traversal};
use crate::xpath::{Axis, Cmp, Cond, NodeTest, Position, Predicate, XPath};
use crate::{Error, Result};

/// Attributes compared against a descriptor id, in order.
pub const ATTRIBUTES: &[&str] = &[
    "placeholder",
    "value",
    "data-test-id",
    "id",
    "resource-id",
    "name",
    "aria-label",
    "class",
    "hint",
    "title",
    "tooltip",
    "alt",
    "src",
];

/// Build the query for one locatable descriptor.
///
/// `intent` and `traversal` only extend `element` queries; rows and columns
/// are positional and ignore both. A `write` extension needs a traversal.
pub fn synthesize(
    descriptor: &Descriptor,
    intent: Option<ActionIntent>,
    traversal: Option<Traversal>,
) -> Result<XPath> {
    match descriptor {
        Descriptor::Element(target) => element(target, intent, traversal),
        Descriptor::Row(target) => Ok(row(target)),
        Descriptor::Column(matcher) => Ok(column(matcher)),
        Descriptor::Location(relation) => Err(Error::ContractViolation(format!(
            "cannot build a query for location '{}'",
            relation
        ))),
    }
}

/// `attr op v or ... or normalize-space(.) op v`, plus the most-specific
/// clause on the text comparison when `specific` is set.
fn matching(matcher: &Matcher, specific: bool) -> Cond {
    let cmp = Cmp::exact(matcher.exact);
    let mut any: Vec<Cond> = ATTRIBUTES
        .iter()
        .map(|name| Cond::Attr {
            name: (*name).to_string(),
            cmp,
            value: matcher.id.clone(),
        })
        .collect();

    let text = Cond::Text {
        cmp,
        value: matcher.id.clone(),
    };
    if specific {
        let deeper = XPath::Context.step(
            Axis::Descendant,
            NodeTest::Any,
            vec![Predicate::Where(text.clone())],
        );
        any.push(Cond::And(vec![
            text,
            Cond::Not(Box::new(Cond::Exists(Box::new(deeper)))),
        ]));
    } else {
        any.push(text);
    }
    Cond::Or(any)
}

fn indexed(query: XPath, target: &Indexed) -> XPath {
    match target.index {
        Some(n) => query.nth(n),
        None => query,
    }
}

fn element(
    target: &Indexed,
    intent: Option<ActionIntent>,
    traversal: Option<Traversal>,
) -> Result<XPath> {
    let base = indexed(
        XPath::anywhere(
            NodeTest::Any,
            vec![Predicate::Where(matching(&target.matcher, true))],
        ),
        target,
    );

    let query = match intent {
        None => base,
        Some(ActionIntent::Write) => {
            let axis = match traversal {
                Some(Traversal::Descendant) => Axis::Descendant,
                Some(Traversal::Following) => Axis::Following,
                None => {
                    return Err(Error::ContractViolation(
                        "write query needs a descendant or following traversal".into(),
                    ))
                }
            };
            base.step(axis, NodeTest::Any, vec![Predicate::Where(writable())])
        }
        Some(ActionIntent::Check) => base.step(
            Axis::PrecedingSibling,
            NodeTest::tag("input"),
            vec![Predicate::Where(Cond::Attr {
                name: "type".into(),
                cmp: Cmp::Equals,
                value: "checkbox".into(),
            })],
        ),
        Some(ActionIntent::Select) => XPath::Union(vec![
            base.clone()
                .step(Axis::Descendant, NodeTest::tag("select"), vec![]),
            base.step(Axis::Following, NodeTest::tag("select"), vec![]),
        ]),
    };
    Ok(query)
}

/// `self::input[@type='text' or @type='password'] or self::textarea or
/// self::*[@contenteditable='true']`
fn writable() -> Cond {
    let attr = |name: &str, value: &str| Cond::Attr {
        name: name.into(),
        cmp: Cmp::Equals,
        value: value.into(),
    };
    let this = |test: NodeTest, predicates: Vec<Predicate>| {
        Cond::Exists(Box::new(XPath::Context.step(Axis::SelfNode, test, predicates)))
    };
    Cond::Or(vec![
        this(
            NodeTest::tag("input"),
            vec![Predicate::Where(Cond::Or(vec![
                attr("type", "text"),
                attr("type", "password"),
            ]))],
        ),
        this(NodeTest::tag("textarea"), vec![]),
        this(
            NodeTest::Any,
            vec![Predicate::Where(attr("contenteditable", "true"))],
        ),
    ])
}

fn row(target: &Indexed) -> XPath {
    let cell = XPath::Context.step(
        Axis::Descendant,
        NodeTest::Any,
        vec![Predicate::Where(matching(&target.matcher, false))],
    );
    let rows = XPath::anywhere(NodeTest::tag("tbody"), vec![]).step(
        Axis::Child,
        NodeTest::tag("tr"),
        vec![Predicate::Where(Cond::Exists(Box::new(cell)))],
    );
    indexed(rows, target)
}

fn column(matcher: &Matcher) -> XPath {
    let before_header = XPath::anywhere(NodeTest::tag("thead"), vec![])
        .step(
            Axis::Descendant,
            NodeTest::tag("th"),
            vec![Predicate::Where(matching(matcher, false))],
        )
        .step(Axis::PrecedingSibling, NodeTest::tag("th"), vec![]);
    XPath::anywhere(NodeTest::tag("tbody"), vec![])
        .step(Axis::Child, NodeTest::tag("tr"), vec![])
        .step(
            Axis::Child,
            NodeTest::Any,
            vec![Predicate::Position(Position::CountPlusOne(Box::new(
                before_header,
            )))],
        )
}
