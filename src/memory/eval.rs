//! XPath evaluation over a [`Document`].

use super::{Document, DOCUMENT};
use crate::xpath::{Axis, Cmp, Cond, NodeTest, Position, Predicate, XPath};

pub(super) struct Eval<'a> {
    doc: &'a Document,
    /// Node ids in document order.
    order: Vec<usize>,
    /// Document-order position of each node id.
    rank: Vec<usize>,
    /// Subtree size (self included) of each node id.
    size: Vec<usize>,
    /// `normalize-space(.)` of each node id.
    text: Vec<String>,
}

impl<'a> Eval<'a> {
    pub(super) fn new(doc: &'a Document) -> Self {
        let n = doc.nodes.len();
        let mut order = Vec::with_capacity(n);
        let mut stack = vec![DOCUMENT];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(doc.nodes[id].children.iter().rev());
        }

        let mut rank = vec![0; n];
        for (pos, &id) in order.iter().enumerate() {
            rank[id] = pos;
        }

        let mut size = vec![1; n];
        let mut raw = vec![String::new(); n];
        for &id in order.iter().rev() {
            let node = &doc.nodes[id];
            let mut value = node.text.clone();
            for &child in &node.children {
                size[id] += size[child];
                value.push_str(&raw[child]);
            }
            raw[id] = value;
        }
        let text = raw.iter().map(|s| normalize_space(s)).collect();

        Self {
            doc,
            order,
            rank,
            size,
            text,
        }
    }

    /// Evaluate `expr` with `context` as the context node.
    pub(super) fn select(&self, expr: &XPath, context: usize) -> Vec<usize> {
        let mut out = match expr {
            XPath::Context => vec![context],
            XPath::Anywhere { test, predicates } => {
                let mut out = Vec::new();
                for &parent in &self.order {
                    let children = self.axis(parent, Axis::Child);
                    out.extend(self.filter(children, test, predicates));
                }
                out
            }
            XPath::Path {
                base,
                axis,
                test,
                predicates,
            } => {
                let mut out = Vec::new();
                for from in self.select(base, context) {
                    out.extend(self.filter(self.axis(from, *axis), test, predicates));
                }
                out
            }
            XPath::Nth { base, n } => self
                .select(base, context)
                .get(n.get() - 1)
                .copied()
                .into_iter()
                .collect(),
            XPath::Union(parts) => parts
                .iter()
                .flat_map(|part| self.select(part, context))
                .collect(),
        };
        out.sort_by_key(|&id| self.rank[id]);
        out.dedup();
        out
    }

    /// Nodes on `axis` from `from`, in axis order.
    fn axis(&self, from: usize, axis: Axis) -> Vec<usize> {
        let nodes = &self.doc.nodes;
        match axis {
            Axis::Child => nodes[from].children.clone(),
            Axis::Descendant => {
                let start = self.rank[from] + 1;
                self.order[start..self.rank[from] + self.size[from]].to_vec()
            }
            Axis::Following => self.order[self.rank[from] + self.size[from]..].to_vec(),
            Axis::PrecedingSibling => match nodes[from].parent {
                Some(parent) => {
                    let siblings = &nodes[parent].children;
                    let at = siblings.iter().position(|&s| s == from).unwrap_or(0);
                    siblings[..at].iter().rev().copied().collect()
                }
                None => Vec::new(),
            },
            Axis::SelfNode if from == DOCUMENT => Vec::new(),
            Axis::SelfNode => vec![from],
        }
    }

    fn filter(&self, nodes: Vec<usize>, test: &NodeTest, predicates: &[Predicate]) -> Vec<usize> {
        let mut kept: Vec<usize> = nodes
            .into_iter()
            .filter(|&id| test.matches(&self.doc.nodes[id].tag))
            .collect();
        for predicate in predicates {
            kept = kept
                .into_iter()
                .enumerate()
                .filter(|&(i, id)| self.holds(predicate, id, i + 1))
                .map(|(_, id)| id)
                .collect();
        }
        kept
    }

    fn holds(&self, predicate: &Predicate, id: usize, position: usize) -> bool {
        match predicate {
            Predicate::Where(cond) => self.test(cond, id),
            Predicate::Position(Position::Nth(n)) => position == n.get(),
            Predicate::Position(Position::CountPlusOne(expr)) => {
                position == self.select(expr, DOCUMENT).len() + 1
            }
        }
    }

    fn test(&self, cond: &Cond, id: usize) -> bool {
        match cond {
            Cond::Or(parts) => parts.iter().any(|c| self.test(c, id)),
            Cond::And(parts) => parts.iter().all(|c| self.test(c, id)),
            Cond::Not(inner) => !self.test(inner, id),
            Cond::Attr { name, cmp, value } => match self.doc.nodes[id].attr(name) {
                Some(actual) => cmp.test(actual, value),
                // a missing attribute compares as the empty string in contains()
                None => *cmp == Cmp::Contains && value.is_empty(),
            },
            Cond::Text { cmp, value } => cmp.test(&self.text[id], value),
            Cond::Exists(path) => !self.select(path, id).is_empty(),
        }
    }
}

/// XPath `normalize-space()`.
pub(super) fn normalize_space(s: &str) -> String {
    s.split([' ', '\t', '\n', '\r'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
