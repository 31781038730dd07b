//! `xlocate::Driver` over a live `eoka::Page`.
//!
//! Matched nodes are kept in a registry on the page's window and addressed
//! by string handles. Frame documents are reached through
//! `document.querySelectorAll('iframe')[n].contentDocument`, so only
//! same-origin frames are searchable.

use async_trait::async_trait;
use eoka::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::trace;
use xlocate::{Driver, DriverError, Frame, NodeHandle, Rect, XPath};

const PRELUDE: &str = r#"
    const reg = window.__xlocate || (window.__xlocate = { next: 0, nodes: new Map() });
    const keep = (n) => { const id = String(reg.next++); reg.nodes.set(id, n); return id; };
    const live = (id) => { const n = reg.nodes.get(id); return n && n.isConnected ? n : null; };
    const frameDoc = (i) => {
        if (i === null) return document;
        const f = document.querySelectorAll('iframe')[i];
        try { return f ? f.contentDocument : null; } catch (e) { return null; }
    };
"#;

const FIND_NODES_JS: &str = r#"
    const doc = frameDoc(FRAME);
    if (!doc) return null;
    const snap = doc.evaluate(QUERY, doc, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
    const out = [];
    for (let i = 0; i < snap.snapshotLength; i++) {
        const n = snap.snapshotItem(i);
        if (n.nodeType === 1) out.push(keep(n));
    }
    return out;
"#;

const TAG_NAME_JS: &str = r#"
    const n = live(NODE);
    return n ? n.tagName.toLowerCase() : null;
"#;

const RECT_JS: &str = r#"
    const n = live(NODE);
    if (!n) return null;
    const r = n.getBoundingClientRect();
    return { top: r.top, left: r.left, bottom: r.bottom, right: r.right };
"#;

const ATTRIBUTE_JS: &str = r#"
    const n = live(NODE);
    return n ? { value: n.getAttribute(NAME) } : null;
"#;

const PARENT_JS: &str = r#"
    const n = live(NODE);
    if (!n) return null;
    const p = n.parentElement;
    return { node: p ? keep(p) : null };
"#;

const FRAMES_JS: &str = r#"
    return Array.from(document.querySelectorAll('iframe')).map(keep);
"#;

const RELEASE_JS: &str = "delete window.__xlocate";

#[derive(Deserialize)]
struct AttributeValue {
    value: Option<String>,
}

#[derive(Deserialize)]
struct ParentNode {
    node: Option<String>,
}

/// Browser-backed driver for one page.
pub struct EokaDriver<'a> {
    page: &'a Page,
}

impl<'a> EokaDriver<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self { page }
    }

    async fn eval<T: DeserializeOwned>(&self, body: &str) -> Result<T, DriverError> {
        let js = format!("(() => {{ {}\n{} }})()", PRELUDE, body);
        self.page.evaluate(&js).await.map_err(backend)
    }

    async fn on_node<T: DeserializeOwned>(
        &self,
        template: &str,
        node: &NodeHandle,
    ) -> Result<T, DriverError> {
        let body = template.replace("NODE", &json(node.as_str()));
        let found: Option<T> = self.eval(&body).await?;
        found.ok_or_else(|| DriverError::Stale(node.clone()))
    }
}

fn backend(e: eoka::Error) -> DriverError {
    DriverError::Backend(e.to_string())
}

fn json(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

#[async_trait(?Send)]
impl Driver for EokaDriver<'_> {
    async fn find_nodes(&self, frame: Frame, query: &XPath) -> Result<Vec<NodeHandle>, DriverError> {
        let query = query.to_string();
        trace!("evaluate in {}: {}", frame, query);
        let index = match frame {
            Frame::Default => "null".to_string(),
            Frame::Index(n) => n.to_string(),
        };
        let body = FIND_NODES_JS
            .replace("FRAME", &index)
            .replace("QUERY", &json(&query));
        let ids: Option<Vec<String>> = self.eval(&body).await?;
        match (ids, frame) {
            (Some(ids), _) => Ok(ids.into_iter().map(NodeHandle).collect()),
            (None, Frame::Index(n)) => Err(DriverError::NoSuchFrame(n)),
            (None, Frame::Default) => Err(DriverError::Backend("document unavailable".into())),
        }
    }

    async fn tag_name(&self, _frame: Frame, node: &NodeHandle) -> Result<String, DriverError> {
        self.on_node(TAG_NAME_JS, node).await
    }

    async fn bounding_rect(&self, _frame: Frame, node: &NodeHandle) -> Result<Rect, DriverError> {
        self.on_node(RECT_JS, node).await
    }

    async fn attribute(
        &self,
        _frame: Frame,
        node: &NodeHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let template = ATTRIBUTE_JS.replace("NAME", &json(name));
        let attr: AttributeValue = self.on_node(&template, node).await?;
        Ok(attr.value)
    }

    async fn parent(
        &self,
        _frame: Frame,
        node: &NodeHandle,
    ) -> Result<Option<NodeHandle>, DriverError> {
        let parent: ParentNode = self.on_node(PARENT_JS, node).await?;
        Ok(parent.node.map(NodeHandle))
    }

    async fn frames(&self) -> Result<Vec<NodeHandle>, DriverError> {
        let ids: Vec<String> = self.eval(FRAMES_JS).await?;
        Ok(ids.into_iter().map(NodeHandle).collect())
    }

    /// Drop every registered node handle.
    async fn release(&self) -> Result<(), DriverError> {
        self.page.execute(RELEASE_JS).await.map_err(backend)?;
        Ok(())
    }
}
