//! In-memory DOM driver.
//!
//! A small document model with layout boxes and nested frame documents.
//! Queries are evaluated straight from the [`XPath`] tree, and every query
//! and frame listing is recorded so tests can assert search order.

mod eval;

use crate::driver::{Driver, DriverError, Frame, NodeHandle, Rect};
use crate::xpath::XPath;
use async_trait::async_trait;
use eval::Eval;
use parking_lot::Mutex;

/// Index of a node inside its [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Element under construction.
#[derive(Debug, Clone)]
pub struct El {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    rect: Rect,
    content: Option<Document>,
}

impl El {
    /// A 10x10 box at the origin.
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Vec::new(),
            text: String::new(),
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            content: None,
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    /// Text rendered before any child elements.
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn at(mut self, top: f64, left: f64, bottom: f64, right: f64) -> Self {
        self.rect = Rect::new(top, left, bottom, right);
        self
    }

    /// Present in the DOM but not rendered.
    pub fn hidden(mut self) -> Self {
        self.rect.bottom = self.rect.top;
        self
    }

    /// Document loaded by this element (for `iframe`s).
    pub fn content(mut self, document: Document) -> Self {
        self.content = Some(document);
        self
    }
}

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    text: String,
    rect: Rect,
    parent: Option<usize>,
    children: Vec<usize>,
    content: Option<Document>,
}

impl Node {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Tree of elements rooted at a document node holding `<html><body>`.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
}

const DOCUMENT: usize = 0;
const BODY: usize = 2;

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: vec![Node {
                tag: "#document".into(),
                attrs: Vec::new(),
                text: String::new(),
                rect: Rect::default(),
                parent: None,
                children: Vec::new(),
                content: None,
            }],
        };
        let html = doc.insert(DOCUMENT, El::new("html").at(0.0, 0.0, 1000.0, 1000.0));
        doc.insert(html.0, El::new("body").at(0.0, 0.0, 1000.0, 1000.0));
        doc
    }

    pub fn body(&self) -> NodeId {
        NodeId(BODY)
    }

    /// Append `el` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, el: El) -> NodeId {
        self.insert(parent.0, el)
    }

    fn insert(&mut self, parent: usize, el: El) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            tag: el.tag,
            attrs: el.attrs,
            text: el.text,
            rect: el.rect,
            parent: Some(parent),
            children: Vec::new(),
            content: el.content,
        });
        self.nodes[parent].children.push(id);
        NodeId(id)
    }

    /// Handle a driver would return for `id`.
    pub fn handle(&self, id: NodeId) -> NodeHandle {
        NodeHandle(id.0.to_string())
    }

    fn node(&self, handle: &NodeHandle) -> Result<&Node, DriverError> {
        handle
            .as_str()
            .parse::<usize>()
            .ok()
            .filter(|&id| id != DOCUMENT)
            .and_then(|id| self.nodes.get(id))
            .ok_or_else(|| DriverError::Stale(handle.clone()))
    }

    /// `iframe` elements in document order.
    fn iframes(&self) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![DOCUMENT];
        while let Some(id) = stack.pop() {
            if self.nodes[id].tag == "iframe" {
                out.push(id);
            }
            stack.extend(self.nodes[id].children.iter().rev());
        }
        out
    }
}

/// A recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FindNodes { frame: Frame, query: String },
    Frames,
    Release,
}

/// [`Driver`] over an in-memory [`Document`].
#[derive(Debug)]
pub struct MemoryDriver {
    document: Document,
    calls: Mutex<Vec<Call>>,
}

impl MemoryDriver {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Queries, frame listings and releases issued so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Frames queried so far, in call order.
    pub fn searched_frames(&self) -> Vec<Frame> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::FindNodes { frame, .. } => Some(*frame),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn document_for(&self, frame: Frame) -> Result<&Document, DriverError> {
        match frame {
            Frame::Default => Ok(&self.document),
            Frame::Index(n) => self
                .document
                .iframes()
                .get(n)
                .and_then(|&id| self.document.nodes[id].content.as_ref())
                .ok_or(DriverError::NoSuchFrame(n)),
        }
    }
}

#[async_trait(?Send)]
impl Driver for MemoryDriver {
    async fn find_nodes(&self, frame: Frame, query: &XPath) -> Result<Vec<NodeHandle>, DriverError> {
        self.calls.lock().push(Call::FindNodes {
            frame,
            query: query.to_string(),
        });
        let doc = self.document_for(frame)?;
        let ids = Eval::new(doc).select(query, DOCUMENT);
        Ok(ids.into_iter().map(|id| NodeHandle(id.to_string())).collect())
    }

    async fn tag_name(&self, frame: Frame, node: &NodeHandle) -> Result<String, DriverError> {
        Ok(self.document_for(frame)?.node(node)?.tag.clone())
    }

    async fn bounding_rect(&self, frame: Frame, node: &NodeHandle) -> Result<Rect, DriverError> {
        Ok(self.document_for(frame)?.node(node)?.rect)
    }

    async fn attribute(
        &self,
        frame: Frame,
        node: &NodeHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError> {
        let node = self.document_for(frame)?.node(node)?;
        Ok(node.attr(name).map(str::to_string))
    }

    async fn parent(
        &self,
        frame: Frame,
        node: &NodeHandle,
    ) -> Result<Option<NodeHandle>, DriverError> {
        let node = self.document_for(frame)?.node(node)?;
        Ok(node
            .parent
            .filter(|&id| id != DOCUMENT)
            .map(|id| NodeHandle(id.to_string())))
    }

    async fn frames(&self) -> Result<Vec<NodeHandle>, DriverError> {
        self.calls.lock().push(Call::Frames);
        Ok(self
            .document
            .iframes()
            .into_iter()
            .map(|id| NodeHandle(id.to_string()))
            .collect())
    }

    /// Handles index the document directly and stay valid.
    async fn release(&self) -> Result<(), DriverError> {
        self.calls.lock().push(Call::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xpath::{NodeTest, Predicate};

    #[tokio::test]
    async fn test_frames_in_document_order() {
        let mut doc = Document::new();
        let body = doc.body();
        let wrap = doc.append(body, El::new("div"));
        doc.append(wrap, El::new("iframe").attr("id", "first"));
        doc.append(body, El::new("iframe").attr("id", "second").content(Document::new()));
        let driver = MemoryDriver::new(doc);

        let frames = driver.frames().await.unwrap();
        assert_eq!(frames.len(), 2);
        let id = driver
            .attribute(Frame::Default, &frames[0], "id")
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("first"));

        // first iframe has no loaded document
        assert!(matches!(
            driver.document_for(Frame::Index(0)),
            Err(DriverError::NoSuchFrame(0))
        ));
        assert!(driver.document_for(Frame::Index(1)).is_ok());
        assert_eq!(driver.calls(), vec![Call::Frames]);
    }

    #[tokio::test]
    async fn test_find_nodes_records_calls() {
        let mut doc = Document::new();
        let body = doc.body();
        let p = doc.append(body, El::new("p"));
        let driver = MemoryDriver::new(doc);

        let query = XPath::anywhere(NodeTest::tag("p"), Vec::<Predicate>::new());
        let found = driver.find_nodes(Frame::Default, &query).await.unwrap();
        assert_eq!(found, vec![driver.document().handle(p)]);
        assert_eq!(driver.searched_frames(), vec![Frame::Default]);

        driver.clear_calls();
        assert!(driver.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_handle_is_stale() {
        let driver = MemoryDriver::new(Document::new());
        let bogus = NodeHandle::new("999");
        assert!(matches!(
            driver.tag_name(Frame::Default, &bogus).await,
            Err(DriverError::Stale(_))
        ));
        let root = NodeHandle::new("0");
        assert!(driver.bounding_rect(Frame::Default, &root).await.is_err());
    }

    #[tokio::test]
    async fn test_parent_stops_at_html() {
        let doc = Document::new();
        let html = NodeHandle::new("1");
        let body = doc.handle(doc.body());
        let driver = MemoryDriver::new(doc);
        assert_eq!(
            driver.parent(Frame::Default, &body).await.unwrap(),
            Some(html.clone())
        );
        assert_eq!(driver.parent(Frame::Default, &html).await.unwrap(), None);
    }
}
