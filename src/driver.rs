//! The browser-driver seam.
//!
//! Every call names the document context it runs in, so resolution never
//! depends on a hidden "current frame" left behind by an earlier call.

use crate::xpath::XPath;
use async_trait::async_trait;
use std::fmt;

/// Document context a driver call executes against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Frame {
    /// The top-level document.
    #[default]
    Default,
    /// The n-th `iframe` of the top-level document, in document order.
    Index(usize),
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Default => f.write_str("default"),
            Frame::Index(n) => write!(f, "frame {}", n),
        }
    }
}

/// Opaque reference to a live node, valid within the frame it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub String);

impl NodeHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bounding rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Deserialize)]
pub struct Rect {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Rect {
    pub fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Whether `other` lies entirely inside this rectangle, edges included.
    pub fn encloses(&self, other: &Rect) -> bool {
        self.left <= other.left
            && self.right >= other.right
            && self.top <= other.top
            && self.bottom >= other.bottom
    }
}

/// Failures reported by a driver backend.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DriverError {
    /// The node was detached or replaced since it was found.
    #[error("stale node {0}")]
    Stale(NodeHandle),

    #[error("no such frame: {0}")]
    NoSuchFrame(usize),

    #[error("{0}")]
    Backend(String),
}

/// Read-only DOM access needed by resolution.
///
/// Calls for one resolution are awaited strictly in sequence, so the
/// futures carry no `Send` bound.
#[async_trait(?Send)]
pub trait Driver {
    /// Elements matching `query`, in document order.
    async fn find_nodes(&self, frame: Frame, query: &XPath) -> Result<Vec<NodeHandle>, DriverError>;

    /// Lower-case tag name.
    async fn tag_name(&self, frame: Frame, node: &NodeHandle) -> Result<String, DriverError>;

    async fn bounding_rect(&self, frame: Frame, node: &NodeHandle) -> Result<Rect, DriverError>;

    async fn attribute(
        &self,
        frame: Frame,
        node: &NodeHandle,
        name: &str,
    ) -> Result<Option<String>, DriverError>;

    /// Parent element, `None` at the document root.
    async fn parent(&self, frame: Frame, node: &NodeHandle)
        -> Result<Option<NodeHandle>, DriverError>;

    /// The `iframe` elements of the top-level document, in document order.
    async fn frames(&self) -> Result<Vec<NodeHandle>, DriverError>;

    /// Forget every handle returned so far. Later calls with an old handle
    /// may report it stale.
    async fn release(&self) -> Result<(), DriverError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_dimensions() {
        let r = Rect::new(100.0, 0.0, 120.0, 50.0);
        assert_eq!(r.height(), 20.0);
        assert_eq!(r.width(), 50.0);
    }

    #[test]
    fn rect_encloses_counts_touching_edges() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.encloses(&Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert!(outer.encloses(&Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!outer.encloses(&Rect::new(10.0, 10.0, 120.0, 20.0)));
    }

    #[test]
    fn frame_display() {
        assert_eq!(Frame::Default.to_string(), "default");
        assert_eq!(Frame::Index(2).to_string(), "frame 2");
    }
}
