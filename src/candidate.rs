//! Candidate locator: run a query and enrich every live match.

use crate::driver::{Driver, DriverError, Frame, NodeHandle, Rect};
use crate::xpath::XPath;
use crate::Result;
use futures::future::join_all;
use tracing::{debug, trace};

/// A live element plus what resolution needs to know about it.
///
/// Built fresh on every lookup; the page may have changed since.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub element: NodeHandle,
    /// Lower-case tag name.
    pub tag_name: String,
    pub rect: Rect,
    /// Document context the element was found in.
    pub frame: Frame,
    /// `contenteditable` of the element, else of its parent.
    pub contenteditable: Option<String>,
}

impl Candidate {
    /// Whether the element (or its parent) is marked `contenteditable="true"`.
    pub fn is_editable(&self) -> bool {
        self.contenteditable.as_deref() == Some("true")
    }
}

/// Rendered bounding rectangle of a node.
pub async fn bounding_rect<D: Driver + ?Sized>(
    driver: &D,
    frame: Frame,
    node: &NodeHandle,
) -> std::result::Result<Rect, DriverError> {
    let rect = driver.bounding_rect(frame, node).await?;
    trace!("rect of {} in {}: {:?}", node, frame, rect);
    Ok(rect)
}

/// Run `query` in `frame` and return its rendered matches.
///
/// Zero-height matches are dropped, as are nodes that went stale while
/// being enriched. An empty result is not an error.
pub async fn locate<D: Driver + ?Sized>(
    driver: &D,
    frame: Frame,
    query: &XPath,
) -> Result<Vec<Candidate>> {
    let nodes = driver.find_nodes(frame, query).await?;
    let found = nodes.len();

    let enriched = join_all(nodes.into_iter().map(|node| enrich(driver, frame, node))).await;

    let mut candidates = Vec::with_capacity(enriched.len());
    for result in enriched {
        match result {
            Ok(candidate) if candidate.rect.height() > 0.0 => candidates.push(candidate),
            Ok(candidate) => trace!("skipping zero-height <{}>", candidate.tag_name),
            Err(DriverError::Stale(node)) => debug!("skipping stale node {}", node),
            Err(e) => return Err(e.into()),
        }
    }

    debug!(
        "locate in {}: {} matched, {} rendered",
        frame,
        found,
        candidates.len()
    );
    Ok(candidates)
}

async fn enrich<D: Driver + ?Sized>(
    driver: &D,
    frame: Frame,
    node: NodeHandle,
) -> std::result::Result<Candidate, DriverError> {
    let (tag_name, rect, contenteditable) = futures::try_join!(
        driver.tag_name(frame, &node),
        bounding_rect(driver, frame, &node),
        editable_signal(driver, frame, &node),
    )?;
    Ok(Candidate {
        element: node,
        tag_name: tag_name.to_ascii_lowercase(),
        rect,
        frame,
        contenteditable,
    })
}

async fn editable_signal<D: Driver + ?Sized>(
    driver: &D,
    frame: Frame,
    node: &NodeHandle,
) -> std::result::Result<Option<String>, DriverError> {
    let own = driver.attribute(frame, node, "contenteditable").await?;
    if let Some(value) = own.filter(|v| !v.is_empty()) {
        return Ok(Some(value));
    }
    let Some(parent) = driver.parent(frame, node).await? else {
        return Ok(None);
    };
    let inherited = driver.attribute(frame, &parent, "contenteditable").await?;
    Ok(inherited.filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Descriptor, Matcher};
    use crate::memory::{Document, El, MemoryDriver};
    use crate::query::synthesize;
    use async_trait::async_trait;

    /// Fails `tag_name` or `bounding_rect` for a single node.
    struct FailingNode {
        inner: MemoryDriver,
        node: NodeHandle,
        error: DriverError,
        on_rect: bool,
    }

    #[async_trait(?Send)]
    impl Driver for FailingNode {
        async fn find_nodes(
            &self,
            frame: Frame,
            query: &XPath,
        ) -> std::result::Result<Vec<NodeHandle>, DriverError> {
            self.inner.find_nodes(frame, query).await
        }

        async fn tag_name(
            &self,
            frame: Frame,
            node: &NodeHandle,
        ) -> std::result::Result<String, DriverError> {
            if !self.on_rect && *node == self.node {
                return Err(self.error.clone());
            }
            self.inner.tag_name(frame, node).await
        }

        async fn bounding_rect(
            &self,
            frame: Frame,
            node: &NodeHandle,
        ) -> std::result::Result<Rect, DriverError> {
            if self.on_rect && *node == self.node {
                return Err(self.error.clone());
            }
            self.inner.bounding_rect(frame, node).await
        }

        async fn attribute(
            &self,
            frame: Frame,
            node: &NodeHandle,
            name: &str,
        ) -> std::result::Result<Option<String>, DriverError> {
            self.inner.attribute(frame, node, name).await
        }

        async fn parent(
            &self,
            frame: Frame,
            node: &NodeHandle,
        ) -> std::result::Result<Option<NodeHandle>, DriverError> {
            self.inner.parent(frame, node).await
        }

        async fn frames(&self) -> std::result::Result<Vec<NodeHandle>, DriverError> {
            self.inner.frames().await
        }
    }

    fn two_buttons() -> (MemoryDriver, NodeHandle) {
        let mut doc = Document::new();
        let body = doc.body();
        let first = doc.append(body, El::new("button").text("Go").at(0.0, 0.0, 10.0, 40.0));
        doc.append(body, El::new("button").text("Go").at(20.0, 0.0, 30.0, 40.0));
        let handle = doc.handle(first);
        (MemoryDriver::new(doc), handle)
    }

    fn exact(id: &str) -> XPath {
        synthesize(&Descriptor::Element(Matcher::exact(id).into()), None, None).unwrap()
    }

    #[tokio::test]
    async fn test_zero_height_is_excluded() {
        let mut doc = Document::new();
        let body = doc.body();
        doc.append(body, El::new("button").text("Go").at(0.0, 0.0, 20.0, 40.0));
        doc.append(body, El::new("button").text("Go").at(30.0, 0.0, 30.0, 40.0));
        let driver = MemoryDriver::new(doc);

        let found = locate(&driver, Frame::Default, &exact("Go")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rect.top, 0.0);
        assert_eq!(found[0].tag_name, "button");
        assert_eq!(found[0].frame, Frame::Default);

        let again = locate(&driver, Frame::Default, &exact("Go")).await.unwrap();
        assert_eq!(found, again);
    }

    #[tokio::test]
    async fn test_contenteditable_from_parent() {
        let mut doc = Document::new();
        let body = doc.body();
        let editor = doc.append(body, El::new("div").attr("contenteditable", "true"));
        doc.append(editor, El::new("p").text("Body text"));
        doc.append(body, El::new("p").text("Footer text"));
        let driver = MemoryDriver::new(doc);

        let inside = locate(&driver, Frame::Default, &exact("Body text")).await.unwrap();
        assert_eq!(inside.len(), 1);
        assert!(inside[0].is_editable());

        let outside = locate(&driver, Frame::Default, &exact("Footer text")).await.unwrap();
        assert_eq!(outside[0].contenteditable, None);
        assert!(!outside[0].is_editable());
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let driver = MemoryDriver::new(Document::new());
        let found = locate(&driver, Frame::Default, &exact("Nothing")).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_missing_frame_propagates() {
        let driver = MemoryDriver::new(Document::new());
        let err = locate(&driver, Frame::Index(0), &exact("x")).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Driver(DriverError::NoSuchFrame(0))
        ));
    }

    #[tokio::test]
    async fn test_stale_node_is_dropped() {
        let (inner, first) = two_buttons();
        let stale = first.clone();
        let driver = FailingNode {
            inner,
            node: first,
            error: DriverError::Stale(stale),
            on_rect: false,
        };

        let found = locate(&driver, Frame::Default, &exact("Go")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].rect.top, 20.0);

        let best = crate::find(&driver, &[Descriptor::Element(Matcher::exact("Go").into())], None)
            .await
            .unwrap();
        assert_eq!(best.rect.top, 20.0);
    }

    #[tokio::test]
    async fn test_backend_error_during_enrichment_propagates() {
        let (inner, first) = two_buttons();
        let driver = FailingNode {
            inner,
            node: first,
            error: DriverError::Backend("target closed".into()),
            on_rect: true,
        };

        let err = locate(&driver, Frame::Default, &exact("Go")).await.unwrap_err();
        assert!(matches!(
            err,
            crate::Error::Driver(DriverError::Backend(ref m)) if m == "target closed"
        ));
    }
}
