//! DOM Document implementation.

use crate::element::{ElementData, TagName};
use crate::node::NodeId;
use crate::tree::DomTree;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::Arc;
use url::Url;

static ABOUT_BLANK: Lazy<Url> =
    Lazy::new(|| Url::parse("about:blank").expect("about:blank is a valid URL"));

/// DOM Document.
///
/// A new document always has the `<html><head></head><body></body></html>`
/// skeleton, so `head` and `body` are set unless a caller detaches them.
#[derive(Debug)]
pub struct Document {
    /// The DOM tree.
    pub tree: DomTree,
    /// Document URL, used as the base for relative script sources.
    pub url: Url,
    /// Document element (<html>).
    pub document_element: Option<NodeId>,
    /// Head element.
    pub head: Option<NodeId>,
    /// Body element.
    pub body: Option<NodeId>,
}

impl Document {
    pub fn new(url: Url) -> Self {
        let mut tree = DomTree::new();
        let root = tree.root();

        let html = tree.create_element(ElementData::new(TagName::html()));
        let head = tree.create_element(ElementData::new(TagName::head()));
        let body = tree.create_element(ElementData::new(TagName::body()));
        tree.append_child(root, html);
        tree.append_child(html, head);
        tree.append_child(html, body);

        Self {
            tree,
            url,
            document_element: Some(html),
            head: Some(head),
            body: Some(body),
        }
    }

    /// Create a blank document.
    pub fn blank() -> Self {
        Self::new(ABOUT_BLANK.clone())
    }

    /// Wrap the document for sharing between components.
    pub fn into_ref(self) -> DocumentRef {
        Arc::new(RwLock::new(self))
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn body(&self) -> Option<NodeId> {
        self.body
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.tree.create_element(ElementData::new(TagName::new(tag_name)))
    }

    /// Get element by ID.
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.find_element_by_id(id)
    }

    /// Get elements by tag name.
    pub fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeId> {
        self.tree.find_elements_by_tag_name(tag_name)
    }

    /// Connected `<script>` elements whose `src` is exactly `src`.
    pub fn scripts_with_src(&self, src: &str) -> Vec<NodeId> {
        self.get_elements_by_tag_name("script")
            .into_iter()
            .filter(|&id| {
                self.tree
                    .get_element(id)
                    .and_then(|e| e.get_attribute("src"))
                    .map_or(false, |s| s == src)
            })
            .collect()
    }

    /// Resolve a URL relative to the document.
    pub fn resolve_url(&self, url: &str) -> Result<Url, url::ParseError> {
        self.url.join(url)
    }

    /// Append child to body.
    pub fn append_to_body(&mut self, node: NodeId) {
        if let Some(body) = self.body {
            self.tree.append_child(body, node);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::blank()
    }
}

/// Shared document reference.
pub type DocumentRef = Arc<RwLock<Document>>;
