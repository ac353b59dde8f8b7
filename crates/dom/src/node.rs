//! DOM nodes.

use crate::element::ElementData;
use slotmap::new_key_type;
use smallvec::SmallVec;

new_key_type! {
    /// Handle to a node in a [`DomTree`](crate::DomTree).
    pub struct NodeId;
}

/// What a node holds.
#[derive(Clone, Debug)]
pub enum NodeData {
    Document,
    Element(ElementData),
}

/// A node in the tree.
///
/// Siblings are derived from the parent's child list; a node only knows its
/// parent and its own children.
#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: SmallVec<[NodeId; 4]>,
}

impl Node {
    fn new(id: NodeId, data: NodeData) -> Self {
        Self {
            id,
            data,
            parent: None,
            children: SmallVec::new(),
        }
    }

    pub fn document(id: NodeId) -> Self {
        Self::new(id, NodeData::Document)
    }

    pub fn element(id: NodeId, data: ElementData) -> Self {
        Self::new(id, NodeData::Element(data))
    }

    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(data) => Some(data),
            NodeData::Document => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(data) => Some(data),
            NodeData::Document => None,
        }
    }

    /// `#document` or the lowercase tag name.
    pub fn node_name(&self) -> &str {
        match &self.data {
            NodeData::Document => "#document",
            NodeData::Element(el) => el.tag_name.as_str(),
        }
    }
}
