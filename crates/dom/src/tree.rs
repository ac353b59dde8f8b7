//! The node tree.

use crate::element::ElementData;
use crate::node::{Node, NodeId};
use slotmap::SlotMap;
use tracing::debug;

/// The DOM tree structure.
///
/// Nodes live in a slot map and refer to each other by [`NodeId`], so a
/// handle never keeps a node alive and never dangles: lookups on a removed
/// node simply return `None`.
#[derive(Debug)]
pub struct DomTree {
    nodes: SlotMap<NodeId, Node>,
    root: NodeId,
}

impl DomTree {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert_with_key(Node::document);
        Self { nodes, root }
    }

    /// Get the root document node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Get element data for a node.
    pub fn get_element(&self, id: NodeId) -> Option<&ElementData> {
        self.nodes.get(id).and_then(|n| n.as_element())
    }

    /// Get mutable element data for a node.
    pub fn get_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.nodes.get_mut(id).and_then(|n| n.as_element_mut())
    }

    /// Create a detached element node.
    pub fn create_element(&mut self, data: ElementData) -> NodeId {
        self.nodes.insert_with_key(|id| Node::element(id, data))
    }

    /// Append a child to a parent node, moving it out of its old parent.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, None);
    }

    /// Insert `child` into `parent` before `reference`, or at the end when
    /// `reference` is `None` or not a child of `parent`.
    ///
    /// Inserting a node into itself or into one of its own descendants is
    /// ignored.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        if self.contains(child, parent) {
            debug!("refusing to insert a node into its own subtree");
            return;
        }

        self.remove_from_parent(child);

        if let Some(parent_node) = self.nodes.get_mut(parent) {
            let pos = reference
                .and_then(|r| parent_node.children.iter().position(|&id| id == r))
                .unwrap_or(parent_node.children.len());
            parent_node.children.insert(pos, child);
        }

        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
        }
    }

    /// Detach a node from its parent, keeping it (and its subtree) alive.
    pub fn remove_from_parent(&mut self, node: NodeId) {
        let parent = match self.nodes.get(node) {
            Some(n) => n.parent,
            None => return,
        };

        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.nodes.get_mut(parent_id) {
                parent_node.children.retain(|id| *id != node);
            }
        }

        if let Some(node_data) = self.nodes.get_mut(node) {
            node_data.parent = None;
        }
    }

    /// Remove a node and its whole subtree from the tree.
    pub fn remove(&mut self, node: NodeId) {
        if node == self.root {
            return;
        }
        self.remove_from_parent(node);

        let mut to_remove = vec![node];
        let mut i = 0;
        while i < to_remove.len() {
            if let Some(n) = self.nodes.get(to_remove[i]) {
                to_remove.extend(n.children.iter().copied());
            }
            i += 1;
        }

        for id in to_remove {
            self.nodes.remove(id);
        }
    }

    /// Put `new_child` where `old_child` is and detach `old_child`.
    ///
    /// Unlike [`DomTree::remove`], the old child stays alive so it can be
    /// re-inserted elsewhere. Returns `false` if `old_child` is not a child of
    /// `parent`.
    pub fn replace_child(&mut self, parent: NodeId, new_child: NodeId, old_child: NodeId) -> bool {
        if self.parent(old_child) != Some(parent) {
            return false;
        }
        self.insert_before(parent, new_child, Some(old_child));
        self.remove_from_parent(old_child);
        true
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|n| n.parent)
    }

    /// Position of a node within its parent's children.
    pub fn child_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.nodes
            .get(parent)?
            .children
            .iter()
            .position(|&id| id == node)
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.child_index(node)?;
        self.nodes.get(parent)?.children.get(index + 1).copied()
    }

    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let index = self.child_index(node)?.checked_sub(1)?;
        self.nodes.get(parent)?.children.get(index).copied()
    }

    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .get(node)
            .into_iter()
            .flat_map(|n| n.children.iter().copied())
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|id| id == ancestor)
    }

    /// Whether a node is connected to the document root.
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    /// Iterate the ancestors of a node, nearest first.
    pub fn ancestors(&self, node: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(node),
        }
    }

    /// Iterate the descendants of a node in pre-order.
    pub fn descendants(&self, node: NodeId) -> DescendantIterator<'_> {
        let mut stack = Vec::new();
        if let Some(n) = self.nodes.get(node) {
            stack.extend(n.children.iter().rev().copied());
        }
        DescendantIterator { tree: self, stack }
    }

    /// Find a connected element by its `id` attribute.
    pub fn find_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root).find(|&node| {
            self.get_element(node)
                .and_then(|e| e.id())
                .map_or(false, |v| v == id)
        })
    }

    /// Find connected elements by tag name, in document order.
    pub fn find_elements_by_tag_name(&self, tag_name: &str) -> Vec<NodeId> {
        let is_all = tag_name == "*";
        self.descendants(self.root)
            .filter(|&id| {
                self.get_element(id)
                    .map_or(false, |e| is_all || e.tag_name == tag_name)
            })
            .collect()
    }

    /// Number of live nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestor nodes.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl<'a> Iterator for AncestorIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.tree.parent(current);
        Some(current)
    }
}

/// Iterator over descendant nodes (pre-order traversal).
pub struct DescendantIterator<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for DescendantIterator<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;

        // Children pushed in reverse so the first child pops first
        if let Some(node) = self.tree.nodes.get(current) {
            self.stack.extend(node.children.iter().rev().copied());
        }

        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::TagName;

    fn div(tree: &mut DomTree) -> NodeId {
        tree.create_element(ElementData::new(TagName::div()))
    }

    #[test]
    fn test_append_child() {
        let mut tree = DomTree::new();
        let root = tree.root();

        let a = div(&mut tree);
        tree.append_child(root, a);

        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.children(root).next(), Some(a));
        assert!(tree.is_connected(a));
    }

    #[test]
    fn test_insert_before_and_siblings() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let (a, b, c) = (div(&mut tree), div(&mut tree), div(&mut tree));

        tree.append_child(root, a);
        tree.append_child(root, c);
        tree.insert_before(root, b, Some(c));

        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![a, b, c]);
        assert_eq!(tree.next_sibling(a), Some(b));
        assert_eq!(tree.prev_sibling(c), Some(b));
        assert_eq!(tree.prev_sibling(a), None);
        assert_eq!(tree.child_index(c), Some(2));
    }

    #[test]
    fn test_replace_child_keeps_old_node_alive() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let (a, b, wrapper) = (div(&mut tree), div(&mut tree), div(&mut tree));
        tree.append_child(root, a);
        tree.append_child(root, b);

        assert!(tree.replace_child(root, wrapper, a));
        assert_eq!(tree.children(root).collect::<Vec<_>>(), vec![wrapper, b]);
        assert!(tree.get(a).is_some());
        assert_eq!(tree.parent(a), None);

        tree.append_child(wrapper, a);
        assert_eq!(tree.parent(a), Some(wrapper));
        assert!(!tree.replace_child(root, b, a));
    }

    #[test]
    fn test_insert_into_own_subtree_is_ignored() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let (outer, inner) = (div(&mut tree), div(&mut tree));
        tree.append_child(root, outer);
        tree.append_child(outer, inner);

        tree.append_child(inner, outer);
        assert_eq!(tree.parent(outer), Some(root));
        assert_eq!(tree.parent(inner), Some(outer));
    }

    #[test]
    fn test_find_by_id() {
        let mut tree = DomTree::new();
        let root = tree.root();

        let node = tree.create_element(ElementData::new(TagName::div()).with_attribute("id", "test"));
        assert_eq!(tree.find_element_by_id("test"), None);

        tree.append_child(root, node);
        assert_eq!(tree.find_element_by_id("test"), Some(node));
        assert_eq!(tree.find_element_by_id("other"), None);
    }

    #[test]
    fn test_remove_node() {
        let mut tree = DomTree::new();
        let root = tree.root();
        let outer = div(&mut tree);
        let inner = div(&mut tree);

        tree.append_child(root, outer);
        tree.append_child(outer, inner);

        tree.remove(outer);

        assert!(tree.get(outer).is_none());
        assert!(tree.get(inner).is_none());
        assert_eq!(tree.node_count(), 1);
    }
}
