//! DOM Tree (arena-based allocation)
//!
//! Every edit primitive applies its change and reports it back as a
//! [`TreeEdit`], so callers layered on top can observe the tree without
//! the tree knowing about them.

use crate::{Attr, DomError, DomResult, Node, NodeData, NodeId, TreeEdit};

/// Arena-based DOM tree for memory efficiency
#[derive(Debug)]
pub struct DomTree {
    pub(crate) nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new tree holding only the main document node
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
        }
    }

    /// The main document node
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    /// Check if a node exists
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Make freshly created, detached nodes the only children of `parent`
    pub(crate) fn link_children(&mut self, parent: NodeId, children: &[NodeId]) {
        for (i, &child) in children.iter().enumerate() {
            let node = &mut self.nodes[child.0 as usize];
            node.parent = parent;
            node.prev_sibling = if i > 0 { children[i - 1] } else { NodeId::NONE };
            node.next_sibling = children.get(i + 1).copied().unwrap_or(NodeId::NONE);
        }
        let node = &mut self.nodes[parent.0 as usize];
        node.first_child = children.first().copied().unwrap_or(NodeId::NONE);
        node.last_child = children.last().copied().unwrap_or(NodeId::NONE);
    }

    pub(crate) fn node(&self, id: NodeId) -> DomResult<&Node> {
        self.get(id).ok_or(DomError::NotFound)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> DomResult<&mut Node> {
        self.get_mut(id).ok_or(DomError::NotFound)
    }

    // ------------------------------------------------------------------
    // Creation
    // ------------------------------------------------------------------

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(Node::element(tag))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content.to_string()))
    }

    /// Create a detached comment node
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(Node::comment(content.to_string()))
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    /// Parent node (shadow roots and detached nodes have none)
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.to_option())
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child.to_option())
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.last_child.to_option())
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling.to_option())
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling.to_option())
    }

    /// Iterate over child IDs
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// First child that is an element
    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).find(|&c| self.is_element(c))
    }

    /// Next sibling that is an element
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.next_sibling(id);
        while let Some(node) = current {
            if self.is_element(node) {
                return Some(node);
            }
            current = self.next_sibling(node);
        }
        None
    }

    /// Check if a node is an element
    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id).is_some_and(Node::is_element)
    }

    /// Element tag name
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| e.local_name.as_str())
    }

    /// Check whether `ancestor` is `node` or one of its parents
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Whether `node` reaches the main document through parent links,
    /// crossing shadow boundaries via the host link
    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == NodeId::ROOT {
                return true;
            }
            let Some(n) = self.get(current) else {
                return false;
            };
            current = if n.parent.is_valid() {
                n.parent
            } else if let Some(host) = n.shadow_host() {
                host
            } else {
                return false;
            };
        }
    }

    /// Element descendants of `root` in tree order (light tree only)
    pub fn descendant_elements(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            if self.is_element(id) {
                out.push(id);
            }
            let start = stack.len();
            stack.extend(self.children(id));
            stack[start..].reverse();
        }
        out
    }

    // ------------------------------------------------------------------
    // Child list edits
    // ------------------------------------------------------------------

    /// Append a child node
    ///
    /// If `child` already has a parent it is removed first, and the removal
    /// is reported ahead of the insertion.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<Vec<TreeEdit>> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference` (or at the end when `None`)
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<Vec<TreeEdit>> {
        if !self.node(parent)?.can_have_children() {
            return Err(DomError::HierarchyRequest);
        }
        if matches!(
            self.node(child)?.data,
            NodeData::Document | NodeData::ShadowRoot { .. }
        ) {
            return Err(DomError::HierarchyRequest);
        }
        if self.is_inclusive_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest);
        }

        let mut reference = reference;
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild);
            }
            if r == child {
                reference = self.next_sibling(child);
            }
        }

        let mut edits = Vec::with_capacity(2);
        if let Some(old_parent) = self.parent(child) {
            edits.push(self.remove_child(old_parent, child)?);
        }

        let (prev, next) = match reference {
            Some(r) => (self.previous_sibling(r), Some(r)),
            None => (self.last_child(parent), None),
        };

        {
            let node = self.node_mut(child)?;
            node.parent = parent;
            node.prev_sibling = NodeId::from_option(prev);
            node.next_sibling = NodeId::from_option(next);
        }
        match prev {
            Some(p) => self.node_mut(p)?.next_sibling = child,
            None => self.node_mut(parent)?.first_child = child,
        }
        match next {
            Some(n) => self.node_mut(n)?.prev_sibling = child,
            None => self.node_mut(parent)?.last_child = child,
        }

        tracing::trace!("inserted {:?} under {:?}", child, parent);
        edits.push(TreeEdit::Inserted {
            parent,
            node: child,
            previous_sibling: prev,
            next_sibling: next,
        });
        Ok(edits)
    }

    /// Remove a child node
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<TreeEdit> {
        self.node(parent)?;
        if self.node(child)?.parent != parent {
            return Err(DomError::NotAChild);
        }

        let prev = self.previous_sibling(child);
        let next = self.next_sibling(child);
        match prev {
            Some(p) => self.node_mut(p)?.next_sibling = NodeId::from_option(next),
            None => self.node_mut(parent)?.first_child = NodeId::from_option(next),
        }
        match next {
            Some(n) => self.node_mut(n)?.prev_sibling = NodeId::from_option(prev),
            None => self.node_mut(parent)?.last_child = NodeId::from_option(prev),
        }
        {
            let node = self.node_mut(child)?;
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }

        tracing::trace!("removed {:?} from {:?}", child, parent);
        Ok(TreeEdit::Removed {
            parent,
            node: child,
            previous_sibling: prev,
            next_sibling: next,
        })
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    /// Get an attribute value (no namespace, name lowercased)
    pub fn get_attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        self.get_attribute_ns(element, None, &name.to_ascii_lowercase())
    }

    /// Get a namespaced attribute value
    pub fn get_attribute_ns(&self, element: NodeId, namespace: Option<&str>, name: &str) -> Option<&str> {
        let data = self.get(element)?.as_element()?;
        data.attrs.get_named_item_ns(namespace, name).map(|a| a.value.as_str())
    }

    pub fn has_attribute(&self, element: NodeId, name: &str) -> bool {
        self.get_attribute(element, name).is_some()
    }

    /// Set an attribute (name lowercased)
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) -> DomResult<TreeEdit> {
        self.set_attribute_ns(element, None, &name.to_ascii_lowercase(), value)
    }

    /// Set a namespaced attribute (name kept as given)
    pub fn set_attribute_ns(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        name: &str,
        value: &str,
    ) -> DomResult<TreeEdit> {
        let data = self
            .node_mut(element)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        let mut attr = Attr::new(name, value);
        attr.namespace = namespace.map(str::to_string);
        let old = data.attrs.set_named_item(attr);
        Ok(TreeEdit::Attribute {
            target: element,
            name: name.to_string(),
            namespace: namespace.map(str::to_string),
            old_value: old.map(|a| a.value),
        })
    }

    /// Remove an attribute; `None` when it was not present
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) -> DomResult<Option<TreeEdit>> {
        self.remove_attribute_ns(element, None, &name.to_ascii_lowercase())
    }

    /// Remove a namespaced attribute; `None` when it was not present
    pub fn remove_attribute_ns(
        &mut self,
        element: NodeId,
        namespace: Option<&str>,
        name: &str,
    ) -> DomResult<Option<TreeEdit>> {
        let data = self
            .node_mut(element)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        Ok(data.attrs.remove_named_item_ns(namespace, name).map(|old| TreeEdit::Attribute {
            target: element,
            name: old.name,
            namespace: old.namespace,
            old_value: Some(old.value),
        }))
    }

    // ------------------------------------------------------------------
    // Character data
    // ------------------------------------------------------------------

    /// Text of a text or comment node
    pub fn character_data(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.character_data()
    }

    /// Replace the data of a text or comment node
    pub fn set_text(&mut self, id: NodeId, content: &str) -> DomResult<TreeEdit> {
        match &mut self.node_mut(id)?.data {
            NodeData::Text(data) | NodeData::Comment(data) => {
                let old_value = std::mem::replace(data, content.to_string());
                Ok(TreeEdit::CharacterData { target: id, old_value })
            }
            _ => Err(DomError::InvalidNodeType),
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_reports_siblings() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");

        tree.append_child(tree.root(), a).unwrap();
        let edits = tree.append_child(tree.root(), b).unwrap();

        assert_eq!(
            edits,
            vec![TreeEdit::Inserted {
                parent: NodeId::ROOT,
                node: b,
                previous_sibling: Some(a),
                next_sibling: None,
            }]
        );
        assert_eq!(tree.children(tree.root()).collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_move_reports_removal_first() {
        let mut tree = DomTree::new();
        let a = tree.create_element("div");
        let b = tree.create_element("div");
        let c = tree.create_element("span");
        tree.append_child(tree.root(), a).unwrap();
        tree.append_child(tree.root(), b).unwrap();
        tree.append_child(a, c).unwrap();

        let edits = tree.append_child(b, c).unwrap();
        assert_eq!(edits.len(), 2);
        assert!(matches!(edits[0], TreeEdit::Removed { parent, node, .. } if parent == a && node == c));
        assert!(matches!(edits[1], TreeEdit::Inserted { parent, node, .. } if parent == b && node == c));
        assert_eq!(tree.first_child(a), None);
        assert_eq!(tree.parent(c), Some(b));
    }

    #[test]
    fn test_insert_before_and_remove() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let c = tree.create_element("c");
        tree.append_child(tree.root(), a).unwrap();
        tree.append_child(tree.root(), c).unwrap();
        tree.insert_before(tree.root(), b, Some(c)).unwrap();
        assert_eq!(tree.children(tree.root()).collect::<Vec<_>>(), vec![a, b, c]);

        let edit = tree.remove_child(tree.root(), b).unwrap();
        assert_eq!(
            edit,
            TreeEdit::Removed {
                parent: NodeId::ROOT,
                node: b,
                previous_sibling: Some(a),
                next_sibling: Some(c),
            }
        );
        assert_eq!(tree.next_sibling(a), Some(c));
        assert_eq!(tree.previous_sibling(c), Some(a));
    }

    #[test]
    fn test_cycle_rejected() {
        let mut tree = DomTree::new();
        let outer = tree.create_element("div");
        let inner = tree.create_element("div");
        tree.append_child(outer, inner).unwrap();
        assert_eq!(tree.append_child(inner, outer), Err(DomError::HierarchyRequest));
        assert_eq!(tree.append_child(outer, outer), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn test_remove_non_child() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        assert_eq!(tree.remove_child(tree.root(), a), Err(DomError::NotAChild));
    }

    #[test]
    fn test_attribute_edits() {
        let mut tree = DomTree::new();
        let el = tree.create_element("div");

        let edit = tree.set_attribute(el, "Title", "one").unwrap();
        assert!(matches!(edit, TreeEdit::Attribute { ref name, old_value: None, .. } if name == "title"));

        let edit = tree.set_attribute(el, "title", "two").unwrap();
        assert!(matches!(edit, TreeEdit::Attribute { old_value: Some(ref v), .. } if v == "one"));
        assert_eq!(tree.get_attribute(el, "TITLE"), Some("two"));

        assert!(tree.remove_attribute(el, "missing").unwrap().is_none());
        assert!(tree.remove_attribute(el, "title").unwrap().is_some());
        assert!(!tree.has_attribute(el, "title"));
    }

    #[test]
    fn test_set_text() {
        let mut tree = DomTree::new();
        let text = tree.create_text("before");
        let edit = tree.set_text(text, "after").unwrap();
        assert_eq!(edit, TreeEdit::CharacterData { target: text, old_value: "before".into() });
        assert_eq!(tree.character_data(text), Some("after"));

        let el = tree.create_element("p");
        assert_eq!(tree.set_text(el, "x"), Err(DomError::InvalidNodeType));
    }

    #[test]
    fn test_descendant_elements_order() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        let t = tree.create_text("t");
        let c = tree.create_element("c");
        tree.append_child(tree.root(), a).unwrap();
        tree.append_child(a, b).unwrap();
        tree.append_child(a, t).unwrap();
        tree.append_child(tree.root(), c).unwrap();
        assert_eq!(tree.descendant_elements(tree.root()), vec![a, b, c]);
    }

    #[test]
    fn test_connectivity() {
        let mut tree = DomTree::new();
        let a = tree.create_element("a");
        let b = tree.create_element("b");
        tree.append_child(a, b).unwrap();
        assert!(!tree.is_connected(b));
        tree.append_child(tree.root(), a).unwrap();
        assert!(tree.is_connected(b));
    }
}
