//! Shadow DOM
//!
//! Shadow roots hang off their host element instead of a parent. A host may
//! carry several roots; they are kept oldest first.

use crate::{DomError, DomResult, DomTree, Node, NodeId};

impl DomTree {
    /// Attach a new shadow root to `host`, returning it
    pub fn attach_shadow(&mut self, host: NodeId) -> DomResult<NodeId> {
        if !self.node(host)?.is_element() {
            return Err(DomError::InvalidNodeType);
        }
        let root = self.push(Node::shadow_root(host));
        if let Some(data) = self.node_mut(host)?.as_element_mut() {
            data.shadow_roots.push(root);
        }
        tracing::trace!("attached shadow root {:?} to {:?}", root, host);
        Ok(root)
    }

    /// Shadow roots of `host`, oldest first
    pub fn shadow_roots(&self, host: NodeId) -> &[NodeId] {
        self.get(host)
            .and_then(Node::as_element)
            .map(|e| e.shadow_roots.as_slice())
            .unwrap_or(&[])
    }

    /// Youngest shadow root of `host`
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.shadow_roots(host).last().copied()
    }

    /// Host element of a shadow root
    pub fn host(&self, shadow_root: NodeId) -> Option<NodeId> {
        self.get(shadow_root).and_then(Node::shadow_host)
    }

    /// Check if a node is a shadow root
    pub fn is_shadow_root(&self, id: NodeId) -> bool {
        self.host(id).is_some()
    }
}
