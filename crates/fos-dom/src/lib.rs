//! fOS DOM - Document Object Model
//!
//! Arena-backed live document tree. Edit primitives report what they changed
//! as [`TreeEdit`] values; higher layers (mutation observers, custom element
//! upgrades) are built on those notifications.

mod attributes;
mod document;
mod node;
mod operations;
mod shadow;
mod tree;
pub mod tree_walker;

pub use attributes::{Attr, NamedNodeMap};
pub use document::{Document, IMPORT_LINK_TYPE};
pub use node::{ElementData, Node, NodeData, NodeType};
pub use operations::{DomError, DomResult, TreeEdit};
pub use tree::{Children, DomTree};
pub use tree_walker::{for_document_tree, for_subtree, FilterResult, TreeAccess};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID (the main document)
    pub const ROOT: NodeId = NodeId(0);
    /// Absent link
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this refers to a node
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    /// Raw arena index
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn to_option(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }

    #[inline]
    pub(crate) fn from_option(id: Option<NodeId>) -> NodeId {
        id.unwrap_or(Self::NONE)
    }
}
