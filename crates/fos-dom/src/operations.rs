//! DOM Node Operations
//!
//! Error type for tree edits and the low-level edit notifications every
//! edit primitive reports back to its caller.

use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node not found
    #[error("Node not found")]
    NotFound,
    /// Hierarchy error (e.g., inserting ancestor)
    #[error("Hierarchy request error")]
    HierarchyRequest,
    /// Invalid node type for the requested operation
    #[error("Invalid node type")]
    InvalidNodeType,
    /// Node is not a child
    #[error("Node is not a child")]
    NotAChild,
}

/// Low-level edit notification.
///
/// Captures the state needed to describe the change after it has been
/// applied: sibling links are the ones surrounding the node at the moment it
/// was inserted or just before it was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEdit {
    /// A node was inserted under `parent`
    Inserted {
        parent: NodeId,
        node: NodeId,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    },
    /// A node was removed from `parent`
    Removed {
        parent: NodeId,
        node: NodeId,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    },
    /// An attribute was added, changed or removed
    Attribute {
        target: NodeId,
        name: String,
        namespace: Option<String>,
        /// `None` when the attribute did not exist before
        old_value: Option<String>,
    },
    /// Text or comment data changed
    CharacterData {
        target: NodeId,
        old_value: String,
    },
}

impl TreeEdit {
    /// Node the edit is reported against (parent for child-list edits)
    pub fn target(&self) -> NodeId {
        match self {
            Self::Inserted { parent, .. } | Self::Removed { parent, .. } => *parent,
            Self::Attribute { target, .. } | Self::CharacterData { target, .. } => *target,
        }
    }

    /// Check if this is a child-list edit
    pub fn is_child_list(&self) -> bool {
        matches!(self, Self::Inserted { .. } | Self::Removed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_target() {
        let edit = TreeEdit::Inserted {
            parent: NodeId(1),
            node: NodeId(2),
            previous_sibling: None,
            next_sibling: None,
        };
        assert_eq!(edit.target(), NodeId(1));
        assert!(edit.is_child_list());

        let edit = TreeEdit::CharacterData { target: NodeId(3), old_value: "a".into() };
        assert_eq!(edit.target(), NodeId(3));
        assert!(!edit.is_child_list());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(DomError::NotAChild.to_string(), "Node is not a child");
    }
}
