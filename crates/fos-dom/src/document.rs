//! Document - High-level document API
//!
//! The main document plus linked import sub-documents. Sub-documents live in
//! the same arena as detached `Document` nodes and are reached through the
//! `<link rel="import">` element that loaded them.

use crate::{DomError, DomResult, DomTree, Node, NodeId};

/// `rel` value marking an import link
pub const IMPORT_LINK_TYPE: &str = "import";

/// HTML Document
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Document URL
    url: String,
    /// Cached reference to <html> element
    html_element: NodeId,
    /// Cached reference to <head> element
    head_element: NodeId,
    /// Cached reference to <body> element
    body_element: NodeId,
}

impl Document {
    /// Create a new document with `html > head, body`
    pub fn new(url: &str) -> Self {
        let mut tree = DomTree::new();

        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        tree.link_children(tree.root(), &[html]);
        tree.link_children(html, &[head, body]);

        Self {
            tree,
            url: url.to_string(),
            html_element: html,
            head_element: head,
            body_element: body,
        }
    }

    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html_element: NodeId::NONE,
            head_element: NodeId::NONE,
            body_element: NodeId::NONE,
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get <html> element
    pub fn document_element(&self) -> NodeId {
        self.html_element
    }

    /// Get <head> element
    pub fn head(&self) -> NodeId {
        self.head_element
    }

    /// Get <body> element
    pub fn body(&self) -> NodeId {
        self.body_element
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new("about:blank")
    }
}

impl DomTree {
    /// Create a detached sub-document
    pub fn create_document(&mut self) -> NodeId {
        self.push(Node::document())
    }

    /// Check if a node is a document
    pub fn is_document(&self, id: NodeId) -> bool {
        matches!(self.get(id).map(|n| &n.data), Some(crate::NodeData::Document))
    }

    /// Record `document` as the loaded import of `link`
    pub fn set_import(&mut self, link: NodeId, document: NodeId) -> DomResult<()> {
        if !self.is_document(document) || document == NodeId::ROOT {
            return Err(DomError::InvalidNodeType);
        }
        let data = self
            .node_mut(link)?
            .as_element_mut()
            .ok_or(DomError::InvalidNodeType)?;
        data.import = Some(document);
        Ok(())
    }

    /// Loaded import of an element, if it is an import link
    pub fn import_of(&self, link: NodeId) -> Option<NodeId> {
        let data = self.get(link)?.as_element()?;
        let is_import = data.local_name == "link"
            && data
                .get_attr("rel")
                .is_some_and(|rel| rel.eq_ignore_ascii_case(IMPORT_LINK_TYPE));
        if is_import { data.import } else { None }
    }

    /// Import links of `document` whose sub-document is loaded, in tree order
    pub fn import_links(&self, document: NodeId) -> Vec<NodeId> {
        self.descendant_elements(document)
            .into_iter()
            .filter(|&el| self.import_of(el).is_some())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_structure() {
        let doc = Document::new("https://example.com/");
        let tree = doc.tree();
        assert_eq!(tree.local_name(doc.document_element()), Some("html"));
        assert_eq!(tree.parent(doc.body()), Some(doc.document_element()));
        assert!(tree.is_connected(doc.body()));
        assert_eq!(doc.url(), "https://example.com/");

        let root: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(root, vec![doc.document_element()]);
        let html: Vec<_> = tree.children(doc.document_element()).collect();
        assert_eq!(html, vec![doc.head(), doc.body()]);
        assert_eq!(tree.next_sibling(doc.head()), Some(doc.body()));
        assert_eq!(tree.previous_sibling(doc.body()), Some(doc.head()));
        assert_eq!(tree.last_child(doc.document_element()), Some(doc.body()));
    }

    #[test]
    fn test_import_links() {
        let mut tree = DomTree::new();
        let link = tree.create_element("link");
        tree.set_attribute(link, "rel", "import").unwrap();
        tree.append_child(tree.root(), link).unwrap();
        assert!(tree.import_links(tree.root()).is_empty());

        let sub = tree.create_document();
        tree.set_import(link, sub).unwrap();
        assert_eq!(tree.import_links(tree.root()), vec![link]);
        assert!(!tree.is_connected(sub));

        let stylesheet = tree.create_element("link");
        tree.set_attribute(stylesheet, "rel", "stylesheet").unwrap();
        tree.set_import(stylesheet, sub).unwrap();
        assert_eq!(tree.import_of(stylesheet), None);
    }
}
