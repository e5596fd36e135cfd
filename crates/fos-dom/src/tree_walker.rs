//! TreeWalker
//!
//! Depth-first element traversal that also enters shadow trees and linked
//! import documents.
//!
//! Visitors receive the traversal context mutably, so they may edit the tree
//! while the walk is in progress. Links are re-read after every visit, the
//! same way a live `nextElementSibling` chain behaves.

use std::collections::HashSet;

use crate::{Document, DomTree, NodeId};

/// Read access to the tree being walked
pub trait TreeAccess {
    fn tree(&self) -> &DomTree;
}

impl TreeAccess for DomTree {
    fn tree(&self) -> &DomTree {
        self
    }
}

impl TreeAccess for Document {
    fn tree(&self) -> &DomTree {
        &self.tree
    }
}

/// Visitor verdict for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// Continue into the node's shadow trees and children
    Accept,
    /// Do not descend below this node
    Reject,
}

/// Visit every element below `root` in pre-order.
///
/// For each element: the element itself, then its shadow trees (oldest
/// first), then its light children. Once `root`'s children are done, the
/// shadow trees of `root` itself are walked. `root` is not visited.
pub fn for_subtree<C, F>(ctx: &mut C, root: NodeId, visitor: &mut F)
where
    C: TreeAccess + ?Sized,
    F: FnMut(&mut C, NodeId) -> FilterResult,
{
    find_all_elements(ctx, root, visitor);
    for_roots(ctx, root, visitor);
}

fn find_all_elements<C, F>(ctx: &mut C, node: NodeId, visitor: &mut F)
where
    C: TreeAccess + ?Sized,
    F: FnMut(&mut C, NodeId) -> FilterResult,
{
    let mut current = ctx.tree().first_element_child(node);
    while let Some(element) = current {
        if visitor(ctx, element) == FilterResult::Accept {
            for_roots(ctx, element, visitor);
            find_all_elements(ctx, element, visitor);
        }
        current = ctx.tree().next_element_sibling(element);
    }
}

fn for_roots<C, F>(ctx: &mut C, host: NodeId, visitor: &mut F)
where
    C: TreeAccess + ?Sized,
    F: FnMut(&mut C, NodeId) -> FilterResult,
{
    let roots = ctx.tree().shadow_roots(host).to_vec();
    for root in roots {
        for_subtree(ctx, root, visitor);
    }
}

/// Visit `document` after every import sub-document reachable from it.
///
/// Each document is visited at most once, so import cycles terminate.
pub fn for_document_tree<C, F>(ctx: &mut C, document: NodeId, visitor: &mut F)
where
    C: TreeAccess + ?Sized,
    F: FnMut(&mut C, NodeId),
{
    let mut seen = HashSet::new();
    walk_documents(ctx, document, visitor, &mut seen);
}

fn walk_documents<C, F>(ctx: &mut C, document: NodeId, visitor: &mut F, seen: &mut HashSet<NodeId>)
where
    C: TreeAccess + ?Sized,
    F: FnMut(&mut C, NodeId),
{
    if !seen.insert(document) {
        return;
    }
    let imports: Vec<NodeId> = ctx
        .tree()
        .import_links(document)
        .into_iter()
        .filter_map(|link| ctx.tree().import_of(link))
        .collect();
    for import in imports {
        walk_documents(ctx, import, visitor, seen);
    }
    visitor(ctx, document);
}
