//! Attachment tracking
//!
//! Internal tree observers, `attached`/`detached` sequencing and the
//! document-wide upgrade sweep.

use fos_dom::{FilterResult, NodeId};

use crate::error::CallbackSource;
use crate::observer::{MutationObserver, MutationObserverInit, MutationRecord, MutationType};
use crate::Realm;

impl Realm {
    /// Upgrade every element of `document` and of the imports it links to,
    /// innermost imports first, and start watching each of them
    pub fn upgrade_document_tree(&mut self, document: NodeId) {
        fos_dom::for_document_tree(self, document, &mut |realm: &mut Realm, doc| {
            realm.upgrade_document(doc);
        });
    }

    fn upgrade_document(&mut self, document: NodeId) {
        tracing::debug!("upgrading document {:?}", document);
        self.upgrade_subtree(document);
        self.watch_root(document);
    }

    /// Synchronously process the internal records pending for the tree
    /// containing `node`, including deferred attachment checks
    pub fn take_element_records(&mut self, node: NodeId) {
        let root = self.tree_root_of(node);
        if let Some(observer) = self.elements.watched.get(&root).copied() {
            let records = observer.take_records(self);
            self.handle_tree_records(records);
        }
        self.run_deferred();
    }

    fn tree_root_of(&self, node: NodeId) -> NodeId {
        let tree = &self.document.tree;
        let mut current = node;
        while let Some(parent) = tree.parent(current) {
            current = parent;
        }
        current
    }

    /// Watch the shadow roots of `host`
    pub(crate) fn watch_shadow(&mut self, host: NodeId) {
        let roots = self.document.tree.shadow_roots(host).to_vec();
        for root in roots {
            self.watch_root(root);
        }
    }

    /// Give a document or shadow root its own child list observer.
    ///
    /// Subtree observation stops at shadow boundaries, so every root needs
    /// one.
    pub(crate) fn watch_root(&mut self, root: NodeId) {
        if self.elements.watched.contains_key(&root) {
            return;
        }
        let observer = MutationObserver::new(self, |realm, records, _| {
            realm.handle_tree_records(records);
            Ok(())
        });
        if let Err(error) = observer.observe(self, root, MutationObserverInit::child_list().with_subtree()) {
            tracing::warn!("cannot watch {:?}: {}", root, error);
            return;
        }
        tracing::debug!("watching {:?} with {:?}", root, observer.id());
        self.elements.watched.insert(root, observer);
    }

    pub(crate) fn is_watched(&self, root: NodeId) -> bool {
        self.elements.watched.contains_key(&root)
    }

    fn handle_tree_records(&mut self, records: Vec<MutationRecord>) {
        for record in records {
            if record.mutation_type != MutationType::ChildList {
                continue;
            }
            for node in record.added_nodes {
                if self.document.tree.is_element(node) {
                    self.added_tree(node);
                }
            }
            for node in record.removed_nodes {
                if self.document.tree.is_element(node) {
                    self.detached_tree(node);
                }
            }
        }
    }

    fn added_tree(&mut self, node: NodeId) {
        if self.added_node(node) == FilterResult::Accept {
            self.upgrade_subtree(node);
        }
    }

    fn detached_tree(&mut self, node: NodeId) {
        self.detached(node);
        fos_dom::for_subtree(self, node, &mut |realm: &mut Realm, element| {
            realm.detached(element);
            FilterResult::Accept
        });
    }

    /// `element` may have become reachable
    pub(crate) fn attached(&mut self, element: NodeId) {
        self.check_attachment(element);
    }

    /// `element` may have become unreachable
    pub(crate) fn detached(&mut self, element: NodeId) {
        self.check_attachment(element);
    }

    fn check_attachment(&mut self, element: NodeId) {
        if !self.elements.is_upgraded(element) {
            return;
        }
        if self.config.throttle_attached {
            self.defer(Box::new(move |realm: &mut Realm| realm.sync_attachment(element)));
        } else {
            self.sync_attachment(element);
        }
    }

    /// Bring the `attached` flag in line with reachability, firing the
    /// matching callback only on an actual change
    fn sync_attachment(&mut self, element: NodeId) {
        let connected = self.document.tree.is_connected(element);
        let Some(state) = self.elements.upgraded.get_mut(&element) else {
            return;
        };
        if state.attached == connected {
            return;
        }
        state.attached = connected;

        let lifecycle = &state.definition.lifecycle;
        let (callback, source) = if connected {
            (lifecycle.attached.clone(), CallbackSource::Attached(element))
        } else {
            (lifecycle.detached.clone(), CallbackSource::Detached(element))
        };
        tracing::debug!(
            "{:?} ({}) {}",
            element,
            state.definition.name,
            if connected { "attached" } else { "detached" }
        );

        if let Some(callback) = callback {
            if let Err(error) = callback(self, element) {
                self.report_error(source, error);
            }
        }
    }
}
