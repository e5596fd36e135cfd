//! Observer Registry
//!
//! Side table from node to the observation bindings registered on it. Keyed
//! by `NodeId`, so it never keeps a node alive; entries are dropped as soon
//! as a node has no bindings left.

use std::collections::HashMap;

use fos_dom::NodeId;

use super::options::{EditKinds, MutationObserverInit};
use super::ObserverId;

/// Binding identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct BindingId(u64);

/// One observer watching one target with one set of options
#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) observer: ObserverId,
    pub(crate) target: NodeId,
    pub(crate) options: MutationObserverInit,
    pub(crate) kinds: EditKinds,
    /// Removed nodes this binding keeps watching until its next delivery
    pub(crate) transient_targets: Vec<NodeId>,
}

/// Entry in a node's registration list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Registration {
    pub(crate) binding: BindingId,
    /// Registered on a removed node on behalf of an ancestor's binding
    pub(crate) transient: bool,
}

/// Node to bindings association
#[derive(Debug, Default)]
pub(crate) struct ObserverRegistry {
    next_id: u64,
    bindings: HashMap<BindingId, Binding>,
    by_node: HashMap<NodeId, Vec<Registration>>,
}

impl ObserverRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a new binding on its target
    pub(crate) fn insert(&mut self, binding: Binding) -> BindingId {
        self.next_id += 1;
        let id = BindingId(self.next_id);
        self.by_node.entry(binding.target).or_default().push(Registration {
            binding: id,
            transient: false,
        });
        self.bindings.insert(id, binding);
        id
    }

    /// Drop a binding along with its transient registrations
    pub(crate) fn remove(&mut self, id: BindingId) -> Option<Binding> {
        self.clear_transients(id);
        let binding = self.bindings.remove(&id)?;
        self.unregister(binding.target, id, false);
        Some(binding)
    }

    pub(crate) fn get(&self, id: BindingId) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: BindingId) -> Option<&mut Binding> {
        self.bindings.get_mut(&id)
    }

    /// Registrations on `node`, in registration order
    pub(crate) fn registrations(&self, node: NodeId) -> &[Registration] {
        self.by_node.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Make `binding` watch `node` until its next delivery
    pub(crate) fn add_transient(&mut self, id: BindingId, node: NodeId) {
        let Some(binding) = self.bindings.get_mut(&id) else {
            return;
        };
        let registrations = self.by_node.entry(node).or_default();
        let registration = Registration { binding: id, transient: true };
        if registrations.contains(&registration) {
            return;
        }
        registrations.push(registration);
        binding.transient_targets.push(node);
    }

    /// Tear down every transient registration owned by `binding`
    pub(crate) fn clear_transients(&mut self, id: BindingId) {
        let Some(binding) = self.bindings.get_mut(&id) else {
            return;
        };
        let targets = std::mem::take(&mut binding.transient_targets);
        for node in targets {
            self.unregister(node, id, true);
        }
    }

    fn unregister(&mut self, node: NodeId, id: BindingId, transient: bool) {
        let Some(registrations) = self.by_node.get_mut(&node) else {
            return;
        };
        registrations.retain(|r| !(r.binding == id && r.transient == transient));
        if registrations.is_empty() {
            self.by_node.remove(&node);
        }
    }

    /// Number of nodes with at least one registration
    pub(crate) fn node_count(&self) -> usize {
        self.by_node.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(observer: u64, target: NodeId) -> Binding {
        let options = MutationObserverInit::child_list().with_subtree();
        Binding {
            observer: ObserverId::from_raw(observer),
            target,
            kinds: options.edit_kinds(),
            options,
            transient_targets: Vec::new(),
        }
    }

    #[test]
    fn test_insert_and_remove_prunes_node() {
        let mut tree = fos_dom::DomTree::new();
        let node = tree.create_element("div");
        let mut registry = ObserverRegistry::new();

        let a = registry.insert(binding(1, node));
        let b = registry.insert(binding(2, node));
        assert_eq!(registry.registrations(node).len(), 2);
        assert_eq!(registry.len(), 2);

        registry.remove(a);
        assert_eq!(registry.registrations(node).len(), 1);
        registry.remove(b);
        assert!(registry.registrations(node).is_empty());
        assert_eq!(registry.node_count(), 0);
    }

    #[test]
    fn test_transients_are_cleared() {
        let mut tree = fos_dom::DomTree::new();
        let parent = tree.create_element("div");
        let removed = tree.create_element("span");
        let mut registry = ObserverRegistry::new();

        let id = registry.insert(binding(1, parent));
        registry.add_transient(id, removed);
        registry.add_transient(id, removed);
        assert_eq!(registry.registrations(removed).len(), 1);
        assert_eq!(registry.get(id).map(|b| b.transient_targets.len()), Some(1));

        registry.clear_transients(id);
        assert!(registry.registrations(removed).is_empty());
        assert_eq!(registry.registrations(parent).len(), 1);
    }

    #[test]
    fn test_remove_drops_transients() {
        let mut tree = fos_dom::DomTree::new();
        let parent = tree.create_element("div");
        let removed = tree.create_element("span");
        let mut registry = ObserverRegistry::new();

        let id = registry.insert(binding(1, parent));
        registry.add_transient(id, removed);
        registry.remove(id);
        assert_eq!(registry.node_count(), 0);
    }
}
