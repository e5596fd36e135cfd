//! Mutation Observer API
//!
//! Observe DOM changes. Edits made through a [`Realm`] are matched against
//! every binding on the edited node and its ancestors, turned into
//! [`MutationRecord`]s and delivered asynchronously in observer creation
//! order.

mod options;
mod record;
mod registry;

use std::collections::BTreeMap;
use std::rc::Rc;

use fos_dom::{DomError, DomTree, NodeId, TreeEdit};

use crate::error::ObserveError;
use crate::Realm;

pub use options::{EditKinds, MutationObserverInit};
pub use record::{MutationRecord, MutationType};

use record::{RecordBuilder, Variant};
use registry::{Binding, BindingId, ObserverRegistry};

/// Observer identifier, increasing in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

impl ObserverId {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Observer callback
///
/// Receives the realm, the batch of records and the observer handle.
pub type MutationCallback =
    Rc<dyn Fn(&mut Realm, Vec<MutationRecord>, MutationObserver) -> anyhow::Result<()>>;

/// Mutation observer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationObserver {
    id: ObserverId,
}

impl MutationObserver {
    /// Create an observer in `realm`
    pub fn new<F>(realm: &mut Realm, callback: F) -> Self
    where
        F: Fn(&mut Realm, Vec<MutationRecord>, MutationObserver) -> anyhow::Result<()> + 'static,
    {
        let id = realm.observers.create(Rc::new(callback));
        Self { id }
    }

    pub(crate) fn from_id(id: ObserverId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> ObserverId {
        self.id
    }

    /// Observe a target
    ///
    /// Observing a target this observer already watches replaces the
    /// previous options.
    pub fn observe(
        &self,
        realm: &mut Realm,
        target: NodeId,
        options: MutationObserverInit,
    ) -> Result<(), ObserveError> {
        realm
            .observers
            .observe(&realm.document.tree, self.id, target, options)
    }

    /// Stop observing and drop undelivered records
    pub fn disconnect(&self, realm: &mut Realm) {
        realm.observers.disconnect(self.id);
    }

    /// Take pending records
    pub fn take_records(&self, realm: &mut Realm) -> Vec<MutationRecord> {
        realm.observers.take_records(self.id)
    }
}

struct ObserverState {
    callback: MutationCallback,
    pending: Vec<MutationRecord>,
    bindings: Vec<BindingId>,
}

/// Owns every observer of a realm and the node to binding table
#[derive(Default)]
pub(crate) struct ObserverEngine {
    next_id: u64,
    observers: BTreeMap<ObserverId, ObserverState>,
    registry: ObserverRegistry,
}

impl ObserverEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create(&mut self, callback: MutationCallback) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.observers.insert(
            id,
            ObserverState {
                callback,
                pending: Vec::new(),
                bindings: Vec::new(),
            },
        );
        tracing::trace!("created observer {:?}", id);
        id
    }

    pub(crate) fn observe(
        &mut self,
        tree: &DomTree,
        observer: ObserverId,
        target: NodeId,
        options: MutationObserverInit,
    ) -> Result<(), ObserveError> {
        options.validate()?;
        if !tree.contains(target) {
            return Err(DomError::NotFound.into());
        }
        let Some(state) = self.observers.get_mut(&observer) else {
            return Err(DomError::NotFound.into());
        };

        let existing = state
            .bindings
            .iter()
            .copied()
            .find(|id| self.registry.get(*id).is_some_and(|b| b.target == target));

        match existing {
            Some(id) => {
                self.registry.clear_transients(id);
                if let Some(binding) = self.registry.get_mut(id) {
                    binding.kinds = options.edit_kinds();
                    binding.options = options;
                }
                tracing::debug!("observer {:?} re-observes {:?}", observer, target);
            }
            None => {
                let id = self.registry.insert(Binding {
                    observer,
                    target,
                    kinds: options.edit_kinds(),
                    options,
                    transient_targets: Vec::new(),
                });
                state.bindings.push(id);
                tracing::debug!("observer {:?} observes {:?}", observer, target);
            }
        }
        Ok(())
    }

    pub(crate) fn disconnect(&mut self, observer: ObserverId) {
        let Some(state) = self.observers.get_mut(&observer) else {
            return;
        };
        for id in state.bindings.drain(..) {
            self.registry.remove(id);
        }
        let dropped = std::mem::take(&mut state.pending).len();
        tracing::debug!("observer {:?} disconnected, {} records dropped", observer, dropped);
    }

    pub(crate) fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.observers
            .get_mut(&observer)
            .map(|state| std::mem::take(&mut state.pending))
            .unwrap_or_default()
    }

    /// Drain an observer for delivery.
    ///
    /// Transient registrations end here even when nothing is left to
    /// deliver. Returns `None` when the observer has no records.
    pub(crate) fn take_for_delivery(
        &mut self,
        observer: ObserverId,
    ) -> Option<(Vec<MutationRecord>, MutationCallback)> {
        let state = self.observers.get_mut(&observer)?;
        for id in &state.bindings {
            self.registry.clear_transients(*id);
        }
        if state.pending.is_empty() {
            return None;
        }
        let records = std::mem::take(&mut state.pending);
        Some((records, state.callback.clone()))
    }

    /// Match an edit against the bindings on its target and ancestors.
    ///
    /// Returns the observers whose pending list just became non-empty.
    pub(crate) fn notify(&mut self, tree: &DomTree, edit: &TreeEdit) -> Vec<ObserverId> {
        let kind = EditKinds::of(edit);
        let target = edit.target();
        let mut builder = RecordBuilder::for_edit(edit);
        let mut woken = Vec::new();
        let mut transient_sources = Vec::new();

        let mut current = Some(target);
        while let Some(node) = current {
            for registration in self.registry.registrations(node) {
                let Some(binding) = self.registry.get(registration.binding) else {
                    continue;
                };
                if node != target && !binding.options.subtree {
                    continue;
                }
                if !binding.kinds.includes(kind) {
                    continue;
                }
                if matches!(edit, TreeEdit::Removed { .. }) && binding.options.subtree {
                    transient_sources.push(registration.binding);
                }
                let Some(variant) = variant_for(&binding.options, edit) else {
                    continue;
                };
                let Some(state) = self.observers.get_mut(&binding.observer) else {
                    continue;
                };
                if builder.enqueue(binding.observer, &mut state.pending, variant) {
                    woken.push(binding.observer);
                }
            }
            current = tree.parent(node);
        }

        if let TreeEdit::Removed { node, .. } = edit {
            for id in transient_sources {
                self.registry.add_transient(id, *node);
            }
        }
        woken
    }

    /// Number of pending records for `observer`
    pub(crate) fn pending_len(&self, observer: ObserverId) -> usize {
        self.observers.get(&observer).map_or(0, |s| s.pending.len())
    }

    /// Number of bindings `observer` holds, transient ones excluded
    pub(crate) fn binding_count(&self, observer: ObserverId) -> usize {
        self.observers.get(&observer).map_or(0, |s| s.bindings.len())
    }

    /// Nodes `observer` watches transiently
    pub(crate) fn transient_targets(&self, observer: ObserverId) -> Vec<NodeId> {
        let Some(state) = self.observers.get(&observer) else {
            return Vec::new();
        };
        state
            .bindings
            .iter()
            .filter_map(|id| self.registry.get(*id))
            .flat_map(|b| b.transient_targets.iter().copied())
            .collect()
    }
}

impl std::fmt::Debug for ObserverEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverEngine")
            .field("observers", &self.observers.len())
            .field("bindings", &self.registry.len())
            .field("observed_nodes", &self.registry.node_count())
            .finish()
    }
}

/// Which record shape a binding wants for `edit`, if any
fn variant_for(options: &MutationObserverInit, edit: &TreeEdit) -> Option<Variant> {
    let (wanted, old_value) = match edit {
        TreeEdit::Inserted { .. } | TreeEdit::Removed { .. } => (options.child_list, false),
        TreeEdit::Attribute { name, namespace, .. } => (
            options.attributes && options.accepts_attribute(namespace.as_deref(), name),
            options.attribute_old_value,
        ),
        TreeEdit::CharacterData { .. } => (options.character_data, options.character_data_old_value),
    };
    match (wanted, old_value) {
        (false, _) => None,
        (true, false) => Some(Variant::Plain),
        (true, true) => Some(Variant::WithOldValue),
    }
}
