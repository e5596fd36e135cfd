//! Mutation records
//!
//! Building and coalescing of the records handed to observer callbacks.

use std::collections::HashMap;

use fos_dom::{NodeId, TreeEdit};

use super::ObserverId;

/// Mutation record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub previous_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub attribute_name: Option<String>,
    pub attribute_namespace: Option<String>,
    pub old_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    CharacterData,
    ChildList,
}

impl MutationRecord {
    fn new(mutation_type: MutationType, target: NodeId) -> Self {
        Self {
            mutation_type,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            previous_sibling: None,
            next_sibling: None,
            attribute_name: None,
            attribute_namespace: None,
            old_value: None,
        }
    }

    /// Attribute change on `target`
    pub fn attributes(target: NodeId, name: &str, namespace: Option<&str>) -> Self {
        let mut record = Self::new(MutationType::Attributes, target);
        record.attribute_name = Some(name.to_string());
        record.attribute_namespace = namespace.map(str::to_string);
        record
    }

    /// Character data change on `target`
    pub fn character_data(target: NodeId) -> Self {
        Self::new(MutationType::CharacterData, target)
    }

    /// Child list change on `target`
    pub fn child_list(
        target: NodeId,
        added_nodes: Vec<NodeId>,
        removed_nodes: Vec<NodeId>,
        previous_sibling: Option<NodeId>,
        next_sibling: Option<NodeId>,
    ) -> Self {
        let mut record = Self::new(MutationType::ChildList, target);
        record.added_nodes = added_nodes;
        record.removed_nodes = removed_nodes;
        record.previous_sibling = previous_sibling;
        record.next_sibling = next_sibling;
        record
    }

    /// Fold `next` into this record when it continues the same change.
    ///
    /// Attribute records merge per target and attribute, character data per
    /// target; the merged record keeps the oldest old value. Child list
    /// records merge only when together they describe one contiguous run of
    /// insertions or removals, so sibling information stays exact.
    pub(crate) fn absorb(&mut self, next: &MutationRecord) -> bool {
        if self.mutation_type != next.mutation_type || self.target != next.target {
            return false;
        }
        match self.mutation_type {
            MutationType::Attributes => {
                self.attribute_name == next.attribute_name
                    && self.attribute_namespace == next.attribute_namespace
            }
            MutationType::CharacterData => true,
            MutationType::ChildList => self.absorb_child_list(next),
        }
    }

    fn absorb_child_list(&mut self, next: &MutationRecord) -> bool {
        let insertions = self.removed_nodes.is_empty() && next.removed_nodes.is_empty();
        let removals = self.added_nodes.is_empty() && next.added_nodes.is_empty();

        if insertions
            && next.previous_sibling.is_some()
            && next.previous_sibling == self.added_nodes.last().copied()
            && next.next_sibling == self.next_sibling
        {
            self.added_nodes.extend_from_slice(&next.added_nodes);
            return true;
        }
        if removals
            && next.previous_sibling == self.previous_sibling
            && self.next_sibling.is_some()
            && self.next_sibling == next.removed_nodes.first().copied()
        {
            self.removed_nodes.extend_from_slice(&next.removed_nodes);
            self.next_sibling = next.next_sibling;
            return true;
        }
        false
    }
}

/// Which shape of the record a binding asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Variant {
    Plain,
    WithOldValue,
}

#[derive(Debug, Clone, Copy)]
enum Delivery {
    Appended(Variant),
    Absorbed,
}

/// Builds the record for one edit and enqueues it per observer.
///
/// One edit can reach the same observer through several bindings (a target
/// binding plus an ancestor's subtree binding, or a transient one). The
/// observer still gets a single record, upgraded to carry the old value if
/// any of those bindings asked for it.
pub(crate) struct RecordBuilder {
    record: MutationRecord,
    old_value: Option<String>,
    delivered: HashMap<ObserverId, Delivery>,
}

impl RecordBuilder {
    pub(crate) fn for_edit(edit: &TreeEdit) -> Self {
        let (record, old_value) = match edit {
            TreeEdit::Inserted { parent, node, previous_sibling, next_sibling } => (
                MutationRecord::child_list(*parent, vec![*node], Vec::new(), *previous_sibling, *next_sibling),
                None,
            ),
            TreeEdit::Removed { parent, node, previous_sibling, next_sibling } => (
                MutationRecord::child_list(*parent, Vec::new(), vec![*node], *previous_sibling, *next_sibling),
                None,
            ),
            TreeEdit::Attribute { target, name, namespace, old_value } => (
                MutationRecord::attributes(*target, name, namespace.as_deref()),
                old_value.clone(),
            ),
            TreeEdit::CharacterData { target, old_value } => {
                (MutationRecord::character_data(*target), Some(old_value.clone()))
            }
        };
        Self {
            record,
            old_value,
            delivered: HashMap::new(),
        }
    }

    fn build(&self, variant: Variant) -> MutationRecord {
        let mut record = self.record.clone();
        if variant == Variant::WithOldValue {
            record.old_value = self.old_value.clone();
        }
        record
    }

    /// Add this edit's record to an observer's pending list.
    ///
    /// Returns true when the list went from empty to non-empty, i.e. the
    /// observer needs scheduling.
    pub(crate) fn enqueue(
        &mut self,
        observer: ObserverId,
        pending: &mut Vec<MutationRecord>,
        variant: Variant,
    ) -> bool {
        match self.delivered.get(&observer) {
            Some(Delivery::Appended(Variant::Plain)) if variant == Variant::WithOldValue => {
                if let Some(last) = pending.last_mut() {
                    *last = self.build(Variant::WithOldValue);
                }
                self.delivered.insert(observer, Delivery::Appended(Variant::WithOldValue));
                return false;
            }
            Some(_) => return false,
            None => {}
        }

        let record = self.build(variant);
        if let Some(last) = pending.last_mut() {
            if last.absorb(&record) {
                self.delivered.insert(observer, Delivery::Absorbed);
                return false;
            }
        }
        let was_empty = pending.is_empty();
        pending.push(record);
        self.delivered.insert(observer, Delivery::Appended(variant));
        was_empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr_edit(target: NodeId, name: &str, old: Option<&str>) -> TreeEdit {
        TreeEdit::Attribute {
            target,
            name: name.into(),
            namespace: None,
            old_value: old.map(str::to_string),
        }
    }

    fn node(tree: &mut fos_dom::DomTree) -> NodeId {
        tree.create_element("div")
    }

    #[test]
    fn test_same_edit_reaches_observer_once() {
        let mut tree = fos_dom::DomTree::new();
        let el = node(&mut tree);
        let observer = ObserverId::from_raw(1);
        let mut pending = Vec::new();

        let mut builder = RecordBuilder::for_edit(&attr_edit(el, "class", Some("a")));
        assert!(builder.enqueue(observer, &mut pending, Variant::Plain));
        assert!(!builder.enqueue(observer, &mut pending, Variant::WithOldValue));
        assert!(!builder.enqueue(observer, &mut pending, Variant::Plain));

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].old_value.as_deref(), Some("a"));
    }

    #[test]
    fn test_consecutive_attribute_changes_keep_oldest_value() {
        let mut tree = fos_dom::DomTree::new();
        let el = node(&mut tree);
        let observer = ObserverId::from_raw(1);
        let mut pending = Vec::new();

        for old in ["first", "second", "third"] {
            let mut builder = RecordBuilder::for_edit(&attr_edit(el, "title", Some(old)));
            builder.enqueue(observer, &mut pending, Variant::WithOldValue);
        }
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].old_value.as_deref(), Some("first"));

        // a different attribute interrupts the run
        let mut builder = RecordBuilder::for_edit(&attr_edit(el, "id", None));
        builder.enqueue(observer, &mut pending, Variant::WithOldValue);
        let mut builder = RecordBuilder::for_edit(&attr_edit(el, "title", Some("fourth")));
        builder.enqueue(observer, &mut pending, Variant::WithOldValue);
        assert_eq!(pending.len(), 3);
        assert_eq!(pending[2].old_value.as_deref(), Some("fourth"));
    }

    #[test]
    fn test_contiguous_insertions_merge() {
        let mut tree = fos_dom::DomTree::new();
        let parent = node(&mut tree);
        let (a, b, c) = (node(&mut tree), node(&mut tree), node(&mut tree));

        let mut first = MutationRecord::child_list(parent, vec![a], Vec::new(), None, None);
        let second = MutationRecord::child_list(parent, vec![b], Vec::new(), Some(a), None);
        assert!(first.absorb(&second));
        assert_eq!(first.added_nodes, vec![a, b]);
        assert_eq!(first.previous_sibling, None);

        // not adjacent to the run
        let third = MutationRecord::child_list(parent, vec![c], Vec::new(), None, Some(a));
        assert!(!first.absorb(&third));
    }

    #[test]
    fn test_contiguous_removals_merge() {
        let mut tree = fos_dom::DomTree::new();
        let parent = node(&mut tree);
        let (p, a, b, n) = (node(&mut tree), node(&mut tree), node(&mut tree), node(&mut tree));

        let mut first = MutationRecord::child_list(parent, Vec::new(), vec![a], Some(p), Some(b));
        let second = MutationRecord::child_list(parent, Vec::new(), vec![b], Some(p), Some(n));
        assert!(first.absorb(&second));
        assert_eq!(first.removed_nodes, vec![a, b]);
        assert_eq!(first.next_sibling, Some(n));
    }

    #[test]
    fn test_insert_then_remove_not_merged() {
        let mut tree = fos_dom::DomTree::new();
        let parent = node(&mut tree);
        let a = node(&mut tree);

        let mut first = MutationRecord::child_list(parent, vec![a], Vec::new(), None, None);
        let second = MutationRecord::child_list(parent, Vec::new(), vec![a], None, None);
        assert!(!first.absorb(&second));
    }
}
