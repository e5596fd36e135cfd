//! Custom Elements
//!
//! Custom element registry, upgrade state machine and lifecycle callbacks.
//!
//! An element goes from raw to upgraded exactly once. Once upgraded it
//! carries an `attached` flag that follows its reachability from the main
//! document, re-evaluated whenever the internal tree observers report it
//! entering or leaving a tree.

mod definition;
mod lifecycle;
mod registry;
mod upgrade;

use std::collections::HashMap;
use std::rc::Rc;

use fos_dom::NodeId;

use crate::observer::MutationObserver;

pub use definition::{
    AttributeChange, AttributeChangedCallback, ElementConstructor, ElementDefinition, ElementOptions,
    Lifecycle, LifecycleCallback, Method, Prototype,
};
pub use registry::ElementRegistry;

use definition::Behavior;

/// Per-element upgrade state
#[derive(Debug)]
pub(crate) struct UpgradedElement {
    pub(crate) definition: Rc<ElementDefinition>,
    pub(crate) behavior: Behavior,
    pub(crate) attached: bool,
}

/// Custom element state of a realm
#[derive(Debug, Default)]
pub(crate) struct CustomElements {
    pub(crate) registry: ElementRegistry,
    pub(crate) upgraded: HashMap<NodeId, UpgradedElement>,
    /// Internal observer per watched document or shadow root
    pub(crate) watched: HashMap<NodeId, MutationObserver>,
}

impl CustomElements {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn is_upgraded(&self, element: NodeId) -> bool {
        self.upgraded.contains_key(&element)
    }

    pub(crate) fn is_attached(&self, element: NodeId) -> bool {
        self.upgraded.get(&element).is_some_and(|e| e.attached)
    }

    pub(crate) fn definition_of(&self, element: NodeId) -> Option<Rc<ElementDefinition>> {
        self.upgraded.get(&element).map(|e| e.definition.clone())
    }
}
