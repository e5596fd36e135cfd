//! Upgrades
//!
//! Registration entry point, definition matching and the `raw -> upgraded`
//! transition.

use std::rc::Rc;

use fos_dom::{FilterResult, NodeId};

use super::definition::{AttributeChange, Behavior, ElementConstructor, ElementDefinition, ElementOptions, Prototype};
use super::UpgradedElement;
use crate::error::{CallbackSource, Error, RegistrationError, Result};
use crate::Realm;

impl Realm {
    /// Register an element type and return its constructor.
    ///
    /// The first registration installs attribute change interception. Once
    /// the document is ready, every registration re-sweeps the document tree
    /// so existing elements of the new type upgrade right away.
    pub fn register_element(
        &mut self,
        name: &str,
        options: ElementOptions,
    ) -> std::result::Result<ElementConstructor, RegistrationError> {
        let definition = self.elements.registry.register(name, options)?;
        tracing::info!(
            "registered element type '{}' (tag: {}, is: {:?}, ancestry: {})",
            definition.name,
            definition.tag,
            definition.is,
            definition.ancestry.len()
        );

        if self.elements.registry.len() == 1 {
            tracing::debug!("attribute change interception installed");
        }
        if self.is_ready() {
            self.upgrade_document_tree(NodeId::ROOT);
        }
        Ok(ElementConstructor::new(definition))
    }

    /// Look up a registered type, case-insensitively
    pub fn lookup_element(&self, name: &str) -> Option<Rc<ElementDefinition>> {
        self.elements.registry.lookup(name)
    }

    /// Host behaviour for a built-in tag, used as the baseline of every type
    /// registered afterwards that ends on that tag
    pub fn define_native_prototype(&mut self, tag: &str, prototype: Prototype) {
        self.elements.registry.define_native(tag, prototype);
    }

    /// Create an element, optionally with an `is` type extension, upgraded
    /// immediately when a matching type is registered
    pub fn create_element_with_type(&mut self, tag: &str, is: Option<&str>) -> NodeId {
        let element = self.create_element(tag);
        if let Some(is) = is {
            if let Err(error) = self.set_attribute(element, "is", is) {
                tracing::warn!("failed to mark {:?} as '{}': {}", element, is, error);
            }
        }
        self.upgrade(element);
        element
    }

    /// Upgrade `element` if a registered type matches it.
    ///
    /// Returns true when the element was upgraded by this call; already
    /// upgraded elements are left alone.
    pub fn upgrade(&mut self, element: NodeId) -> bool {
        if self.elements.is_upgraded(element) {
            return false;
        }
        let Some(definition) = self.matching_definition(element) else {
            return false;
        };
        self.upgrade_with_definition(element, definition);
        true
    }

    /// Type `element` qualifies for: an `is` marker naming a type whose tag
    /// is the element's own, else a type registered under the element's tag
    /// that needs no marker
    fn matching_definition(&self, element: NodeId) -> Option<Rc<ElementDefinition>> {
        let tree = &self.document.tree;
        let local_name = tree.local_name(element)?;

        let by_marker = tree
            .get_attribute(element, "is")
            .and_then(|is| self.elements.registry.lookup(is))
            .filter(|d| d.tag == local_name);

        by_marker.or_else(|| {
            self.elements
                .registry
                .lookup(local_name)
                .filter(|d| !d.is_extension())
        })
    }

    pub(crate) fn upgrade_with_definition(&mut self, element: NodeId, definition: Rc<ElementDefinition>) {
        if self.elements.is_upgraded(element) {
            return;
        }
        tracing::debug!("upgrading {:?} to '{}'", element, definition.name);

        if let Some(is) = &definition.is {
            if self.document.tree.get_attribute(element, "is") != Some(is.as_str()) {
                if let Err(error) = self.set_attribute(element, "is", is) {
                    tracing::warn!("failed to mark {:?} as '{}': {}", element, is, error);
                }
            }
        }

        let behavior = Behavior::for_definition(&definition, self.config.capabilities.prototype_reassignment);
        self.elements.upgraded.insert(
            element,
            UpgradedElement {
                definition: definition.clone(),
                behavior,
                attached: false,
            },
        );

        if let Some(created) = definition.lifecycle.created.clone() {
            if let Err(error) = created(self, element) {
                self.report_error(CallbackSource::Created(element), error);
            }
        }

        self.attached(element);
        self.watch_shadow(element);
        self.upgrade_subtree(element);
    }

    /// Upgrade everything below `element`, shadow trees included
    pub(crate) fn upgrade_subtree(&mut self, element: NodeId) {
        fos_dom::for_subtree(self, element, &mut |realm: &mut Realm, node| realm.added_node(node));
    }

    /// Visitor step for a node entering a tree.
    ///
    /// A node upgraded here has already handled its own subtree, so the walk
    /// does not descend into it.
    pub(crate) fn added_node(&mut self, node: NodeId) -> FilterResult {
        if self.upgrade(node) {
            return FilterResult::Reject;
        }
        self.attached(node);
        self.watch_shadow(node);
        FilterResult::Accept
    }

    /// Whether `element` went through an upgrade
    pub fn is_upgraded(&self, element: NodeId) -> bool {
        self.elements.is_upgraded(element)
    }

    /// Last reported connectivity of an upgraded element
    pub fn is_attached(&self, element: NodeId) -> bool {
        self.elements.is_attached(element)
    }

    /// Type an upgraded element was upgraded to
    pub fn definition_of(&self, element: NodeId) -> Option<Rc<ElementDefinition>> {
        self.elements.definition_of(element)
    }

    /// Call a prototype method on an element.
    ///
    /// Upgraded elements resolve through their type's chain first; every
    /// element falls back to the native prototype of its tag.
    pub fn invoke(&mut self, element: NodeId, name: &str, args: &[String]) -> Result<Option<String>> {
        let method = match self.elements.upgraded.get(&element) {
            Some(state) => state.behavior.method(name),
            None => self
                .document
                .tree
                .local_name(element)
                .and_then(|tag| self.elements.registry.native(tag))
                .and_then(|p| p.method(name))
                .cloned(),
        };
        let Some(method) = method else {
            return Err(Error::UnknownMethod {
                element,
                name: name.to_string(),
            });
        };
        method(self, element, args).map_err(Error::Method)
    }

    /// Report an attribute primitive's effect to `attributeChanged`
    pub(crate) fn attribute_changed(
        &mut self,
        element: NodeId,
        name: &str,
        old_value: Option<String>,
        new_value: Option<String>,
    ) {
        if old_value == new_value {
            return;
        }
        let Some(callback) = self
            .elements
            .upgraded
            .get(&element)
            .and_then(|e| e.definition.lifecycle.attribute_changed.clone())
        else {
            return;
        };
        let change = AttributeChange {
            name: name.to_string(),
            old_value,
            new_value,
        };
        tracing::trace!("attributeChanged {:?} {:?}", element, change);
        if let Err(error) = callback(self, element, &change) {
            self.report_error(CallbackSource::AttributeChanged(element), error);
        }
    }
}
