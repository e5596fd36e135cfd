//! Element Type Definitions
//!
//! Prototypes, lifecycle callbacks and the resolved definition produced by
//! registration.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use fos_dom::NodeId;

use crate::Realm;

/// Prototype method: `(realm, element, args) -> optional result`
pub type Method = Rc<dyn Fn(&mut Realm, NodeId, &[String]) -> anyhow::Result<Option<String>>>;

/// `created`, `attached` or `detached` callback
pub type LifecycleCallback = Rc<dyn Fn(&mut Realm, NodeId) -> anyhow::Result<()>>;

/// `attributeChanged` callback
pub type AttributeChangedCallback =
    Rc<dyn Fn(&mut Realm, NodeId, &AttributeChange) -> anyhow::Result<()>>;

/// Attribute change passed to `attributeChanged`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeChange {
    pub name: String,
    /// `None` when the attribute was added
    pub old_value: Option<String>,
    /// `None` when the attribute was removed
    pub new_value: Option<String>,
}

/// Named behaviour table layered onto an element
#[derive(Clone, Default)]
pub struct Prototype {
    methods: Vec<(String, Method)>,
}

impl Prototype {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a method, replacing one of the same name
    pub fn with_method<F>(mut self, name: &str, method: F) -> Self
    where
        F: Fn(&mut Realm, NodeId, &[String]) -> anyhow::Result<Option<String>> + 'static,
    {
        self.methods.retain(|(n, _)| n != name);
        self.methods.push((name.to_string(), Rc::new(method)));
        self
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    /// Method names in definition order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(|(n, _)| n.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl fmt::Debug for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Lifecycle callback set
#[derive(Clone, Default)]
pub struct Lifecycle {
    pub created: Option<LifecycleCallback>,
    pub attached: Option<LifecycleCallback>,
    pub detached: Option<LifecycleCallback>,
    pub attribute_changed: Option<AttributeChangedCallback>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_created<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Realm, NodeId) -> anyhow::Result<()> + 'static,
    {
        self.created = Some(Rc::new(f));
        self
    }

    pub fn on_attached<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Realm, NodeId) -> anyhow::Result<()> + 'static,
    {
        self.attached = Some(Rc::new(f));
        self
    }

    pub fn on_detached<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Realm, NodeId) -> anyhow::Result<()> + 'static,
    {
        self.detached = Some(Rc::new(f));
        self
    }

    pub fn on_attribute_changed<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Realm, NodeId, &AttributeChange) -> anyhow::Result<()> + 'static,
    {
        self.attribute_changed = Some(Rc::new(f));
        self
    }

    /// Fill callbacks this set lacks from `parent`
    pub(crate) fn inherit(mut self, parent: &Lifecycle) -> Self {
        self.created = self.created.or_else(|| parent.created.clone());
        self.attached = self.attached.or_else(|| parent.attached.clone());
        self.detached = self.detached.or_else(|| parent.detached.clone());
        self.attribute_changed = self
            .attribute_changed
            .or_else(|| parent.attribute_changed.clone());
        self
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("created", &self.created.is_some())
            .field("attached", &self.attached.is_some())
            .field("detached", &self.detached.is_some())
            .field("attribute_changed", &self.attribute_changed.is_some())
            .finish()
    }
}

/// Registration options
#[derive(Debug, Clone, Default)]
pub struct ElementOptions {
    pub prototype: Prototype,
    /// Built-in tag or registered type name this type builds on
    pub extends: Option<String>,
    pub lifecycle: Lifecycle,
}

impl ElementOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extends(mut self, name: &str) -> Self {
        self.extends = Some(name.to_string());
        self
    }

    pub fn prototype(mut self, prototype: Prototype) -> Self {
        self.prototype = prototype;
        self
    }

    pub fn lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }
}

/// Registered element type
#[derive(Debug)]
pub struct ElementDefinition {
    /// Lowercase type name
    pub name: String,
    /// Lowercase `extends` value as given
    pub extends: Option<String>,
    /// Tag the element is created with
    pub tag: String,
    /// Required `is` marker, for types that extend another tag
    pub is: Option<String>,
    /// Registered types this one builds on, nearest first
    pub ancestry: Vec<Rc<ElementDefinition>>,
    pub prototype: Prototype,
    /// Callbacks resolved along the ancestry
    pub lifecycle: Lifecycle,
    /// Host baseline for `tag`, captured at registration
    pub native: Option<Prototype>,
}

impl ElementDefinition {
    /// Own prototype followed by the ancestry's, nearest first
    pub fn chain(&self) -> impl Iterator<Item = &Prototype> {
        std::iter::once(&self.prototype).chain(self.ancestry.iter().map(|d| &d.prototype))
    }

    /// Resolve a method along the chain, then on the native baseline
    pub fn resolve_method(&self, name: &str) -> Option<Method> {
        self.chain()
            .find_map(|p| p.method(name))
            .or_else(|| self.native.as_ref().and_then(|p| p.method(name)))
            .cloned()
    }

    /// Whether instances need the `is` marker
    pub fn is_extension(&self) -> bool {
        self.is.is_some()
    }
}

/// How an upgraded instance resolves its behaviour
pub(crate) enum Behavior {
    /// The instance points at the definition's chain
    Chained(Rc<ElementDefinition>),
    /// Custom layers flattened onto the instance; the native baseline stays
    /// underneath
    Mixed {
        methods: HashMap<String, Method>,
        native: Option<Prototype>,
    },
}

impl Behavior {
    pub(crate) fn for_definition(definition: &Rc<ElementDefinition>, reassignable: bool) -> Self {
        if reassignable {
            return Self::Chained(definition.clone());
        }
        let mut methods = HashMap::new();
        for prototype in definition.chain() {
            for (name, method) in &prototype.methods {
                methods.entry(name.clone()).or_insert_with(|| method.clone());
            }
        }
        Self::Mixed {
            methods,
            native: definition.native.clone(),
        }
    }

    pub(crate) fn method(&self, name: &str) -> Option<Method> {
        match self {
            Self::Chained(definition) => definition.resolve_method(name),
            Self::Mixed { methods, native } => methods
                .get(name)
                .or_else(|| native.as_ref().and_then(|p| p.method(name)))
                .cloned(),
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chained(definition) => write!(f, "Chained({})", definition.name),
            Self::Mixed { methods, .. } => write!(f, "Mixed({} methods)", methods.len()),
        }
    }
}

/// Factory bound to one definition
#[derive(Debug, Clone)]
pub struct ElementConstructor {
    definition: Rc<ElementDefinition>,
}

impl ElementConstructor {
    pub(crate) fn new(definition: Rc<ElementDefinition>) -> Self {
        Self { definition }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &Rc<ElementDefinition> {
        &self.definition
    }

    /// Create a new, already upgraded, detached instance
    pub fn construct(&self, realm: &mut Realm) -> NodeId {
        let element = realm.create_element(&self.definition.tag);
        realm.upgrade_with_definition(element, self.definition.clone());
        element
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn returns(value: &'static str) -> impl Fn(&mut Realm, NodeId, &[String]) -> anyhow::Result<Option<String>> {
        move |_, _, _| Ok(Some(value.to_string()))
    }

    fn definition(name: &str, prototype: Prototype, ancestry: Vec<Rc<ElementDefinition>>) -> Rc<ElementDefinition> {
        Rc::new(ElementDefinition {
            name: name.to_string(),
            extends: None,
            tag: name.to_string(),
            is: None,
            ancestry,
            prototype,
            lifecycle: Lifecycle::new(),
            native: Some(Prototype::new().with_method("click", returns("native")).with_method("focus", returns("native"))),
        })
    }

    fn call(behavior: &Behavior, name: &str) -> Option<String> {
        let mut realm = Realm::default();
        let method = behavior.method(name)?;
        method(&mut realm, NodeId::ROOT, &[]).ok().flatten()
    }

    #[test]
    fn test_with_method_replaces() {
        let proto = Prototype::new()
            .with_method("a", returns("1"))
            .with_method("a", returns("2"));
        assert_eq!(proto.names().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_behaviors_resolve_identically() {
        let base = definition(
            "x-base",
            Prototype::new().with_method("greet", returns("base")).with_method("name", returns("base")),
            Vec::new(),
        );
        let derived = definition(
            "x-derived",
            Prototype::new().with_method("greet", returns("derived")).with_method("click", returns("custom")),
            vec![base],
        );

        for reassignable in [true, false] {
            let behavior = Behavior::for_definition(&derived, reassignable);
            assert_eq!(call(&behavior, "greet").as_deref(), Some("derived"));
            assert_eq!(call(&behavior, "name").as_deref(), Some("base"));
            assert_eq!(call(&behavior, "click").as_deref(), Some("custom"));
            assert_eq!(call(&behavior, "focus").as_deref(), Some("native"));
            assert!(behavior.method("missing").is_none());
        }
    }

    #[test]
    fn test_lifecycle_inherit_keeps_own() {
        let parent = Lifecycle::new()
            .on_created(|_, _| Ok(()))
            .on_attached(|_, _| Ok(()));
        let own = Lifecycle::new().on_created(|_, _| anyhow::bail!("own"));
        let own_created = own.created.clone();
        let resolved = own.inherit(&parent);

        assert!(resolved.attached.is_some());
        assert!(resolved.detached.is_none());
        let (Some(a), Some(b)) = (resolved.created, own_created) else {
            panic!("created callback missing");
        };
        assert!(Rc::ptr_eq(&a, &b));
    }
}
