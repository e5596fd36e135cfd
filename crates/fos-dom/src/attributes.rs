//! Element Attributes
//!
//! Attribute manipulation: get, set, remove, has.

/// Single attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
    pub namespace: Option<String>,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

/// Named node map (attribute collection)
///
/// Attributes keep insertion order; lookups are linear since elements rarely
/// carry more than a handful.
#[derive(Debug, Clone, Default)]
pub struct NamedNodeMap {
    attributes: Vec<Attr>,
}

impl NamedNodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of attributes
    pub fn length(&self) -> usize {
        self.attributes.len()
    }

    /// Get attribute by index
    pub fn item(&self, index: usize) -> Option<&Attr> {
        self.attributes.get(index)
    }

    /// Get attribute by namespace and name
    pub fn get_named_item_ns(&self, namespace: Option<&str>, name: &str) -> Option<&Attr> {
        self.attributes
            .iter()
            .find(|a| a.name == name && a.namespace.as_deref() == namespace)
    }

    /// Get attribute value (no namespace)
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.get_named_item_ns(None, name).map(|a| a.value.as_str())
    }

    /// Set attribute, returning the replaced one
    pub fn set_named_item(&mut self, attr: Attr) -> Option<Attr> {
        match self
            .attributes
            .iter_mut()
            .find(|a| a.name == attr.name && a.namespace == attr.namespace)
        {
            Some(existing) => Some(std::mem::replace(existing, attr)),
            None => {
                self.attributes.push(attr);
                None
            }
        }
    }

    /// Remove attribute by namespace and name
    pub fn remove_named_item_ns(&mut self, namespace: Option<&str>, name: &str) -> Option<Attr> {
        let index = self
            .attributes
            .iter()
            .position(|a| a.name == name && a.namespace.as_deref() == namespace)?;
        Some(self.attributes.remove(index))
    }

    /// Check if attribute exists
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_named_item_ns(None, name).is_some()
    }

    /// Get attribute names
    pub fn get_attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    /// Iterate over attributes
    pub fn iter(&self) -> impl Iterator<Item = &Attr> {
        self.attributes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_attribute() {
        let mut attrs = NamedNodeMap::new();
        attrs.set_named_item(Attr::new("class", "btn"));
        attrs.set_named_item(Attr::new("id", "submit"));

        assert_eq!(attrs.length(), 2);
        assert_eq!(attrs.get_attribute("class"), Some("btn"));
        assert_eq!(attrs.get_attribute("id"), Some("submit"));
    }

    #[test]
    fn test_replace_returns_old() {
        let mut attrs = NamedNodeMap::new();
        assert!(attrs.set_named_item(Attr::new("foo", "1")).is_none());
        let old = attrs.set_named_item(Attr::new("foo", "2"));
        assert_eq!(old.map(|a| a.value), Some("1".to_string()));
        assert_eq!(attrs.length(), 1);
    }

    #[test]
    fn test_namespaces_are_distinct() {
        let mut attrs = NamedNodeMap::new();
        attrs.set_named_item(Attr::new("href", "a"));
        attrs.set_named_item(Attr::new("href", "b").with_namespace("http://www.w3.org/1999/xlink"));

        assert_eq!(attrs.length(), 2);
        assert_eq!(attrs.get_attribute("href"), Some("a"));
        assert!(attrs.remove_named_item_ns(Some("http://www.w3.org/1999/xlink"), "href").is_some());
        assert!(attrs.has_attribute("href"));
    }
}
