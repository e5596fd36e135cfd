//! Element Registry
//!
//! Type name to definition map, plus the host's native prototypes.

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RegistrationError;

use super::definition::{ElementDefinition, ElementOptions, Prototype};

/// Names that look like custom types but belong to SVG and MathML
const RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

/// Registered element types
#[derive(Debug, Default)]
pub struct ElementRegistry {
    definitions: HashMap<String, Rc<ElementDefinition>>,
    /// Registration order
    names: Vec<String>,
    natives: HashMap<String, Prototype>,
}

impl ElementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type.
    ///
    /// The first registration of a name wins; on failure the registry is
    /// left unchanged.
    pub fn register(
        &mut self,
        name: &str,
        options: ElementOptions,
    ) -> Result<Rc<ElementDefinition>, RegistrationError> {
        let name = Self::validate_name(name)?;
        if self.is_defined(&name) {
            return Err(RegistrationError::DuplicateDefinition(name));
        }

        let extends = options.extends.map(|e| e.to_ascii_lowercase());
        let ancestry = self.ancestry_of(extends.as_deref());

        // the concrete tag comes from the root of the chain
        let (tag, is) = match (&extends, ancestry.last()) {
            (None, _) => (name.clone(), None),
            (Some(_), Some(root)) => (root.tag.clone(), Some(name.clone())),
            (Some(native), None) => (native.clone(), Some(name.clone())),
        };

        let lifecycle = ancestry
            .iter()
            .fold(options.lifecycle, |own, parent| own.inherit(&parent.lifecycle));

        let definition = Rc::new(ElementDefinition {
            native: self.natives.get(&tag).cloned(),
            name: name.clone(),
            extends,
            tag,
            is,
            ancestry,
            prototype: options.prototype,
            lifecycle,
        });

        self.definitions.insert(name.clone(), definition.clone());
        self.names.push(name);
        Ok(definition)
    }

    /// Follow `extends` through registered types, nearest first
    fn ancestry_of(&self, extends: Option<&str>) -> Vec<Rc<ElementDefinition>> {
        let Some(parent) = extends.and_then(|e| self.definitions.get(e)) else {
            return Vec::new();
        };
        let mut ancestry = Vec::with_capacity(parent.ancestry.len() + 1);
        ancestry.push(parent.clone());
        ancestry.extend(parent.ancestry.iter().cloned());
        ancestry
    }

    /// Case-insensitive exact lookup
    pub fn lookup(&self, name: &str) -> Option<Rc<ElementDefinition>> {
        self.definitions.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Check if a type is registered
    pub fn is_defined(&self, name: &str) -> bool {
        self.definitions.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered names in registration order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Set the host behaviour for a built-in tag.
    ///
    /// Only definitions registered afterwards pick it up.
    pub fn define_native(&mut self, tag: &str, prototype: Prototype) {
        self.natives.insert(tag.to_ascii_lowercase(), prototype);
    }

    pub fn native(&self, tag: &str) -> Option<&Prototype> {
        self.natives.get(&tag.to_ascii_lowercase())
    }

    /// Validate a custom element name, returning its lowercase form
    pub fn validate_name(name: &str) -> Result<String, RegistrationError> {
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        let name = name.to_ascii_lowercase();

        // Must contain hyphen
        if !name.contains('-') {
            return Err(RegistrationError::MissingSeparator(name));
        }

        // Must start with a letter
        let starts_with_letter = name.chars().next().is_some_and(|c| c.is_ascii_lowercase());
        let valid_chars = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '.' | '_'));
        if !starts_with_letter || !valid_chars {
            return Err(RegistrationError::InvalidName(name));
        }

        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(RegistrationError::ReservedName(name));
        }
        Ok(name)
    }
}
