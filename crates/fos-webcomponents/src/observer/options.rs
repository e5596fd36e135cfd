//! Observation options

use fos_dom::TreeEdit;

use crate::error::ObserveError;

/// Mutation observer options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub character_data: bool,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub character_data_old_value: bool,
    /// Attribute names to report; an empty list behaves like `None`
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// `childList` only
    pub fn child_list() -> Self {
        Self { child_list: true, ..Default::default() }
    }

    /// `attributes` only
    pub fn attributes() -> Self {
        Self { attributes: true, ..Default::default() }
    }

    /// `characterData` only
    pub fn character_data() -> Self {
        Self { character_data: true, ..Default::default() }
    }

    /// Also observe descendants
    pub fn with_subtree(mut self) -> Self {
        self.subtree = true;
        self
    }

    /// Check the option combination is coherent
    pub fn validate(&self) -> Result<(), ObserveError> {
        if !self.child_list && !self.attributes && !self.character_data {
            return Err(ObserveError::NoMutationKind);
        }
        if self.attribute_old_value && !self.attributes {
            return Err(ObserveError::AttributeOldValueWithoutAttributes);
        }
        if self.filter().is_some() && !self.attributes {
            return Err(ObserveError::AttributeFilterWithoutAttributes);
        }
        if self.character_data_old_value && !self.character_data {
            return Err(ObserveError::CharacterDataOldValueWithoutCharacterData);
        }
        Ok(())
    }

    fn filter(&self) -> Option<&[String]> {
        self.attribute_filter.as_deref().filter(|f| !f.is_empty())
    }

    /// Whether an attribute change passes the filter.
    ///
    /// A filter only ever matches attributes without a namespace.
    pub(crate) fn accepts_attribute(&self, namespace: Option<&str>, name: &str) -> bool {
        match self.filter() {
            None => true,
            Some(filter) => namespace.is_none() && filter.iter().any(|n| n == name),
        }
    }

    /// Low-level edit kinds these options listen for
    pub(crate) fn edit_kinds(&self) -> EditKinds {
        let mut kinds = EditKinds::NONE;
        if self.attributes {
            kinds = kinds.or(EditKinds::ATTRIBUTE);
        }
        if self.character_data {
            kinds = kinds.or(EditKinds::CHARACTER_DATA);
        }
        if self.child_list {
            kinds = kinds.or(EditKinds::INSERTED);
        }
        // removals also drive transient observation for subtree observers
        if self.child_list || self.subtree {
            kinds = kinds.or(EditKinds::REMOVED);
        }
        kinds
    }
}

/// Set of low-level edit kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditKinds(u8);

impl EditKinds {
    pub const NONE: EditKinds = EditKinds(0);
    pub const ATTRIBUTE: EditKinds = EditKinds(0x1);
    pub const CHARACTER_DATA: EditKinds = EditKinds(0x2);
    pub const INSERTED: EditKinds = EditKinds(0x4);
    pub const REMOVED: EditKinds = EditKinds(0x8);

    /// Kind of a single edit
    pub fn of(edit: &TreeEdit) -> EditKinds {
        match edit {
            TreeEdit::Inserted { .. } => Self::INSERTED,
            TreeEdit::Removed { .. } => Self::REMOVED,
            TreeEdit::Attribute { .. } => Self::ATTRIBUTE,
            TreeEdit::CharacterData { .. } => Self::CHARACTER_DATA,
        }
    }

    /// Check if all kinds in `other` are included
    pub fn includes(self, other: EditKinds) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of two sets
    pub fn or(self, other: EditKinds) -> EditKinds {
        EditKinds(self.0 | other.0)
    }
}
