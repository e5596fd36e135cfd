//! Error types
//!
//! Configuration errors fail synchronously at the offending call. Callback
//! failures never abort a batch; they are collected as [`UnhandledError`].

use fos_dom::{DomError, NodeId};

use crate::observer::ObserverId;

/// Invalid `observe` options
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObserveError {
    #[error("options must set at least one of 'childList', 'attributes' or 'characterData'")]
    NoMutationKind,

    #[error("'attributeOldValue' requires 'attributes'")]
    AttributeOldValueWithoutAttributes,

    #[error("'attributeFilter' requires 'attributes'")]
    AttributeFilterWithoutAttributes,

    #[error("'characterDataOldValue' requires 'characterData'")]
    CharacterDataOldValueWithoutCharacterData,

    #[error("Observe target: {0}")]
    Dom(#[from] DomError),
}

/// Element type registration failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("type name must not be empty")]
    EmptyName,

    #[error("type name '{0}' must contain a dash ('-')")]
    MissingSeparator(String),

    #[error("type name '{0}' is not a valid custom element name")]
    InvalidName(String),

    #[error("registration failed for type '{0}': the type name is reserved")]
    ReservedName(String),

    #[error("DuplicateDefinitionError: a type with name '{0}' is already registered")]
    DuplicateDefinition(String),
}

/// Which callback produced an [`UnhandledError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackSource {
    Observer(ObserverId),
    Created(NodeId),
    Attached(NodeId),
    Detached(NodeId),
    AttributeChanged(NodeId),
    Ready,
}

/// Callback failure routed to the realm's unhandled-error sink
#[derive(Debug)]
pub struct UnhandledError {
    pub source: CallbackSource,
    pub error: anyhow::Error,
}

/// Crate-level error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Observer error: {0}")]
    Observe(#[from] ObserveError),

    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Element {element:?} has no method '{name}'")]
    UnknownMethod { element: NodeId, name: String },

    #[error("Method failed: {0}")]
    Method(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_type() {
        let err = RegistrationError::DuplicateDefinition("x-foo".into());
        assert!(err.to_string().contains("x-foo"));
        assert!(err.to_string().starts_with("DuplicateDefinitionError"));
    }

    #[test]
    fn test_wraps_dom_errors() {
        let err: Error = ObserveError::from(DomError::NotFound).into();
        assert!(matches!(err, Error::Observe(ObserveError::Dom(DomError::NotFound))));
    }
}
