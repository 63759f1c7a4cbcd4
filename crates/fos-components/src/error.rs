//! Component errors

use fos_dom::DomError;

/// Result type for registry and composition operations
pub type ComponentResult<T> = Result<T, ComponentError>;

/// Errors surfaced to callers of the component engines
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComponentError {
    /// The name is already registered
    #[error("Element already defined: {0}")]
    DuplicateName(String),

    /// The definition is missing required shape or uses an invalid name
    #[error("Invalid definition for '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    /// Host tree rejected the operation
    #[error(transparent)]
    Dom(#[from] DomError),
}

impl ComponentError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition { name: name.to_string(), reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fos_dom::NodeId;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ComponentError::DuplicateName("x-foo".into()).to_string(),
            "Element already defined: x-foo"
        );
        assert_eq!(
            ComponentError::invalid("xfoo", "name must contain a hyphen").to_string(),
            "Invalid definition for 'xfoo': name must contain a hyphen"
        );
        let dom: ComponentError = DomError::NotFound(NodeId::NONE).into();
        assert_eq!(dom.to_string(), "Node not found: #none");
    }
}
