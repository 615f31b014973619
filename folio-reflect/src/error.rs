//! Error types for the type registry.

use crate::descriptor::PropertyCategory;
use crate::registry::TypeRef;
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while registering types or accessing properties.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// The descriptor's parent type is not registered (yet).
    ///
    /// The type itself *was* registered and is reachable through
    /// `type_ref`; its parent link is filled in once the parent appears.
    #[error("type '{type_name}' references unknown parent type '{parent}'")]
    UnresolvedParent {
        type_ref: TypeRef,
        type_name: String,
        parent: String,
    },

    /// A property uses a category the mirror cannot represent.
    #[error("property '{property}' of type '{type_name}' has unsupported category {category:?}")]
    UnsupportedCategory {
        type_name: String,
        property: String,
        category: PropertyCategory,
    },

    /// Two properties of one type share a name.
    #[error("type '{type_name}' declares property '{property}' more than once")]
    DuplicateProperty { type_name: String, property: String },

    /// A native type with this name is already registered.
    #[error("native type '{0}' is already registered")]
    DuplicateType(String),

    /// The descriptor is malformed.
    #[error("invalid type descriptor: {0}")]
    InvalidDescriptor(String),

    /// No type with this name or reference exists.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// The type has no property with this name.
    #[error("type '{type_name}' has no property '{property}'")]
    UnknownProperty { type_name: String, property: String },

    /// The property cannot be written.
    #[error("property '{0}' is read-only")]
    ReadOnlyProperty(String),

    /// The property does not carry a value (e.g. a function).
    #[error("property '{0}' does not hold a value")]
    NotAValue(String),

    /// The value does not fit the property's type.
    #[error("property '{property}' expects {expected}, got {actual}")]
    TypeMismatch {
        property: String,
        expected: String,
        actual: String,
    },

    /// A type announcement payload could not be decoded.
    #[error("malformed type announcement: {0}")]
    MalformedAnnouncement(String),

    /// The announcement queue has been dropped.
    #[error("type announcement channel closed")]
    ChannelClosed,
}

impl RegistryError {
    /// Returns the type that was registered despite this error, if any.
    #[must_use]
    pub fn registered_type(&self) -> Option<TypeRef> {
        match self {
            Self::UnresolvedParent { type_ref, .. } => Some(*type_ref),
            _ => None,
        }
    }
}
