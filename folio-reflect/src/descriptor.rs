//! Plain-data descriptions of reflected types.
//!
//! A [`ReflectedTypeDescriptor`] is what travels between processes: it names
//! a type, its parent, and its ordered property list without carrying any
//! implementation. The registry turns descriptors into registered types.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use serde_json::Value;

bitflags! {
    /// Flags describing a reflected type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TypeFlags: u32 {
        const STANDARD_TYPE = 1 << 0;
        const IS_ENUM = 1 << 1;
        const BITFLAGS = 1 << 2;
        const CLASS = 1 << 3;
        const ABSTRACT = 1 << 4;
        /// Set on every type mirrored without a native implementation.
        const PHANTOM = 1 << 5;
    }
}

bitflags! {
    /// Flags describing a single property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct PropertyFlags: u32 {
        const STANDARD_TYPE = 1 << 0;
        const POINTER = 1 << 1;
        const READ_ONLY = 1 << 2;
        const HIDDEN = 1 << 3;
        const PHANTOM = 1 << 4;
    }
}

/// The kind of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyCategory {
    /// A single value.
    Member,
    /// An ordered list of elements.
    Array,
    /// An unordered collection of unique elements.
    Set,
    /// A keyed collection. Not representable by the phantom mirror.
    Map,
    /// A fixed value declared by the type.
    Constant,
    /// A callable exposed by the type. Holds no value.
    Function,
}

/// The storage kind a type maps to when held in a variant value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantType {
    #[default]
    Invalid,
    Bool,
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float,
    Double,
    String,
    Uuid,
    Object,
}

/// Description of one property of a reflected type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub category: PropertyCategory,
    /// Name of the member type, element type, or function return type.
    pub type_name: String,
    #[serde(default)]
    pub flags: PropertyFlags,
    /// Only meaningful for [`PropertyCategory::Constant`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant_value: Option<Value>,
    /// Value applied to freshly created objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl PropertyDescriptor {
    fn simple(name: &str, category: PropertyCategory, type_name: &str) -> Self {
        Self {
            name: name.into(),
            category,
            type_name: type_name.into(),
            flags: PropertyFlags::empty(),
            constant_value: None,
            default_value: None,
        }
    }

    /// Shorthand for a member property.
    pub fn member(name: &str, type_name: &str) -> Self {
        Self::simple(name, PropertyCategory::Member, type_name)
    }

    /// Shorthand for an array property.
    pub fn array(name: &str, element_type: &str) -> Self {
        Self::simple(name, PropertyCategory::Array, element_type)
    }

    /// Shorthand for a set property.
    pub fn set(name: &str, element_type: &str) -> Self {
        Self::simple(name, PropertyCategory::Set, element_type)
    }

    /// Shorthand for a map property.
    pub fn map(name: &str, value_type: &str) -> Self {
        Self::simple(name, PropertyCategory::Map, value_type)
    }

    /// Shorthand for a constant property.
    pub fn constant(name: &str, type_name: &str, value: Value) -> Self {
        Self {
            constant_value: Some(value),
            ..Self::simple(name, PropertyCategory::Constant, type_name)
        }
    }

    /// Shorthand for a function property.
    pub fn function(name: &str, return_type: &str) -> Self {
        Self::simple(name, PropertyCategory::Function, return_type)
    }

    #[must_use]
    pub fn with_flags(mut self, flags: PropertyFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

/// Complete description of a reflected type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectedTypeDescriptor {
    pub type_name: String,
    /// Origin of the type, e.g. the plugin that declared it.
    #[serde(default)]
    pub plugin_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_type_name: Option<String>,
    #[serde(default)]
    pub type_size: u32,
    #[serde(default)]
    pub type_version: u32,
    #[serde(default)]
    pub variant_type: VariantType,
    #[serde(default)]
    pub flags: TypeFlags,
    /// Declared properties, in declaration order.
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

impl ReflectedTypeDescriptor {
    /// Creates a descriptor with no parent and no properties.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            plugin_name: String::new(),
            parent_type_name: None,
            type_size: 0,
            type_version: 1,
            variant_type: VariantType::Invalid,
            flags: TypeFlags::CLASS,
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_type_name = Some(parent.into());
        self
    }

    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin_name = plugin.into();
        self
    }

    #[must_use]
    pub fn with_version(mut self, version: u32) -> Self {
        self.type_version = version;
        self
    }

    #[must_use]
    pub fn with_size(mut self, size: u32) -> Self {
        self.type_size = size;
        self
    }

    #[must_use]
    pub fn with_variant_type(mut self, variant_type: VariantType) -> Self {
        self.variant_type = variant_type;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags = flags;
        self
    }

    #[must_use]
    pub fn with_property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }
}
