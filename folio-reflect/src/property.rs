//! Property adapters built from property descriptors.
//!
//! The set of property kinds is closed, so a registered property is a plain
//! enum and every category-specific behavior is a `match`.

use crate::builtin;
use crate::descriptor::{PropertyCategory, PropertyDescriptor, PropertyFlags};
use crate::error::{RegistryError, RegistryResult};
use serde_json::Value;

/// A single-valued property.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberProperty {
    pub name: String,
    pub property_type: String,
    pub flags: PropertyFlags,
    pub default_value: Option<Value>,
}

/// An ordered list property.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayProperty {
    pub name: String,
    pub element_type: String,
    pub flags: PropertyFlags,
    pub default_value: Option<Value>,
}

/// A property holding unique elements.
#[derive(Debug, Clone, PartialEq)]
pub struct SetProperty {
    pub name: String,
    pub element_type: String,
    pub flags: PropertyFlags,
    pub default_value: Option<Value>,
}

/// A fixed value declared by the type.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantProperty {
    pub name: String,
    pub property_type: String,
    pub flags: PropertyFlags,
    pub value: Value,
}

/// A callable. Carries its signature's return type only.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionProperty {
    pub name: String,
    pub return_type: String,
    pub flags: PropertyFlags,
}

/// A registered property.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Member(MemberProperty),
    Array(ArrayProperty),
    Set(SetProperty),
    Constant(ConstantProperty),
    Function(FunctionProperty),
}

impl Property {
    /// Builds the adapter matching the descriptor's category.
    ///
    /// `Map` properties cannot be mirrored and fail with
    /// [`RegistryError::UnsupportedCategory`].
    pub fn from_descriptor(type_name: &str, desc: &PropertyDescriptor) -> RegistryResult<Self> {
        let name = desc.name.clone();
        let flags = desc.flags;
        let property = match desc.category {
            PropertyCategory::Member => Self::Member(MemberProperty {
                name,
                property_type: desc.type_name.clone(),
                flags,
                default_value: desc.default_value.clone(),
            }),
            PropertyCategory::Array => Self::Array(ArrayProperty {
                name,
                element_type: desc.type_name.clone(),
                flags,
                default_value: desc.default_value.clone(),
            }),
            PropertyCategory::Set => Self::Set(SetProperty {
                name,
                element_type: desc.type_name.clone(),
                flags,
                default_value: desc.default_value.clone(),
            }),
            PropertyCategory::Constant => {
                let value = desc.constant_value.clone().ok_or_else(|| {
                    RegistryError::InvalidDescriptor(format!(
                        "constant '{}' of type '{}' has no value",
                        desc.name, type_name
                    ))
                })?;
                Self::Constant(ConstantProperty {
                    name,
                    property_type: desc.type_name.clone(),
                    flags,
                    value,
                })
            }
            PropertyCategory::Function => Self::Function(FunctionProperty {
                name,
                return_type: desc.type_name.clone(),
                flags,
            }),
            PropertyCategory::Map => {
                return Err(RegistryError::UnsupportedCategory {
                    type_name: type_name.to_string(),
                    property: desc.name.clone(),
                    category: PropertyCategory::Map,
                });
            }
        };
        Ok(property)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Member(p) => &p.name,
            Self::Array(p) => &p.name,
            Self::Set(p) => &p.name,
            Self::Constant(p) => &p.name,
            Self::Function(p) => &p.name,
        }
    }

    pub fn category(&self) -> PropertyCategory {
        match self {
            Self::Member(_) => PropertyCategory::Member,
            Self::Array(_) => PropertyCategory::Array,
            Self::Set(_) => PropertyCategory::Set,
            Self::Constant(_) => PropertyCategory::Constant,
            Self::Function(_) => PropertyCategory::Function,
        }
    }

    pub fn flags(&self) -> PropertyFlags {
        match self {
            Self::Member(p) => p.flags,
            Self::Array(p) => p.flags,
            Self::Set(p) => p.flags,
            Self::Constant(p) => p.flags,
            Self::Function(p) => p.flags,
        }
    }

    /// Member type, element type, or return type, depending on category.
    pub fn target_type(&self) -> &str {
        match self {
            Self::Member(p) => &p.property_type,
            Self::Array(p) => &p.element_type,
            Self::Set(p) => &p.element_type,
            Self::Constant(p) => &p.property_type,
            Self::Function(p) => &p.return_type,
        }
    }

    /// Whether objects store a value for this property.
    pub fn holds_value(&self) -> bool {
        matches!(self, Self::Member(_) | Self::Array(_) | Self::Set(_))
    }

    /// Whether [`Property::coerce`]d user writes are accepted.
    pub fn is_writable(&self) -> bool {
        self.holds_value() && !self.flags().contains(PropertyFlags::READ_ONLY)
    }

    /// The value an object has before anything is assigned.
    pub fn zero_value(&self) -> Value {
        match self {
            Self::Member(p) => builtin::zero_value(&p.property_type),
            Self::Array(_) | Self::Set(_) => Value::Array(Vec::new()),
            Self::Constant(p) => p.value.clone(),
            Self::Function(_) => Value::Null,
        }
    }

    /// The declared default, if any.
    pub fn default_value(&self) -> Option<&Value> {
        match self {
            Self::Member(p) => p.default_value.as_ref(),
            Self::Array(p) => p.default_value.as_ref(),
            Self::Set(p) => p.default_value.as_ref(),
            Self::Constant(_) | Self::Function(_) => None,
        }
    }

    pub(crate) fn set_default_value(&mut self, value: Option<Value>) {
        match self {
            Self::Member(p) => p.default_value = value,
            Self::Array(p) => p.default_value = value,
            Self::Set(p) => p.default_value = value,
            Self::Constant(_) | Self::Function(_) => {}
        }
    }

    /// Checks a value against this property's shape and normalizes it.
    ///
    /// Set values are de-duplicated, keeping first occurrences in order.
    pub fn coerce(&self, value: Value) -> RegistryResult<Value> {
        match self {
            Self::Member(p) => {
                check_element(&p.name, &p.property_type, &value)?;
                Ok(value)
            }
            Self::Array(p) => {
                let items = expect_array(&p.name, value)?;
                for item in &items {
                    check_element(&p.name, &p.element_type, item)?;
                }
                Ok(Value::Array(items))
            }
            Self::Set(p) => {
                let items = expect_array(&p.name, value)?;
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in items {
                    check_element(&p.name, &p.element_type, &item)?;
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                Ok(Value::Array(unique))
            }
            Self::Constant(p) => Err(RegistryError::ReadOnlyProperty(p.name.clone())),
            Self::Function(p) => Err(RegistryError::NotAValue(p.name.clone())),
        }
    }

    /// Structural comparison against a descriptor, ignoring the phantom bit.
    pub fn matches_descriptor(&self, desc: &PropertyDescriptor) -> bool {
        if desc.category != self.category() || desc.name != self.name() {
            return false;
        }
        if desc.flags.difference(PropertyFlags::PHANTOM)
            != self.flags().difference(PropertyFlags::PHANTOM)
        {
            return false;
        }
        if desc.type_name != self.target_type() {
            return false;
        }
        match self {
            Self::Constant(p) => desc.constant_value.as_ref() == Some(&p.value),
            _ => true,
        }
    }

    /// Converts back into a descriptor.
    pub fn to_descriptor(&self) -> PropertyDescriptor {
        PropertyDescriptor {
            name: self.name().to_string(),
            category: self.category(),
            type_name: self.target_type().to_string(),
            flags: self.flags(),
            constant_value: match self {
                Self::Constant(p) => Some(p.value.clone()),
                _ => None,
            },
            default_value: self.default_value().cloned(),
        }
    }
}

fn expect_array(property: &str, value: Value) -> RegistryResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(RegistryError::TypeMismatch {
            property: property.to_string(),
            expected: "array".to_string(),
            actual: builtin::json_kind(&other).to_string(),
        }),
    }
}

fn check_element(property: &str, type_name: &str, value: &Value) -> RegistryResult<()> {
    if builtin::value_fits(type_name, value) {
        Ok(())
    } else {
        Err(RegistryError::TypeMismatch {
            property: property.to_string(),
            expected: type_name.to_string(),
            actual: builtin::json_kind(value).to_string(),
        })
    }
}
