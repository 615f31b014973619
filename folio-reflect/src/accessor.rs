//! Property storage and type-checked access to it.
//!
//! Objects keep their values in a [`PropertyStore`]; the store itself knows
//! nothing about types. Every read and write goes through an accessor that
//! resolves the property against the type's *current* shape in the
//! registry, so an updated phantom type is honored immediately.

use crate::error::{RegistryError, RegistryResult};
use crate::property::Property;
use crate::registry::{TypeRef, TypeRegistry};
use serde_json::Value;
use std::collections::HashMap;

/// Raw property values of one object, keyed by property name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyStore {
    values: HashMap<String, Value>,
}

impl PropertyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for PropertyStore {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

fn resolve<'r>(registry: &'r TypeRegistry, ty: TypeRef, name: &str) -> RegistryResult<&'r Property> {
    let type_name = registry
        .type_name(ty)
        .ok_or_else(|| RegistryError::UnknownType(ty.to_string()))?;
    registry
        .property(ty, name)
        .ok_or_else(|| RegistryError::UnknownProperty {
            type_name: type_name.to_string(),
            property: name.to_string(),
        })
}

fn read_value(registry: &TypeRegistry, ty: TypeRef, store: &PropertyStore, name: &str) -> RegistryResult<Value> {
    let property = resolve(registry, ty, name)?;
    match property {
        Property::Function(p) => Err(RegistryError::NotAValue(p.name.clone())),
        Property::Constant(p) => Ok(p.value.clone()),
        _ => Ok(store
            .get(name)
            .cloned()
            .unwrap_or_else(|| property.zero_value())),
    }
}

fn read_stored(registry: &TypeRegistry, ty: TypeRef, store: &PropertyStore) -> Vec<(String, Value)> {
    registry
        .stored_properties(ty)
        .into_iter()
        .map(|p| {
            let value = store.get(p.name()).cloned().unwrap_or_else(|| p.zero_value());
            (p.name().to_string(), value)
        })
        .collect()
}

/// Read access to an object's properties through its type.
#[derive(Debug, Clone, Copy)]
pub struct TypeAccessor<'a> {
    registry: &'a TypeRegistry,
    ty: TypeRef,
    store: &'a PropertyStore,
}

impl<'a> TypeAccessor<'a> {
    pub fn new(registry: &'a TypeRegistry, ty: TypeRef, store: &'a PropertyStore) -> Self {
        Self { registry, ty, store }
    }

    pub fn type_ref(&self) -> TypeRef {
        self.ty
    }

    pub fn type_name(&self) -> Option<&'a str> {
        self.registry.type_name(self.ty)
    }

    /// Whether the type currently declares the property.
    pub fn has_property(&self, name: &str) -> bool {
        self.registry.property(self.ty, name).is_some()
    }

    /// Reads a value. Unassigned properties read as their zero value.
    pub fn get(&self, name: &str) -> RegistryResult<Value> {
        read_value(self.registry, self.ty, self.store, name)
    }

    /// All stored property values in the type's property order.
    pub fn values(&self) -> Vec<(String, Value)> {
        read_stored(self.registry, self.ty, self.store)
    }
}

/// Read/write access to an object's properties through its type.
#[derive(Debug)]
pub struct TypeAccessorMut<'a> {
    registry: &'a TypeRegistry,
    ty: TypeRef,
    store: &'a mut PropertyStore,
}

impl<'a> TypeAccessorMut<'a> {
    pub fn new(registry: &'a TypeRegistry, ty: TypeRef, store: &'a mut PropertyStore) -> Self {
        Self { registry, ty, store }
    }

    pub fn get(&self, name: &str) -> RegistryResult<Value> {
        read_value(self.registry, self.ty, self.store, name)
    }

    pub fn values(&self) -> Vec<(String, Value)> {
        read_stored(self.registry, self.ty, self.store)
    }

    /// Writes a user-editable value and returns the previous one.
    ///
    /// Rejects read-only, constant, and function properties.
    pub fn set(&mut self, name: &str, value: Value) -> RegistryResult<Value> {
        let property = resolve(self.registry, self.ty, name)?;
        if !property.is_writable() {
            return match property {
                Property::Function(_) => Err(RegistryError::NotAValue(name.to_string())),
                _ => Err(RegistryError::ReadOnlyProperty(name.to_string())),
            };
        }
        self.write(property, name, value)
    }

    /// Writes any stored value, read-only ones included.
    ///
    /// Used when restoring persisted or previously captured state.
    pub fn restore(&mut self, name: &str, value: Value) -> RegistryResult<Value> {
        let property = resolve(self.registry, self.ty, name)?;
        if !property.holds_value() {
            return Err(RegistryError::NotAValue(name.to_string()));
        }
        self.write(property, name, value)
    }

    fn write(&mut self, property: &Property, name: &str, value: Value) -> RegistryResult<Value> {
        let value = property.coerce(value)?;
        let previous = self
            .store
            .insert(name, value)
            .unwrap_or_else(|| property.zero_value());
        Ok(previous)
    }
}
