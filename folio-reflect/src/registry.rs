//! The type registry: native types plus the phantom type mirror.
//!
//! Types are stored in an append-only arena and referred to by [`TypeRef`].
//! A phantom type keeps its `TypeRef` for its whole life: announcing a newer
//! descriptor under the same name replaces the entry's contents in place, so
//! every object already pointing at the type sees the new shape on its next
//! property access.

use crate::builtin;
use crate::descriptor::{ReflectedTypeDescriptor, TypeFlags, VariantType};
use crate::error::{RegistryError, RegistryResult};
use crate::property::Property;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Stable handle to a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeRef(u32);

impl TypeRef {
    /// Position of the type in its registry.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Whether a type is implemented in this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Compiled into the current process.
    Native,
    /// Mirrored from a descriptor announced by someone else.
    Phantom,
}

/// A type as held by the registry.
#[derive(Debug, Clone)]
pub struct RegisteredType {
    name: String,
    plugin_name: String,
    parent_name: Option<String>,
    parent: Option<TypeRef>,
    type_size: u32,
    type_version: u32,
    variant_type: VariantType,
    flags: TypeFlags,
    properties: Vec<Property>,
    kind: TypeKind,
    revision: u64,
}

impl RegisteredType {
    fn from_descriptor(desc: &ReflectedTypeDescriptor, kind: TypeKind) -> RegistryResult<Self> {
        if desc.type_name.trim().is_empty() {
            return Err(RegistryError::InvalidDescriptor(
                "type name must not be empty".to_string(),
            ));
        }
        if desc.parent_type_name.as_deref() == Some(desc.type_name.as_str()) {
            return Err(RegistryError::InvalidDescriptor(format!(
                "type '{}' cannot be its own parent",
                desc.type_name
            )));
        }

        let mut seen = HashSet::with_capacity(desc.properties.len());
        let mut properties = Vec::with_capacity(desc.properties.len());
        for prop in &desc.properties {
            if !seen.insert(prop.name.as_str()) {
                return Err(RegistryError::DuplicateProperty {
                    type_name: desc.type_name.clone(),
                    property: prop.name.clone(),
                });
            }
            properties.push(Property::from_descriptor(&desc.type_name, prop)?);
        }

        let mut flags = desc.flags;
        match kind {
            TypeKind::Native => flags.remove(TypeFlags::PHANTOM),
            TypeKind::Phantom => flags.insert(TypeFlags::PHANTOM),
        }

        Ok(Self {
            name: desc.type_name.clone(),
            plugin_name: desc.plugin_name.clone(),
            parent_name: normalized_parent(desc),
            parent: None,
            type_size: desc.type_size,
            type_version: desc.type_version,
            variant_type: desc.variant_type,
            flags,
            properties,
            kind,
            revision: 0,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// The linked parent type. `None` for root types and for types whose
    /// parent has not been registered yet.
    pub fn parent(&self) -> Option<TypeRef> {
        self.parent
    }

    /// The declared parent name, resolved or not.
    pub fn parent_name(&self) -> Option<&str> {
        self.parent_name.as_deref()
    }

    /// True when a parent was declared but is not linked.
    pub fn has_unresolved_parent(&self) -> bool {
        self.parent_name.is_some() && self.parent.is_none()
    }

    pub fn type_size(&self) -> u32 {
        self.type_size
    }

    pub fn type_version(&self) -> u32 {
        self.type_version
    }

    pub fn variant_type(&self) -> VariantType {
        self.variant_type
    }

    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_phantom(&self) -> bool {
        self.kind == TypeKind::Phantom
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT)
    }

    /// Properties declared by this type itself, in declaration order.
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    /// Bumped every time the entry's contents are replaced.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Converts the entry back into a descriptor.
    pub fn to_descriptor(&self) -> ReflectedTypeDescriptor {
        ReflectedTypeDescriptor {
            type_name: self.name.clone(),
            plugin_name: self.plugin_name.clone(),
            parent_type_name: self.parent_name.clone(),
            type_size: self.type_size,
            type_version: self.type_version,
            variant_type: self.variant_type,
            flags: self.flags,
            properties: self.properties.iter().map(Property::to_descriptor).collect(),
        }
    }
}

fn normalized_parent(desc: &ReflectedTypeDescriptor) -> Option<String> {
    desc.parent_type_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

/// A registry shared between documents and the announcement channel.
///
/// The lock serializes type mutation against graph traversal: a reader
/// holding the read guard never observes a half-replaced type.
pub type SharedTypeRegistry = Arc<RwLock<TypeRegistry>>;

/// Acquires the registry for reading.
///
/// A poisoned lock is recovered: entries are only ever replaced whole, so
/// the registry is consistent even after a panicking writer.
pub fn read_registry(registry: &SharedTypeRegistry) -> RwLockReadGuard<'_, TypeRegistry> {
    registry.read().unwrap_or_else(PoisonError::into_inner)
}

/// Acquires the registry for writing.
pub fn write_registry(registry: &SharedTypeRegistry) -> RwLockWriteGuard<'_, TypeRegistry> {
    registry.write().unwrap_or_else(PoisonError::into_inner)
}

/// Registry of native and phantom types.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: Vec<Option<RegisteredType>>,
    by_name: HashMap<String, TypeRef>,
    /// Slots of unregistered phantoms, reclaimed when the name returns.
    retired: HashMap<String, (TypeRef, u64)>,
    revision: u64,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in native types.
    pub fn with_builtin_types() -> Self {
        let mut registry = Self::new();
        for desc in builtin::native_descriptors() {
            let result = registry.register_native(&desc);
            debug_assert!(result.is_ok(), "builtin type failed to register: {result:?}");
        }
        registry
    }

    /// Wraps the registry for sharing.
    pub fn into_shared(self) -> SharedTypeRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Counter bumped whenever any type is added, replaced, or removed.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Looks up a type by name.
    pub fn find(&self, name: &str) -> Option<TypeRef> {
        self.by_name.get(name).copied()
    }

    /// Returns the entry for a type reference.
    pub fn get(&self, ty: TypeRef) -> Option<&RegisteredType> {
        self.types.get(ty.index()).and_then(Option::as_ref)
    }

    /// Returns the name of a type.
    pub fn type_name(&self, ty: TypeRef) -> Option<&str> {
        self.get(ty).map(RegisteredType::name)
    }

    /// Iterates over all registered types.
    pub fn iter(&self) -> impl Iterator<Item = (TypeRef, &RegisteredType)> {
        self.types
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|t| (TypeRef(i as u32), t)))
    }

    /// Registers a type implemented in this process.
    ///
    /// A phantom entry of the same name is superseded in place, keeping its
    /// `TypeRef`. Registering a native name twice is an error.
    pub fn register_native(&mut self, desc: &ReflectedTypeDescriptor) -> RegistryResult<TypeRef> {
        let mut entry = RegisteredType::from_descriptor(desc, TypeKind::Native)?;

        let ty = match self.find(&desc.type_name) {
            Some(ty) => {
                let existing = self.slot_mut(ty)?;
                if existing.kind == TypeKind::Native {
                    return Err(RegistryError::DuplicateType(desc.type_name.clone()));
                }
                entry.revision = existing.revision + 1;
                *existing = entry;
                self.revision += 1;
                self.link_parent(ty);
                info!(type_name = %desc.type_name, "Native type superseded phantom type");
                ty
            }
            None => {
                let ty = self.insert(entry);
                debug!(type_name = %desc.type_name, "Native type registered");
                ty
            }
        };
        self.parent_status(ty)
    }

    /// Registers a phantom type, or updates the existing one of that name.
    ///
    /// - An unknown name creates a new phantom entry.
    /// - A name whose entry already [`matches`](Self::matches) the descriptor
    ///   leaves properties and revision untouched.
    /// - Otherwise the entry's contents are replaced in place and its
    ///   revision bumped; the returned `TypeRef` is unchanged.
    /// - A native type of that name is returned as is.
    ///
    /// Unsupported property categories fail before anything is modified. An
    /// unknown parent yields [`RegistryError::UnresolvedParent`] *after*
    /// registering the type; the link is filled in when the parent arrives.
    pub fn register_or_update(
        &mut self,
        desc: &ReflectedTypeDescriptor,
    ) -> RegistryResult<TypeRef> {
        let Some(ty) = self.find(&desc.type_name) else {
            let entry = RegisteredType::from_descriptor(desc, TypeKind::Phantom)?;
            let ty = self.insert(entry);
            info!(
                type_name = %desc.type_name,
                version = desc.type_version,
                properties = desc.properties.len(),
                "Phantom type registered"
            );
            return self.parent_status(ty);
        };

        let existing = self.slot_mut(ty)?;
        if existing.kind == TypeKind::Native {
            debug!(type_name = %desc.type_name, "Ignoring announcement for native type");
            return Ok(ty);
        }

        if self.matches(ty, desc) {
            // Same shape; refresh what does not affect accessors.
            let existing = self.slot_mut(ty)?;
            existing.type_version = desc.type_version;
            existing.type_size = desc.type_size;
            existing.variant_type = desc.variant_type;
            for (prop, prop_desc) in existing.properties.iter_mut().zip(&desc.properties) {
                prop.set_default_value(prop_desc.default_value.clone());
            }
            return self.parent_status(ty);
        }

        let mut entry = RegisteredType::from_descriptor(desc, TypeKind::Phantom)?;
        let existing = self.slot_mut(ty)?;
        entry.revision = existing.revision + 1;
        *existing = entry;
        self.revision += 1;
        self.link_parent(ty);
        info!(
            type_name = %desc.type_name,
            version = desc.type_version,
            revision = self.revision,
            "Phantom type updated"
        );
        self.parent_status(ty)
    }

    /// Structural equality between a registered type and a descriptor.
    ///
    /// Compares name, parent name, origin, flags (ignoring the phantom bit)
    /// and the ordered property list. Version and size are not compared.
    pub fn matches(&self, ty: TypeRef, desc: &ReflectedTypeDescriptor) -> bool {
        let Some(entry) = self.get(ty) else {
            return false;
        };
        if entry.name != desc.type_name {
            return false;
        }
        if entry.flags.difference(TypeFlags::PHANTOM) != desc.flags.difference(TypeFlags::PHANTOM)
        {
            return false;
        }
        if entry.parent_name != normalized_parent(desc) {
            return false;
        }
        if entry.plugin_name != desc.plugin_name {
            return false;
        }
        if entry.properties.len() != desc.properties.len() {
            return false;
        }
        entry
            .properties
            .iter()
            .zip(&desc.properties)
            .all(|(prop, prop_desc)| prop.matches_descriptor(prop_desc))
    }

    /// Whether `ty` is `base` or derives from it.
    pub fn is_derived_from(&self, ty: TypeRef, base: TypeRef) -> bool {
        self.ancestors(ty).contains(&base)
    }

    /// `ty` followed by its linked parents, nearest first.
    pub fn ancestors(&self, ty: TypeRef) -> Vec<TypeRef> {
        let mut chain = Vec::new();
        let mut current = self.get(ty).map(|_| ty);
        while let Some(t) = current {
            if chain.contains(&t) || chain.len() > self.types.len() {
                break;
            }
            chain.push(t);
            current = self.get(t).and_then(RegisteredType::parent);
        }
        chain
    }

    /// All properties of a type, inherited ones first.
    ///
    /// A property redeclared by a derived type replaces the inherited one
    /// at the inherited position.
    pub fn properties(&self, ty: TypeRef) -> Vec<&Property> {
        let mut props: Vec<&Property> = Vec::new();
        for t in self.ancestors(ty).into_iter().rev() {
            let Some(entry) = self.get(t) else { continue };
            for prop in &entry.properties {
                match props.iter().position(|p| p.name() == prop.name()) {
                    Some(i) => props[i] = prop,
                    None => props.push(prop),
                }
            }
        }
        props
    }

    /// Finds a property on a type or its ancestors.
    pub fn property(&self, ty: TypeRef, name: &str) -> Option<&Property> {
        self.ancestors(ty).into_iter().find_map(|t| {
            self.get(t)
                .and_then(|entry| entry.properties.iter().find(|p| p.name() == name))
        })
    }

    /// Properties whose values are stored on objects, in persisted order.
    pub fn stored_properties(&self, ty: TypeRef) -> Vec<&Property> {
        self.properties(ty)
            .into_iter()
            .filter(|p| p.holds_value())
            .collect()
    }

    /// Values a freshly created object of this type starts with: declared
    /// defaults where present and valid, zero values otherwise.
    pub fn initial_values(&self, ty: TypeRef) -> Vec<(String, Value)> {
        self.stored_properties(ty)
            .into_iter()
            .map(|prop| {
                let value = prop
                    .default_value()
                    .cloned()
                    .and_then(|v| prop.coerce(v).ok())
                    .unwrap_or_else(|| prop.zero_value());
                (prop.name().to_string(), value)
            })
            .collect()
    }

    /// Removes a phantom type. Native types cannot be removed.
    ///
    /// The slot stays reserved for the name: registering it again yields the
    /// same `TypeRef`, so objects still holding it resolve once more. Types
    /// deriving from it keep their parent name and are re-linked then.
    pub fn unregister_phantom(&mut self, name: &str) -> bool {
        let Some(ty) = self.find(name) else {
            return false;
        };
        if !self.get(ty).is_some_and(RegisteredType::is_phantom) {
            return false;
        }

        if let Some(entry) = self.types[ty.index()].take() {
            self.retired.insert(name.to_string(), (ty, entry.revision));
        }
        self.by_name.remove(name);
        for entry in self.types.iter_mut().flatten() {
            if entry.parent == Some(ty) {
                entry.parent = None;
            }
        }
        self.revision += 1;
        info!(type_name = %name, "Phantom type unregistered");
        true
    }

    /// Drops every phantom type, leaving native types in place.
    pub fn clear_phantoms(&mut self) -> usize {
        let names: Vec<String> = self
            .iter()
            .filter(|(_, t)| t.is_phantom())
            .map(|(_, t)| t.name.clone())
            .collect();
        names
            .iter()
            .filter(|name| self.unregister_phantom(name))
            .count()
    }

    fn slot_mut(&mut self, ty: TypeRef) -> RegistryResult<&mut RegisteredType> {
        self.types
            .get_mut(ty.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| RegistryError::UnknownType(ty.to_string()))
    }

    fn insert(&mut self, mut entry: RegisteredType) -> TypeRef {
        let name = entry.name.clone();
        let ty = match self.retired.remove(&name) {
            Some((ty, revision)) => {
                entry.revision = revision + 1;
                self.types[ty.index()] = Some(entry);
                debug!(type_name = %name, type_ref = %ty, "Reclaimed retired type slot");
                ty
            }
            None => {
                let ty = TypeRef(self.types.len() as u32);
                self.types.push(Some(entry));
                ty
            }
        };
        self.by_name.insert(name.clone(), ty);
        self.revision += 1;
        self.link_parent(ty);
        self.relink_children(&name, ty);
        ty
    }

    fn parent_status(&self, ty: TypeRef) -> RegistryResult<TypeRef> {
        match self.get(ty) {
            Some(entry) if entry.has_unresolved_parent() => {
                let parent = entry.parent_name.clone().unwrap_or_default();
                warn!(type_name = %entry.name, parent = %parent, "Parent type not registered yet");
                Err(RegistryError::UnresolvedParent {
                    type_ref: ty,
                    type_name: entry.name.clone(),
                    parent,
                })
            }
            Some(_) => Ok(ty),
            None => Err(RegistryError::UnknownType(ty.to_string())),
        }
    }

    fn link_parent(&mut self, ty: TypeRef) {
        let Some(parent_name) = self.get(ty).and_then(|t| t.parent_name.clone()) else {
            if let Some(Some(entry)) = self.types.get_mut(ty.index()) {
                entry.parent = None;
            }
            return;
        };

        let parent = match self.find(&parent_name) {
            Some(p) if self.ancestors(p).contains(&ty) => {
                warn!(type_ref = %ty, parent = %parent_name, "Parent link would form a cycle");
                None
            }
            other => other,
        };
        if let Some(Some(entry)) = self.types.get_mut(ty.index()) {
            entry.parent = parent;
        }
    }

    fn relink_children(&mut self, name: &str, ty: TypeRef) {
        let waiting: Vec<TypeRef> = self
            .iter()
            .filter(|(t, entry)| {
                *t != ty && entry.parent.is_none() && entry.parent_name.as_deref() == Some(name)
            })
            .map(|(t, _)| t)
            .collect();
        for child in waiting {
            self.link_parent(child);
            debug!(child = %child, parent = %name, "Re-linked type to late parent");
        }
    }
}
