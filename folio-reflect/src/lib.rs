//! Reflected type system for folio documents.
//!
//! - [`ReflectedTypeDescriptor`] / [`PropertyDescriptor`]: plain data
//!   describing a type, as exchanged with other processes
//! - [`TypeRegistry`]: native types plus the phantom mirror of types that
//!   have no implementation in this process
//! - [`Property`]: the closed set of property adapters
//! - [`TypeAccessor`] / [`TypeAccessorMut`]: type-checked reads and writes
//!   of an object's [`PropertyStore`]
//! - [`TypeAnnouncements`]: deferred application of announced descriptors

mod accessor;
mod announce;
pub mod builtin;
mod descriptor;
mod error;
mod property;
mod registry;

pub use accessor::{PropertyStore, TypeAccessor, TypeAccessorMut};
pub use announce::{AnnouncementReport, TypeAnnouncements, TypeAnnouncer};
pub use descriptor::{
    PropertyCategory, PropertyDescriptor, PropertyFlags, ReflectedTypeDescriptor, TypeFlags,
    VariantType,
};
pub use error::{RegistryError, RegistryResult};
pub use property::{
    ArrayProperty, ConstantProperty, FunctionProperty, MemberProperty, Property, SetProperty,
};
pub use registry::{
    read_registry, write_registry, RegisteredType, SharedTypeRegistry, TypeKind, TypeRef,
    TypeRegistry,
};
