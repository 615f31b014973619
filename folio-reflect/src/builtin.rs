//! Native types every registry knows about.

use crate::descriptor::{PropertyDescriptor, ReflectedTypeDescriptor, TypeFlags, VariantType};
use serde_json::Value;

pub const BOOL: &str = "bool";
pub const I32: &str = "i32";
pub const I64: &str = "i64";
pub const U32: &str = "u32";
pub const U64: &str = "u64";
pub const F32: &str = "f32";
pub const F64: &str = "f64";
pub const STRING: &str = "String";
pub const UUID: &str = "Uuid";

/// Abstract type of the implicit graph root.
pub const DOCUMENT_ROOT: &str = "DocumentRoot";
/// Type of the record stored in a document's header.
pub const DOCUMENT_INFO: &str = "DocumentInfo";
/// The document identifier property of [`DOCUMENT_INFO`].
pub const DOCUMENT_ID_PROPERTY: &str = "DocumentID";

const PRIMITIVES: [(&str, VariantType, u32); 9] = [
    (BOOL, VariantType::Bool, 1),
    (I32, VariantType::Int32, 4),
    (I64, VariantType::Int64, 8),
    (U32, VariantType::UInt32, 4),
    (U64, VariantType::UInt64, 8),
    (F32, VariantType::Float, 4),
    (F64, VariantType::Double, 8),
    (STRING, VariantType::String, 24),
    (UUID, VariantType::Uuid, 16),
];

/// Descriptors for the built-in native types, parents before children.
pub fn native_descriptors() -> Vec<ReflectedTypeDescriptor> {
    let mut types: Vec<ReflectedTypeDescriptor> = PRIMITIVES
        .iter()
        .map(|(name, variant, size)| {
            ReflectedTypeDescriptor::new(*name)
                .with_plugin("builtin")
                .with_size(*size)
                .with_variant_type(*variant)
                .with_flags(TypeFlags::STANDARD_TYPE)
        })
        .collect();

    types.push(
        ReflectedTypeDescriptor::new(DOCUMENT_ROOT)
            .with_plugin("builtin")
            .with_variant_type(VariantType::Object)
            .with_flags(TypeFlags::CLASS | TypeFlags::ABSTRACT),
    );
    types.push(
        ReflectedTypeDescriptor::new(DOCUMENT_INFO)
            .with_plugin("builtin")
            .with_size(16)
            .with_variant_type(VariantType::Object)
            .with_property(PropertyDescriptor::member(DOCUMENT_ID_PROPERTY, UUID)),
    );
    types
}

/// Value of an unassigned member of the given type.
pub fn zero_value(type_name: &str) -> Value {
    match type_name {
        BOOL => Value::Bool(false),
        I32 | I64 | U32 | U64 => Value::from(0),
        F32 | F64 => Value::from(0.0),
        STRING => Value::String(String::new()),
        UUID => Value::String(uuid::Uuid::nil().to_string()),
        _ => Value::Null,
    }
}

/// Whether `value` can be stored in a member of `type_name`.
///
/// Non-primitive types are not checked.
pub fn value_fits(type_name: &str, value: &Value) -> bool {
    match type_name {
        BOOL => value.is_boolean(),
        I32 => value
            .as_i64()
            .is_some_and(|v| i32::try_from(v).is_ok()),
        I64 => value.as_i64().is_some(),
        U32 => value
            .as_u64()
            .is_some_and(|v| u32::try_from(v).is_ok()),
        U64 => value.as_u64().is_some(),
        F32 | F64 => value.is_number(),
        STRING => value.is_string(),
        UUID => value
            .as_str()
            .is_some_and(|s| uuid::Uuid::parse_str(s).is_ok()),
        _ => true,
    }
}

/// Short name of a JSON value's kind, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
