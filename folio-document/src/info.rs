//! The document's header record.

use crate::error::{DocumentError, DocumentResult};
use folio_object::{DocumentObject, ObjectManager};
use folio_reflect::{builtin, TypeRegistry};
use folio_types::DocumentId;
use serde_json::Value;

/// Reflected metadata persisted in a document's header.
#[derive(Debug)]
pub struct DocumentInfo {
    object: DocumentObject,
}

impl DocumentInfo {
    /// Creates the info object for a new document with a fresh ID.
    pub(crate) fn create(manager: &ObjectManager, registry: &TypeRegistry) -> DocumentResult<Self> {
        let ty = registry.find(builtin::DOCUMENT_INFO).ok_or_else(|| {
            DocumentError::Configuration(format!("type {} is not registered", builtin::DOCUMENT_INFO))
        })?;
        let mut object = manager.create(registry, ty, None).ok_or_else(|| {
            DocumentError::Configuration(format!(
                "object manager refused to create {}",
                builtin::DOCUMENT_INFO
            ))
        })?;
        object.accessor_mut(registry).restore(
            builtin::DOCUMENT_ID_PROPERTY,
            Value::String(DocumentId::new().to_string()),
        )?;
        Ok(Self { object })
    }

    pub fn object(&self) -> &DocumentObject {
        &self.object
    }

    /// The document's identifier; nil if the stored value is not a UUID.
    pub fn document_id(&self) -> DocumentId {
        self.object
            .properties()
            .get(builtin::DOCUMENT_ID_PROPERTY)
            .and_then(Value::as_str)
            .and_then(|s| DocumentId::parse(s).ok())
            .unwrap_or_else(DocumentId::nil)
    }

    /// Swaps in a freshly loaded info object, returning the previous one.
    pub(crate) fn replace_object(&mut self, object: DocumentObject) -> DocumentObject {
        std::mem::replace(&mut self.object, object)
    }

    /// Takes the info object out for destruction, leaving an empty one of
    /// the same type behind.
    pub(crate) fn take_object(&mut self) -> DocumentObject {
        let ty = self.object.type_ref();
        std::mem::replace(&mut self.object, DocumentObject::new(ty))
    }
}
