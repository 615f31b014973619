//! Error types for documents.

use folio_object::TreeError;
use folio_reflect::RegistryError;
use folio_types::ObjectId;
use std::fmt;
use thiserror::Error;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors that can occur while editing, saving, or loading a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The persisted form is structurally invalid.
    #[error("malformed document: {0}")]
    Format(String),

    /// The environment the document runs in is incomplete, e.g. a required
    /// type is not registered.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Records that could not be placed in the graph during load.
    #[error("{} unresolved record(s) in document", .0.len())]
    UnresolvedReferences(Vec<UnresolvedRecord>),

    /// The object manager refused the edit.
    #[error("edit rejected: {0}")]
    PolicyViolation(String),

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,
}

/// A persisted record the loader could not place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRecord {
    pub id: ObjectId,
    pub type_name: String,
    pub parent: Option<ObjectId>,
    pub reason: UnresolvedReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// No type of this name is registered.
    UnknownType,
    /// The record carries the nil ID.
    InvalidId,
    /// Another record already uses this ID.
    DuplicateId,
    /// The object manager refused to create or attach the object.
    Refused,
    /// The parent ID does not belong to any loadable record.
    MissingParent(ObjectId),
    /// The parent exists but never connects to the root (a parent cycle, or
    /// an ancestor that is itself unresolved).
    UnreachableParent(ObjectId),
}

impl fmt::Display for UnresolvedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): ", self.id, self.type_name)?;
        match &self.reason {
            UnresolvedReason::UnknownType => write!(f, "unknown type"),
            UnresolvedReason::InvalidId => write!(f, "nil id"),
            UnresolvedReason::DuplicateId => write!(f, "duplicate id"),
            UnresolvedReason::Refused => write!(f, "refused by the object manager"),
            UnresolvedReason::MissingParent(p) => write!(f, "parent {p} not found"),
            UnresolvedReason::UnreachableParent(p) => {
                write!(f, "parent {p} is not connected to the root")
            }
        }
    }
}
