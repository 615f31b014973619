//! Error types for the object graph.

use folio_types::ObjectId;
use thiserror::Error;

/// Result type for graph operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Mechanical failures of graph primitives.
///
/// Policy decisions (whether an edit is *allowed*) are made by the
/// [`ObjectManager`](crate::ObjectManager) and reported as booleans; these
/// errors only cover requests the graph cannot carry out at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// An object with this ID is already in the graph (or twice in the
    /// inserted subtree).
    #[error("object already exists: {0}")]
    DuplicateObject(ObjectId),

    /// The nil ID cannot be assigned to an object.
    #[error("objects cannot use the nil id")]
    InvalidId,

    /// No object with this ID is in the graph.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// The requested parent is not in the graph.
    #[error("parent not found: {0}")]
    ParentNotFound(ObjectId),

    /// The object would become its own ancestor.
    #[error("moving {object} under {parent} would create a cycle")]
    WouldCreateCycle { object: ObjectId, parent: ObjectId },

    /// The graph's parent/child links disagree with its index.
    #[error("graph integrity violated: {0}")]
    Integrity(String),
}
