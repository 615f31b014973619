//! Core identifier types for folio.
//!
//! Every object in a document graph and every document itself carries a
//! globally unique identifier. Identifiers are UUIDs so they stay stable
//! across save/load and can be exchanged with other processes without
//! coordination.
//!
//! The nil UUID is reserved: it names the implicit root of an object graph
//! and stands for "no identifier" in persisted records.

mod ids;

pub use ids::{DocumentId, ObjectId};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when handling identifiers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
