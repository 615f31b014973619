//! Persistent, undoable documents.
//!
//! A [`Document`] owns one object graph plus the [`DocumentInfo`] header,
//! saves and loads both through a [`DocumentStore`], keeps an undo/redo
//! history of edits, and notifies [`DocumentListeners`] of state changes.

mod document;
mod error;
mod events;
pub mod format;
mod history;
mod info;
mod settings;
mod store;

pub use document::Document;
pub use error::{DocumentError, DocumentResult, UnresolvedReason, UnresolvedRecord};
pub use events::{DocumentEvent, DocumentEventKind, DocumentListeners, ListenerId};
pub use info::DocumentInfo;
pub use settings::DocumentSettings;
pub use store::{DocumentStore, FsDocumentStore};
