//! Object graph for folio documents.
//!
//! - [`ObjectTree`]: arena of [`DocumentObject`]s under one implicit root;
//!   mechanism only, no policy
//! - [`ObjectManager`]: creates and destroys objects and gates every
//!   structural edit
//! - [`ObjectHooks`]: type-specific construction, teardown, and vetoes
//!   supplied by the surrounding system

mod error;
mod hooks;
mod manager;
mod object;
mod tree;

pub use error::{TreeError, TreeResult};
pub use hooks::{DefaultObjectHooks, HookContext, ObjectHooks};
pub use manager::ObjectManager;
pub use object::{DocumentObject, ObjectSubtree};
pub use tree::{DepthFirst, ObjectTree};
