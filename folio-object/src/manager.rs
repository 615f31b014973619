//! Edit policy for the object graph.
//!
//! Every structural edit, whether it comes from an API call, undo, redo, or
//! deserialization, is checked here before it reaches the graph.

use crate::hooks::{DefaultObjectHooks, HookContext, ObjectHooks};
use crate::object::{DocumentObject, ObjectSubtree};
use crate::tree::ObjectTree;
use folio_reflect::{TypeRef, TypeRegistry};
use folio_types::ObjectId;
use std::fmt;
use tracing::{debug, error, warn};

/// Creates and destroys objects and validates edits.
pub struct ObjectManager {
    hooks: Box<dyn ObjectHooks>,
}

impl Default for ObjectManager {
    fn default() -> Self {
        Self::new(DefaultObjectHooks)
    }
}

impl fmt::Debug for ObjectManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectManager").finish_non_exhaustive()
    }
}

impl ObjectManager {
    pub fn new(hooks: impl ObjectHooks + 'static) -> Self {
        Self {
            hooks: Box::new(hooks),
        }
    }

    pub fn hooks(&self) -> &dyn ObjectHooks {
        self.hooks.as_ref()
    }

    /// Creates a detached object of type `ty`.
    ///
    /// The object gets `requested_id` when that is a valid ID, a fresh one
    /// otherwise. Returns `None` when the hooks refuse the type.
    pub fn create(
        &self,
        registry: &TypeRegistry,
        ty: TypeRef,
        requested_id: Option<ObjectId>,
    ) -> Option<DocumentObject> {
        let Some(type_name) = registry.type_name(ty) else {
            warn!(type_ref = %ty, "Cannot create object of unknown type");
            return None;
        };
        let Some(mut object) = self.hooks.construct(registry, ty) else {
            debug!(type_name = %type_name, "Hooks refused to construct object");
            return None;
        };
        object.id = requested_id
            .filter(ObjectId::is_valid)
            .unwrap_or_else(ObjectId::new);
        object.parent = None;
        object.children.clear();
        debug!(object_id = %object.id, type_name = %type_name, "Object created");
        Some(object)
    }

    /// Destroys a detached subtree, children before their parent.
    pub fn destroy(&self, subtree: ObjectSubtree) {
        let (object, children) = subtree.into_parts();
        for child in children {
            self.destroy(child);
        }
        self.hooks.destroy(object);
    }

    /// Removes and destroys every object in the graph.
    pub fn destroy_all(&self, tree: &mut ObjectTree) {
        for subtree in tree.clear() {
            self.destroy(subtree);
        }
    }

    /// Types the hooks allow users to create.
    pub fn creatable_types(&self, registry: &TypeRegistry) -> Vec<TypeRef> {
        self.hooks.creatable_types(registry)
    }

    /// Whether an object of type `ty` may be added under `parent`.
    ///
    /// The root counts as "no parent". Any other parent must be the very
    /// object the graph holds under its ID.
    pub fn can_add(
        &self,
        tree: &ObjectTree,
        registry: &TypeRegistry,
        ty: TypeRef,
        parent: Option<&DocumentObject>,
    ) -> bool {
        let parent = match parent {
            Some(p) if tree.is_root(p) => None,
            Some(p) => match in_tree(tree, p) {
                Some(p) => Some(p),
                None => return false,
            },
            None => None,
        };
        self.hooks
            .can_add(HookContext { tree, registry }, ty, parent)
    }

    /// Whether `object` may be removed.
    pub fn can_remove(
        &self,
        tree: &ObjectTree,
        registry: &TypeRegistry,
        object: &DocumentObject,
    ) -> bool {
        if in_tree(tree, object).is_none() {
            return false;
        }
        self.hooks
            .can_remove(HookContext { tree, registry }, object)
    }

    /// Whether `object` may be moved under `new_parent` (`None` = root)
    /// before child position `index` (`None` = append).
    ///
    /// Rejects the move when either reference is stale or foreign, when the
    /// object would move onto itself or below one of its descendants, when
    /// the index is past the end, or when the move would not change the
    /// object's position. Only then do the hooks decide.
    pub fn can_move(
        &self,
        tree: &ObjectTree,
        registry: &TypeRegistry,
        object: &DocumentObject,
        new_parent: Option<&DocumentObject>,
        index: Option<usize>,
    ) -> bool {
        let new_parent = new_parent.unwrap_or_else(|| tree.root());

        if std::ptr::eq(object, new_parent) {
            return false;
        }
        if in_tree(tree, object).is_none() {
            return false;
        }
        let parent_is_root = tree.is_root(new_parent);
        if !parent_is_root && in_tree(tree, new_parent).is_none() {
            return false;
        }

        if !parent_is_root && tree.is_ancestor_of(object.id(), new_parent.id()) {
            return false;
        }

        let count = new_parent.child_count();
        let index = index.unwrap_or(count);
        if index > count {
            return false;
        }

        let new_parent_id = (!parent_is_root).then(|| new_parent.id());
        if object.parent() == new_parent_id {
            if let Some(current) = tree.index_in_parent(object.id()) {
                if index == current || index == current + 1 {
                    return false;
                }
            }
        }

        let new_parent = (!parent_is_root).then_some(new_parent);
        self.hooks
            .can_move(HookContext { tree, registry }, object, new_parent, index)
    }
}

/// Resolves `object` against the graph's index.
///
/// A reference that is not the object the graph holds under that ID means
/// the caller kept a stale or foreign object: that is a programming error,
/// fatal in debug builds and a rejection otherwise.
fn in_tree<'t>(tree: &'t ObjectTree, object: &DocumentObject) -> Option<&'t DocumentObject> {
    let indexed = tree.get(object.id())?;
    if !std::ptr::eq(indexed, object) {
        error!(object_id = %object.id(), "Tree corruption: reference does not match the graph");
        debug_assert!(false, "tree corruption: stale or foreign reference to {}", object.id());
        return None;
    }
    Some(indexed)
}
