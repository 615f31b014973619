//! Type-specific construction, teardown, and edit predicates.

use crate::object::DocumentObject;
use crate::tree::ObjectTree;
use folio_reflect::{builtin, PropertyStore, TypeFlags, TypeRef, TypeRegistry};

/// What a hook can look at while deciding.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub tree: &'a ObjectTree,
    pub registry: &'a TypeRegistry,
}

/// Hooks supplied by the surrounding system for the types it manages.
///
/// Every method has a default, so an implementation only overrides what it
/// needs. The [`ObjectManager`](crate::ObjectManager) calls the `can_*`
/// predicates only after its own structural checks have passed; a hook
/// therefore has the final veto but never sees a structurally invalid edit.
pub trait ObjectHooks: Send + Sync {
    /// Builds a new, unidentified object of type `ty`.
    ///
    /// Returns `None` if objects of this type cannot be created. The default
    /// refuses abstract and unknown types and starts every stored property
    /// at its declared default (or zero value).
    fn construct(&self, registry: &TypeRegistry, ty: TypeRef) -> Option<DocumentObject> {
        let entry = registry.get(ty)?;
        if entry.is_abstract() {
            return None;
        }
        let values: PropertyStore = registry.initial_values(ty).into_iter().collect();
        Some(DocumentObject::with_properties(ty, values))
    }

    /// Releases an object. Children have already been destroyed.
    fn destroy(&self, object: DocumentObject) {
        let _ = object;
    }

    /// Whether an object of type `ty` may be added under `parent`
    /// (`None` = top level).
    fn can_add(&self, ctx: HookContext<'_>, ty: TypeRef, parent: Option<&DocumentObject>) -> bool {
        let _ = parent;
        ctx.registry.get(ty).is_some_and(|t| !t.is_abstract())
    }

    /// Whether `object` may be removed.
    fn can_remove(&self, ctx: HookContext<'_>, object: &DocumentObject) -> bool {
        let _ = (ctx, object);
        true
    }

    /// Whether `object` may be moved under `new_parent` at `index`.
    fn can_move(
        &self,
        ctx: HookContext<'_>,
        object: &DocumentObject,
        new_parent: Option<&DocumentObject>,
        index: usize,
    ) -> bool {
        let _ = (ctx, object, new_parent, index);
        true
    }

    /// Types a user may create through this manager.
    fn creatable_types(&self, registry: &TypeRegistry) -> Vec<TypeRef> {
        registry
            .iter()
            .filter(|(_, t)| {
                !t.is_abstract()
                    && !t.flags().contains(TypeFlags::STANDARD_TYPE)
                    && t.name() != builtin::DOCUMENT_INFO
            })
            .map(|(ty, _)| ty)
            .collect()
    }
}

/// Hooks with every default behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultObjectHooks;

impl ObjectHooks for DefaultObjectHooks {}
