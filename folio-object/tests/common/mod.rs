#![allow(dead_code)]

use folio_object::{DocumentObject, ObjectManager, ObjectTree};
use folio_reflect::{builtin, PropertyDescriptor, ReflectedTypeDescriptor, TypeRef, TypeRegistry};
use folio_types::ObjectId;

pub struct Fixture {
    pub registry: TypeRegistry,
    pub tree: ObjectTree,
    pub manager: ObjectManager,
    pub group: TypeRef,
}

/// Registry with a concrete `Group` type and an empty graph.
pub fn fixture() -> Fixture {
    fixture_with(ObjectManager::default())
}

pub fn fixture_with(manager: ObjectManager) -> Fixture {
    let mut registry = TypeRegistry::with_builtin_types();
    let group = registry
        .register_native(
            &ReflectedTypeDescriptor::new("Group")
                .with_property(PropertyDescriptor::member("label", builtin::STRING)),
        )
        .unwrap();
    let root = registry.find(builtin::DOCUMENT_ROOT).unwrap();
    Fixture {
        registry,
        tree: ObjectTree::new(root),
        manager,
        group,
    }
}

impl Fixture {
    pub fn create(&self) -> DocumentObject {
        self.manager.create(&self.registry, self.group, None).unwrap()
    }

    /// Creates a `Group` and appends it under `parent`.
    pub fn add(&mut self, parent: Option<ObjectId>) -> ObjectId {
        let object = self.create();
        let id = object.id();
        self.tree.add(object, parent, None).unwrap();
        id
    }
}
