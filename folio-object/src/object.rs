//! Graph nodes and detached subtrees.

use folio_reflect::{PropertyStore, TypeAccessor, TypeAccessorMut, TypeRef, TypeRegistry};
use folio_types::ObjectId;

/// A node of the object graph.
///
/// Parent and children are stored as IDs; the [`ObjectTree`](crate::ObjectTree)
/// arena owns every node, so no node owns another.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentObject {
    pub(crate) id: ObjectId,
    type_ref: TypeRef,
    pub(crate) parent: Option<ObjectId>,
    pub(crate) children: Vec<ObjectId>,
    properties: PropertyStore,
}

impl DocumentObject {
    /// Creates an unidentified object of the given type.
    ///
    /// The [`ObjectManager`](crate::ObjectManager) assigns the ID when it
    /// hands the object out.
    pub fn new(type_ref: TypeRef) -> Self {
        Self::with_properties(type_ref, PropertyStore::new())
    }

    /// Creates an unidentified object with initial property values.
    pub fn with_properties(type_ref: TypeRef, properties: PropertyStore) -> Self {
        Self {
            id: ObjectId::nil(),
            type_ref,
            parent: None,
            children: Vec::new(),
            properties,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn type_ref(&self) -> TypeRef {
        self.type_ref
    }

    /// The parent's ID; `None` for objects directly under the root.
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_root(&self) -> bool {
        self.id.is_nil()
    }

    /// Raw property values. Prefer [`accessor`](Self::accessor) for typed reads.
    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }

    /// Typed read access through the object's current type.
    pub fn accessor<'a>(&'a self, registry: &'a TypeRegistry) -> TypeAccessor<'a> {
        TypeAccessor::new(registry, self.type_ref, &self.properties)
    }

    /// Typed write access through the object's current type.
    pub fn accessor_mut<'a>(&'a mut self, registry: &'a TypeRegistry) -> TypeAccessorMut<'a> {
        TypeAccessorMut::new(registry, self.type_ref, &mut self.properties)
    }
}

/// An object detached from a graph, together with its descendants.
///
/// Removing an object from the graph yields its subtree; the subtree must
/// either be re-inserted or handed to the manager for destruction.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSubtree {
    pub(crate) object: DocumentObject,
    pub(crate) children: Vec<ObjectSubtree>,
}

impl ObjectSubtree {
    pub fn id(&self) -> ObjectId {
        self.object.id
    }

    pub fn object(&self) -> &DocumentObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut DocumentObject {
        &mut self.object
    }

    pub fn children(&self) -> &[ObjectSubtree] {
        &self.children
    }

    /// Number of objects in the subtree, its root included.
    pub fn object_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ObjectSubtree::object_count)
            .sum::<usize>()
    }

    /// IDs of all objects in pre-order.
    pub fn ids(&self) -> Vec<ObjectId> {
        let mut ids = Vec::with_capacity(self.object_count());
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut Vec<ObjectId>) {
        ids.push(self.object.id);
        for child in &self.children {
            child.collect_ids(ids);
        }
    }

    /// Splits the subtree into its root object and child subtrees.
    pub fn into_parts(self) -> (DocumentObject, Vec<ObjectSubtree>) {
        (self.object, self.children)
    }
}

impl From<DocumentObject> for ObjectSubtree {
    fn from(mut object: DocumentObject) -> Self {
        object.parent = None;
        object.children.clear();
        Self {
            object,
            children: Vec::new(),
        }
    }
}
