//! The object graph.
//!
//! A flat arena of [`DocumentObject`]s keyed by ID plus one implicit root.
//! The primitives here perform the edits they are asked to and only refuse
//! requests that would leave the arena inconsistent; whether an edit is
//! allowed is decided by the [`ObjectManager`](crate::ObjectManager).

use crate::error::{TreeError, TreeResult};
use crate::object::{DocumentObject, ObjectSubtree};
use folio_reflect::TypeRef;
use folio_types::ObjectId;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Owner of every object reachable from the root.
#[derive(Debug, Clone)]
pub struct ObjectTree {
    root: DocumentObject,
    objects: HashMap<ObjectId, DocumentObject>,
}

impl ObjectTree {
    /// Creates an empty graph whose root has the given type.
    pub fn new(root_type: TypeRef) -> Self {
        Self {
            root: DocumentObject::new(root_type),
            objects: HashMap::new(),
        }
    }

    /// The implicit root. Its children are the top-level content.
    pub fn root(&self) -> &DocumentObject {
        &self.root
    }

    /// Looks up an object. The root is not indexed.
    pub fn get(&self, id: ObjectId) -> Option<&DocumentObject> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut DocumentObject> {
        self.objects.get_mut(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Number of objects, the root excluded.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Whether `object` is the root of this graph.
    pub fn is_root(&self, object: &DocumentObject) -> bool {
        std::ptr::eq(object, &self.root)
    }

    /// The parent of an object: another object, or the root for top-level
    /// objects. `None` if the object is not in the graph.
    pub fn parent_of(&self, id: ObjectId) -> Option<&DocumentObject> {
        let object = self.get(id)?;
        match object.parent {
            Some(parent) => self.get(parent),
            None => Some(&self.root),
        }
    }

    /// Position of an object in its parent's child list.
    pub fn index_in_parent(&self, id: ObjectId) -> Option<usize> {
        self.parent_of(id)?.children.iter().position(|c| *c == id)
    }

    /// Whether `ancestor` is `id` itself or lies on `id`'s parent chain.
    pub fn is_ancestor_of(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let mut current = Some(id);
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.get(cur).and_then(DocumentObject::parent);
        }
        false
    }

    /// Pre-order traversal starting at the root's children.
    pub fn depth_first(&self) -> DepthFirst<'_> {
        DepthFirst {
            tree: self,
            stack: self.root.children.iter().rev().copied().collect(),
        }
    }

    /// Inserts a single object. See [`add_subtree`](Self::add_subtree).
    pub fn add(
        &mut self,
        object: DocumentObject,
        parent: Option<ObjectId>,
        index: Option<usize>,
    ) -> TreeResult<()> {
        self.add_subtree(ObjectSubtree::from(object), parent, index)
    }

    /// Inserts a detached subtree under `parent` (`None` or the nil ID for
    /// the root) before child position `index` (`None` appends).
    ///
    /// Every ID in the subtree must be valid and unused. An index past the
    /// end is a caller bug: it panics in debug builds and appends otherwise.
    pub fn add_subtree(
        &mut self,
        subtree: ObjectSubtree,
        parent: Option<ObjectId>,
        index: Option<usize>,
    ) -> TreeResult<()> {
        let parent = parent.filter(|p| p.is_valid());
        if let Some(p) = parent {
            if !self.contains(p) {
                return Err(TreeError::ParentNotFound(p));
            }
        }

        let mut incoming = HashSet::new();
        for id in subtree.ids() {
            if id.is_nil() {
                return Err(TreeError::InvalidId);
            }
            if self.contains(id) || !incoming.insert(id) {
                return Err(TreeError::DuplicateObject(id));
            }
        }

        let id = subtree.id();
        let siblings = self.children_mut(parent);
        let count = siblings.len();
        let at = match index {
            None => count,
            Some(i) if i <= count => i,
            Some(i) => {
                debug_assert!(false, "child index {i} out of range 0..={count}");
                count
            }
        };
        siblings.insert(at, id);
        self.insert_recursive(subtree, parent);

        debug!(object_id = %id, parent = ?parent, index = at, "Object added");
        Ok(())
    }

    /// Detaches an object and its descendants from the graph.
    pub fn remove(&mut self, id: ObjectId) -> TreeResult<ObjectSubtree> {
        let parent = self
            .get(id)
            .ok_or(TreeError::ObjectNotFound(id))?
            .parent;
        self.children_mut(parent).retain(|c| *c != id);
        let subtree = self.extract(id)?;
        debug!(object_id = %id, removed = subtree.object_count(), "Object removed");
        Ok(subtree)
    }

    /// Moves an object to `new_parent` before child position `index`.
    ///
    /// `index` refers to the new parent's child list *before* the move, so
    /// moving within one parent to a later position accounts for the slot
    /// the object vacates. Cycles are refused.
    pub fn move_object(
        &mut self,
        id: ObjectId,
        new_parent: Option<ObjectId>,
        index: Option<usize>,
    ) -> TreeResult<()> {
        let new_parent = new_parent.filter(|p| p.is_valid());
        let old_parent = self.get(id).ok_or(TreeError::ObjectNotFound(id))?.parent;
        if let Some(p) = new_parent {
            if !self.contains(p) {
                return Err(TreeError::ParentNotFound(p));
            }
            if self.is_ancestor_of(id, p) {
                return Err(TreeError::WouldCreateCycle { object: id, parent: p });
            }
        }

        let old_siblings = self.children_mut(old_parent);
        let old_index = old_siblings.iter().position(|c| *c == id);
        old_siblings.retain(|c| *c != id);

        let siblings = self.children_mut(new_parent);
        let count = siblings.len();
        let mut at = index.unwrap_or(count);
        if old_parent == new_parent {
            if let Some(old) = old_index {
                if at > old {
                    at -= 1;
                }
            }
        }
        if at > count {
            debug_assert!(false, "child index {at} out of range 0..={count}");
            at = count;
        }
        siblings.insert(at, id);

        if let Some(object) = self.objects.get_mut(&id) {
            object.parent = new_parent;
        }
        debug!(object_id = %id, parent = ?new_parent, index = at, "Object moved");
        Ok(())
    }

    /// Detaches all top-level objects, leaving only the root.
    pub fn clear(&mut self) -> Vec<ObjectSubtree> {
        let top_level: Vec<ObjectId> = self.root.children.clone();
        top_level
            .into_iter()
            .filter_map(|id| self.remove(id).ok())
            .collect()
    }

    /// Verifies that the index and the parent/child links agree: every
    /// indexed object is reachable from the root exactly once, and every
    /// reachable object is indexed with a matching parent link.
    pub fn check_integrity(&self) -> TreeResult<()> {
        let mut visited = HashSet::new();
        let mut stack: Vec<(Option<ObjectId>, ObjectId)> =
            self.root.children.iter().map(|c| (None, *c)).collect();

        while let Some((expected_parent, id)) = stack.pop() {
            let object = self
                .get(id)
                .ok_or_else(|| TreeError::Integrity(format!("{id} is linked but not indexed")))?;
            if !visited.insert(id) {
                return Err(TreeError::Integrity(format!("{id} is reachable more than once")));
            }
            if object.parent != expected_parent {
                return Err(TreeError::Integrity(format!(
                    "{id} records parent {:?} but is a child of {:?}",
                    object.parent, expected_parent
                )));
            }
            stack.extend(object.children.iter().map(|c| (Some(id), *c)));
        }

        if visited.len() != self.objects.len() {
            return Err(TreeError::Integrity(format!(
                "{} indexed objects are not reachable from the root",
                self.objects.len() - visited.len()
            )));
        }
        Ok(())
    }

    fn children_mut(&mut self, parent: Option<ObjectId>) -> &mut Vec<ObjectId> {
        match parent.and_then(|p| self.objects.get_mut(&p)) {
            Some(object) => &mut object.children,
            None => &mut self.root.children,
        }
    }

    fn insert_recursive(&mut self, subtree: ObjectSubtree, parent: Option<ObjectId>) {
        let (mut object, children) = subtree.into_parts();
        let id = object.id;
        object.parent = parent;
        object.children = children.iter().map(ObjectSubtree::id).collect();
        self.objects.insert(id, object);
        for child in children {
            self.insert_recursive(child, Some(id));
        }
    }

    fn extract(&mut self, id: ObjectId) -> TreeResult<ObjectSubtree> {
        let mut object = self
            .objects
            .remove(&id)
            .ok_or(TreeError::ObjectNotFound(id))?;
        object.parent = None;
        let children = object
            .children
            .clone()
            .into_iter()
            .map(|child| self.extract(child))
            .collect::<TreeResult<Vec<_>>>()?;
        Ok(ObjectSubtree { object, children })
    }
}

/// Pre-order iterator over a graph. See [`ObjectTree::depth_first`].
#[derive(Debug)]
pub struct DepthFirst<'a> {
    tree: &'a ObjectTree,
    stack: Vec<ObjectId>,
}

impl<'a> Iterator for DepthFirst<'a> {
    type Item = &'a DocumentObject;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            if let Some(object) = self.tree.get(id) {
                self.stack.extend(object.children.iter().rev().copied());
                return Some(object);
            }
        }
        None
    }
}
