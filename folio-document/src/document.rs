//! A document: one object graph with its header, history, persistence, and
//! notifications.

use crate::error::{DocumentError, DocumentResult, UnresolvedReason, UnresolvedRecord};
use crate::events::{DocumentEvent, DocumentEventKind, DocumentListeners};
use crate::format::{DocumentReader, DocumentWriter, ObjectRecord, PropertyRecord};
use crate::history::{Command, CommandHistory, Position};
use crate::info::DocumentInfo;
use crate::settings::DocumentSettings;
use crate::store::{DocumentStore, FsDocumentStore};
use folio_object::{DocumentObject, ObjectManager, ObjectSubtree, ObjectTree, TreeError};
use folio_reflect::{
    builtin, read_registry, RegistryError, SharedTypeRegistry, TypeAccessor,
    TypeAccessorMut, TypeRef, TypeRegistry,
};
use folio_types::{DocumentId, ObjectId};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An editable, persistent document.
///
/// The document is the sole owner of its graph and manager. Every edit,
/// undo, redo, and load passes through the manager's checks; every object
/// that leaves the document (removal dropped from history, replaced content
/// on load, the document itself being dropped) is destroyed through it.
///
/// The read-only flag is advisory: edits are not blocked here.
pub struct Document {
    path: PathBuf,
    registry: SharedTypeRegistry,
    manager: ObjectManager,
    tree: ObjectTree,
    info: DocumentInfo,
    history: CommandHistory,
    listeners: DocumentListeners,
    global_listeners: Arc<DocumentListeners>,
    store: Box<dyn DocumentStore>,
    settings: DocumentSettings,
    modified: bool,
    read_only: bool,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("path", &self.path)
            .field("document_id", &self.document_id())
            .field("objects", &self.tree.len())
            .field("modified", &self.modified)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Creates an empty, unmodified document that will be saved to `path`.
    ///
    /// Fails with a configuration error if the registry lacks the built-in
    /// document types.
    pub fn new(
        path: impl Into<PathBuf>,
        registry: SharedTypeRegistry,
        manager: ObjectManager,
        global_listeners: Arc<DocumentListeners>,
        settings: DocumentSettings,
    ) -> DocumentResult<Self> {
        let (tree, info) = {
            let reg = read_registry(&registry);
            let root = reg.find(builtin::DOCUMENT_ROOT).ok_or_else(|| {
                DocumentError::Configuration(format!(
                    "type {} is not registered",
                    builtin::DOCUMENT_ROOT
                ))
            })?;
            (ObjectTree::new(root), DocumentInfo::create(&manager, &reg)?)
        };

        let document = Self {
            path: path.into(),
            registry,
            manager,
            tree,
            info,
            history: CommandHistory::new(settings.undo_limit),
            listeners: DocumentListeners::new(),
            global_listeners,
            store: Box::new(FsDocumentStore),
            settings,
            modified: false,
            read_only: false,
        };
        debug!(document_id = %document.document_id(), path = ?document.path, "Document created");
        Ok(document)
    }

    /// Creates a document and loads it from `path`.
    pub fn open(
        path: impl Into<PathBuf>,
        registry: SharedTypeRegistry,
        manager: ObjectManager,
        global_listeners: Arc<DocumentListeners>,
        settings: DocumentSettings,
    ) -> DocumentResult<Self> {
        let mut document = Self::new(path, registry, manager, global_listeners, settings)?;
        document.load()?;
        Ok(document)
    }

    /// Replaces the storage backend.
    pub fn with_store(mut self, store: impl DocumentStore + 'static) -> Self {
        self.store = Box::new(store);
        self
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> &DocumentSettings {
        &self.settings
    }

    pub fn registry(&self) -> &SharedTypeRegistry {
        &self.registry
    }

    pub fn manager(&self) -> &ObjectManager {
        &self.manager
    }

    pub fn tree(&self) -> &ObjectTree {
        &self.tree
    }

    pub fn object(&self, id: ObjectId) -> Option<&DocumentObject> {
        self.tree.get(id)
    }

    pub fn document_info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn document_id(&self) -> DocumentId {
        self.info.document_id()
    }

    /// Listeners for this document only.
    pub fn listeners(&self) -> &DocumentListeners {
        &self.listeners
    }

    pub fn global_listeners(&self) -> &Arc<DocumentListeners> {
        &self.global_listeners
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Reads one property of an object.
    pub fn property(&self, id: ObjectId, name: &str) -> DocumentResult<Value> {
        self.accessor(id, |accessor| accessor.get(name))?
            .map_err(DocumentError::from)
    }

    /// Runs `f` with typed read access to an object's properties.
    pub fn accessor<R>(
        &self,
        id: ObjectId,
        f: impl FnOnce(TypeAccessor<'_>) -> R,
    ) -> DocumentResult<R> {
        let object = self.tree.get(id).ok_or(DocumentError::ObjectNotFound(id))?;
        let reg = read_registry(&self.registry);
        Ok(f(object.accessor(&reg)))
    }

    /// Names of the types users may add to this document.
    pub fn creatable_types(&self) -> Vec<String> {
        let reg = read_registry(&self.registry);
        self.manager
            .creatable_types(&reg)
            .into_iter()
            .filter_map(|ty| reg.type_name(ty).map(str::to_string))
            .collect()
    }

    // ── State flags & notifications ──────────────────────────────

    /// Sets the modified flag, notifying listeners only on change.
    pub fn set_modified(&mut self, modified: bool) {
        if self.modified == modified {
            return;
        }
        self.modified = modified;
        self.emit(DocumentEventKind::ModifiedChanged(modified));
    }

    /// Sets the read-only flag, notifying listeners only on change.
    pub fn set_read_only(&mut self, read_only: bool) {
        if self.read_only == read_only {
            return;
        }
        self.read_only = read_only;
        self.emit(DocumentEventKind::ReadOnlyChanged(read_only));
    }

    /// Asks views to bring this document into view.
    pub fn ensure_visible(&self) {
        self.emit(DocumentEventKind::EnsureVisible);
    }

    /// Asks views to persist their per-document state.
    pub fn broadcast_save_meta_state(&self) {
        self.emit(DocumentEventKind::SaveMetaState);
    }

    fn emit(&self, kind: DocumentEventKind) {
        let event = DocumentEvent {
            document: self.document_id(),
            kind,
        };
        self.listeners.broadcast(&event);
        self.global_listeners.broadcast(&event);
    }

    // ── Editing ──────────────────────────────────────────────────

    /// Creates an object of the named type under `parent` (`None` = root)
    /// before child position `index` (`None` appends).
    pub fn add_object(
        &mut self,
        type_name: &str,
        parent: Option<ObjectId>,
        index: Option<usize>,
    ) -> DocumentResult<ObjectId> {
        let registry = Arc::clone(&self.registry);
        let (id, command) = {
            let reg = read_registry(&registry);
            let ty = reg
                .find(type_name)
                .ok_or_else(|| RegistryError::UnknownType(type_name.to_string()))?;
            let parent = parent.filter(ObjectId::is_valid);
            let parent_obj = self.lookup(parent)?;
            let count = parent_obj.unwrap_or_else(|| self.tree.root()).child_count();
            let at = index.unwrap_or(count);
            if at > count {
                return Err(DocumentError::PolicyViolation(format!(
                    "index {at} is past the end of {count} children"
                )));
            }
            if !self.manager.can_add(&self.tree, &reg, ty, parent_obj) {
                return Err(rejected(format!("cannot add {type_name} here")));
            }
            let object = self
                .manager
                .create(&reg, ty, None)
                .ok_or_else(|| rejected(format!("cannot create {type_name}")))?;
            let id = object.id();
            self.tree.add(object, parent, Some(at))?;
            debug!(object_id = %id, type_name = %type_name, "Added object");
            let command = Command::Add {
                id,
                at: Position { parent, index: at },
                detached: None,
            };
            (id, command)
        };
        self.record(command);
        Ok(id)
    }

    /// Removes an object and its descendants.
    pub fn remove_object(&mut self, id: ObjectId) -> DocumentResult<()> {
        let registry = Arc::clone(&self.registry);
        let command = {
            let reg = read_registry(&registry);
            let at = self.position_of(id)?;
            let subtree = self.detach(&reg, id)?;
            debug!(object_id = %id, removed = subtree.object_count(), "Removed object");
            Command::Remove {
                id,
                at,
                detached: Some(subtree),
            }
        };
        self.record(command);
        Ok(())
    }

    /// Moves an object under `new_parent` (`None` = root) before child
    /// position `index` of that parent's current children (`None` appends).
    pub fn move_object(
        &mut self,
        id: ObjectId,
        new_parent: Option<ObjectId>,
        index: Option<usize>,
    ) -> DocumentResult<()> {
        let registry = Arc::clone(&self.registry);
        let command = {
            let reg = read_registry(&registry);
            let new_parent = new_parent.filter(ObjectId::is_valid);
            let object = self.tree.get(id).ok_or(DocumentError::ObjectNotFound(id))?;
            let parent_obj = self.lookup(new_parent)?;
            if !self
                .manager
                .can_move(&self.tree, &reg, object, parent_obj, index)
            {
                return Err(rejected(format!("cannot move {id} there")));
            }
            let from = self.position_of(id)?;
            self.tree.move_object(id, new_parent, index)?;
            let to = self.position_of(id)?;
            debug!(object_id = %id, parent = ?new_parent, index = to.index, "Moved object");
            Command::Move { id, from, to }
        };
        self.record(command);
        Ok(())
    }

    /// Writes a user-editable property. Writing the current value is a no-op.
    pub fn set_property(&mut self, id: ObjectId, name: &str, value: Value) -> DocumentResult<()> {
        let registry = Arc::clone(&self.registry);
        let command = {
            let reg = read_registry(&registry);
            let object = self
                .tree
                .get_mut(id)
                .ok_or(DocumentError::ObjectNotFound(id))?;
            let mut accessor = object.accessor_mut(&reg);
            let before = accessor.set(name, value)?;
            let after = accessor.get(name)?;
            if before == after {
                return Ok(());
            }
            debug!(object_id = %id, property = %name, "Set property");
            Command::SetProperty {
                id,
                name: name.to_string(),
                before,
                after,
            }
        };
        self.record(command);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Reverts the most recent edit.
    ///
    /// If the manager refuses the reversal the edit stays on the undo stack.
    /// An edit the current type shape can no longer express is discarded.
    pub fn undo(&mut self) -> DocumentResult<()> {
        let mut command = self.history.take_undo().ok_or(DocumentError::NothingToUndo)?;
        match self.revert(&mut command) {
            Ok(()) => {
                self.history.push_undone(command);
                self.set_modified(true);
                Ok(())
            }
            Err(e @ DocumentError::Registry(_)) => {
                warn!(error = %e, "Discarding edit that can no longer be undone");
                self.destroy_released(command.into_detached().into_iter().collect());
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Undo rejected");
                self.history.restore_undo(command);
                Err(e)
            }
        }
    }

    /// Re-applies the most recently undone edit.
    pub fn redo(&mut self) -> DocumentResult<()> {
        let mut command = self.history.take_redo().ok_or(DocumentError::NothingToRedo)?;
        match self.apply(&mut command) {
            Ok(()) => {
                let released = self.history.push_done(command);
                self.destroy_released(released);
                self.set_modified(true);
                Ok(())
            }
            Err(e @ DocumentError::Registry(_)) => {
                warn!(error = %e, "Discarding edit that can no longer be redone");
                self.destroy_released(command.into_detached().into_iter().collect());
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Redo rejected");
                self.history.restore_redo(command);
                Err(e)
            }
        }
    }

    fn record(&mut self, command: Command) {
        let released = self.history.record(command);
        self.destroy_released(released);
        self.set_modified(true);
    }

    fn destroy_released(&self, released: Vec<ObjectSubtree>) {
        for subtree in released {
            self.manager.destroy(subtree);
        }
    }

    fn revert(&mut self, command: &mut Command) -> DocumentResult<()> {
        let registry = Arc::clone(&self.registry);
        let reg = read_registry(&registry);
        match command {
            Command::Add { id, detached, .. } => *detached = Some(self.detach(&reg, *id)?),
            Command::Remove { at, detached, .. } => self.reattach(&reg, detached, *at)?,
            Command::Move { id, from, .. } => self.relocate(&reg, *id, *from)?,
            Command::SetProperty { id, name, before, .. } => {
                self.restore_property(&reg, *id, name, before.clone())?
            }
        }
        Ok(())
    }

    fn apply(&mut self, command: &mut Command) -> DocumentResult<()> {
        let registry = Arc::clone(&self.registry);
        let reg = read_registry(&registry);
        match command {
            Command::Add { at, detached, .. } => self.reattach(&reg, detached, *at)?,
            Command::Remove { id, detached, .. } => *detached = Some(self.detach(&reg, *id)?),
            Command::Move { id, to, .. } => self.relocate(&reg, *id, *to)?,
            Command::SetProperty { id, name, after, .. } => {
                self.restore_property(&reg, *id, name, after.clone())?
            }
        }
        Ok(())
    }

    fn detach(&mut self, reg: &TypeRegistry, id: ObjectId) -> DocumentResult<ObjectSubtree> {
        let object = self.tree.get(id).ok_or(DocumentError::ObjectNotFound(id))?;
        if !self.manager.can_remove(&self.tree, reg, object) {
            return Err(rejected(format!("cannot remove {id}")));
        }
        Ok(self.tree.remove(id)?)
    }

    /// Puts a held subtree back at `at`. The subtree stays in `detached`
    /// unless the insert succeeds.
    fn reattach(
        &mut self,
        reg: &TypeRegistry,
        detached: &mut Option<ObjectSubtree>,
        at: Position,
    ) -> DocumentResult<()> {
        let subtree = detached.as_ref().ok_or_else(|| {
            TreeError::Integrity("history entry holds no detached objects".to_string())
        })?;
        let parent_obj = self.lookup(at.parent)?;
        let count = parent_obj.unwrap_or_else(|| self.tree.root()).child_count();
        if at.index > count {
            return Err(TreeError::Integrity(format!(
                "history index {} is past the end of {count} children",
                at.index
            ))
            .into());
        }
        if let Some(existing) = subtree.ids().into_iter().find(|id| self.tree.contains(*id)) {
            return Err(TreeError::DuplicateObject(existing).into());
        }
        let ty = subtree.object().type_ref();
        if !self.manager.can_add(&self.tree, reg, ty, parent_obj) {
            return Err(rejected(format!("cannot restore {}", subtree.id())));
        }
        if let Some(subtree) = detached.take() {
            self.tree.add_subtree(subtree, at.parent, Some(at.index))?;
        }
        Ok(())
    }

    /// Moves an object so that it ends up at exactly `to`.
    fn relocate(&mut self, reg: &TypeRegistry, id: ObjectId, to: Position) -> DocumentResult<()> {
        let current = self.position_of(id)?;
        // Indices passed to a move refer to the list before the object leaves it.
        let request = if current.parent == to.parent && current.index < to.index {
            to.index + 1
        } else {
            to.index
        };
        let object = self.tree.get(id).ok_or(DocumentError::ObjectNotFound(id))?;
        let parent_obj = self.lookup(to.parent)?;
        if !self
            .manager
            .can_move(&self.tree, reg, object, parent_obj, Some(request))
        {
            return Err(rejected(format!("cannot move {id} back")));
        }
        self.tree.move_object(id, to.parent, Some(request))?;
        Ok(())
    }

    fn restore_property(
        &mut self,
        reg: &TypeRegistry,
        id: ObjectId,
        name: &str,
        value: Value,
    ) -> DocumentResult<()> {
        let object = self
            .tree
            .get_mut(id)
            .ok_or(DocumentError::ObjectNotFound(id))?;
        object.accessor_mut(reg).restore(name, value)?;
        Ok(())
    }

    fn lookup(&self, parent: Option<ObjectId>) -> DocumentResult<Option<&DocumentObject>> {
        match parent.filter(ObjectId::is_valid) {
            Some(p) => self
                .tree
                .get(p)
                .map(Some)
                .ok_or(DocumentError::ObjectNotFound(p)),
            None => Ok(None),
        }
    }

    fn position_of(&self, id: ObjectId) -> DocumentResult<Position> {
        let object = self.tree.get(id).ok_or(DocumentError::ObjectNotFound(id))?;
        let index = self
            .tree
            .index_in_parent(id)
            .ok_or_else(|| TreeError::Integrity(format!("{id} is not among its parent's children")))?;
        Ok(Position {
            parent: object.parent(),
            index,
        })
    }

    // ── Persistence ──────────────────────────────────────────────

    /// Writes the document to its path.
    ///
    /// On success listeners receive `DocumentSaved`, then `ModifiedChanged`
    /// if the document was modified. `SaveMetaState` follows whether or not
    /// the write succeeded. A failed save leaves the modified flag alone.
    pub fn save(&mut self) -> DocumentResult<()> {
        let path = self.path.clone();
        self.save_to(path)
    }

    /// Writes the document to `path` and makes that its path.
    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> DocumentResult<()> {
        self.save_to(path.into())
    }

    fn save_to(&mut self, path: PathBuf) -> DocumentResult<()> {
        let result = self
            .encode()
            .and_then(|bytes| self.store.write(&path, &bytes).map_err(DocumentError::from));
        match &result {
            Ok(()) => {
                info!(
                    document_id = %self.document_id(),
                    path = ?path,
                    objects = self.tree.len(),
                    "Document saved"
                );
                self.path = path.clone();
                self.emit(DocumentEventKind::DocumentSaved(path));
                self.set_modified(false);
            }
            Err(e) => warn!(document_id = %self.document_id(), path = ?path, error = %e, "Failed to save document"),
        }
        self.broadcast_save_meta_state();
        result
    }

    /// Encodes the header and a pre-order walk of the graph.
    pub fn encode(&self) -> DocumentResult<Vec<u8>> {
        let reg = read_registry(&self.registry);
        let mut writer = DocumentWriter::new();

        writer.start_group(&self.settings.header_group)?;
        writer.write_object(&to_record(&reg, self.info.object())?)?;
        writer.end_group()?;

        writer.start_group(&self.settings.body_group)?;
        for object in self.tree.depth_first() {
            writer.write_object(&to_record(&reg, object)?)?;
        }
        writer.end_group()?;

        writer.finish(self.settings.pretty)
    }

    /// Replaces the document's content with what is stored at its path.
    ///
    /// Nothing changes unless every record can be placed. On success the
    /// history is cleared and the document is unmodified.
    pub fn load(&mut self) -> DocumentResult<()> {
        let bytes = self.store.read(&self.path)?;
        self.decode(&bytes)
    }

    /// Like [`load`](Self::load), from bytes already in memory.
    pub fn decode(&mut self, bytes: &[u8]) -> DocumentResult<()> {
        let mut reader = DocumentReader::parse(bytes)?;
        let registry = Arc::clone(&self.registry);
        let (info, tree) = {
            let reg = read_registry(&registry);
            let info = self.read_header(&reg, &mut reader)?;
            match self.read_body(&reg, &mut reader) {
                Ok(tree) => (info, tree),
                Err(e) => {
                    self.manager.destroy(ObjectSubtree::from(info));
                    return Err(e);
                }
            }
        };

        let mut previous = std::mem::replace(&mut self.tree, tree);
        self.manager.destroy_all(&mut previous);
        let released = self.history.clear();
        self.destroy_released(released);
        let replaced = self.info.replace_object(info);
        self.manager.destroy(ObjectSubtree::from(replaced));

        info!(
            document_id = %self.document_id(),
            path = ?self.path,
            objects = self.tree.len(),
            "Document loaded"
        );
        self.set_modified(false);
        Ok(())
    }

    /// Stages the header's info object under its persisted ID.
    fn read_header(
        &self,
        reg: &TypeRegistry,
        reader: &mut DocumentReader,
    ) -> DocumentResult<DocumentObject> {
        let info_ty = reg.find(builtin::DOCUMENT_INFO).ok_or_else(|| {
            DocumentError::Configuration(format!("type {} is not registered", builtin::DOCUMENT_INFO))
        })?;
        let group = &self.settings.header_group;
        if !reader.open_group(group)? {
            return Err(DocumentError::Format(format!("missing group {group:?}")));
        }

        let mut id = self.info.object().id();
        let mut values = self.info.object().properties().clone();
        while let Some(record) = reader.read_object()? {
            if record.type_name != builtin::DOCUMENT_INFO {
                warn!(type_name = %record.type_name, "Skipping unexpected header record");
                continue;
            }
            if record.id.is_valid() {
                id = record.id;
            }
            let mut accessor = TypeAccessorMut::new(reg, info_ty, &mut values);
            for property in record.properties {
                if let Err(e) = accessor.restore(&property.name, property.value) {
                    warn!(property = %property.name, error = %e, "Ignoring header property");
                }
            }
        }

        let mut object = self.manager.create(reg, info_ty, Some(id)).ok_or_else(|| {
            DocumentError::Configuration(format!(
                "object manager refused to create {}",
                builtin::DOCUMENT_INFO
            ))
        })?;
        *object.properties_mut() = values;
        Ok(object)
    }

    /// Builds a new graph from the body.
    ///
    /// Records may refer to parents that appear later in the stream. Objects
    /// are attached parent first, siblings in stream order.
    fn read_body(
        &self,
        reg: &TypeRegistry,
        reader: &mut DocumentReader,
    ) -> DocumentResult<ObjectTree> {
        let group = &self.settings.body_group;
        if !reader.open_group(group)? {
            return Err(DocumentError::Format(format!("missing group {group:?}")));
        }

        let mut unresolved = Vec::new();
        let mut records: Vec<(TypeRef, ObjectRecord)> = Vec::new();
        let mut ids = HashSet::new();
        while let Some(header) = reader.peek_next_object()? {
            let parent = header.parent.filter(ObjectId::is_valid);
            let reason = match reg.find(&header.type_name) {
                None => Some(UnresolvedReason::UnknownType),
                Some(_) if header.id.is_nil() => Some(UnresolvedReason::InvalidId),
                Some(_) if !ids.insert(header.id) => Some(UnresolvedReason::DuplicateId),
                Some(_) => None,
            };
            if let Some(reason) = reason {
                unresolved.push(UnresolvedRecord {
                    id: header.id,
                    type_name: header.type_name,
                    parent,
                    reason,
                });
                reader.skip_object();
                continue;
            }
            let Some(mut record) = reader.read_object()? else {
                break;
            };
            record.parent = parent;
            if let Some(ty) = reg.find(&record.type_name) {
                records.push((ty, record));
            }
        }

        let mut children: HashMap<Option<ObjectId>, Vec<usize>> = HashMap::new();
        for (i, (_, record)) in records.iter().enumerate() {
            children.entry(record.parent).or_default().push(i);
        }

        let mut staging = ObjectTree::new(self.tree.root().type_ref());
        let mut visited = vec![false; records.len()];
        let mut stack: Vec<usize> = children
            .get(&None)
            .map(|top| top.iter().rev().copied().collect())
            .unwrap_or_default();

        while let Some(i) = stack.pop() {
            visited[i] = true;
            let (ty, record) = &records[i];
            match self.materialize(reg, &staging, *ty, record) {
                Some(object) => {
                    if let Err(e) = staging.add(object, record.parent, None) {
                        warn!(object_id = %record.id, error = %e, "Failed to attach loaded object");
                        unresolved.push(unresolved_record(record, UnresolvedReason::Refused));
                        continue;
                    }
                }
                None => {
                    unresolved.push(unresolved_record(record, UnresolvedReason::Refused));
                    continue;
                }
            }
            if let Some(kids) = children.get(&Some(record.id)) {
                stack.extend(kids.iter().rev().copied());
            }
        }

        for (i, (_, record)) in records.iter().enumerate() {
            if visited[i] {
                continue;
            }
            let Some(parent) = record.parent else {
                continue;
            };
            let reason = if ids.contains(&parent) {
                UnresolvedReason::UnreachableParent(parent)
            } else {
                UnresolvedReason::MissingParent(parent)
            };
            unresolved.push(unresolved_record(record, reason));
        }

        if !unresolved.is_empty() {
            warn!(count = unresolved.len(), "Document has unresolved records; load aborted");
            self.manager.destroy_all(&mut staging);
            return Err(DocumentError::UnresolvedReferences(unresolved));
        }
        Ok(staging)
    }

    /// Creates a loaded object with its persisted ID and values, if the
    /// manager allows it under its persisted parent.
    fn materialize(
        &self,
        reg: &TypeRegistry,
        staging: &ObjectTree,
        ty: TypeRef,
        record: &ObjectRecord,
    ) -> Option<DocumentObject> {
        let parent = record.parent.and_then(|p| staging.get(p));
        if !self.manager.can_add(staging, reg, ty, parent) {
            return None;
        }
        let mut object = self.manager.create(reg, ty, Some(record.id))?;
        let mut accessor = object.accessor_mut(reg);
        for property in &record.properties {
            if let Err(e) = accessor.restore(&property.name, property.value.clone()) {
                warn!(
                    object_id = %record.id,
                    property = %property.name,
                    error = %e,
                    "Ignoring persisted property"
                );
            }
        }
        Some(object)
    }
}

impl Drop for Document {
    fn drop(&mut self) {
        self.manager.destroy_all(&mut self.tree);
        for subtree in self.history.clear() {
            self.manager.destroy(subtree);
        }
        let info = self.info.take_object();
        self.manager.destroy(ObjectSubtree::from(info));
    }
}

fn rejected(message: String) -> DocumentError {
    warn!(reason = %message, "Edit rejected");
    DocumentError::PolicyViolation(message)
}

fn to_record(reg: &TypeRegistry, object: &DocumentObject) -> DocumentResult<ObjectRecord> {
    let type_name = reg
        .type_name(object.type_ref())
        .ok_or_else(|| RegistryError::UnknownType(object.type_ref().to_string()))?;
    Ok(ObjectRecord {
        id: object.id(),
        type_name: type_name.to_string(),
        parent: object.parent(),
        properties: object
            .accessor(reg)
            .values()
            .into_iter()
            .map(|(name, value)| PropertyRecord { name, value })
            .collect(),
    })
}

fn unresolved_record(record: &ObjectRecord, reason: UnresolvedReason) -> UnresolvedRecord {
    UnresolvedRecord {
        id: record.id,
        type_name: record.type_name.clone(),
        parent: record.parent,
        reason,
    }
}
