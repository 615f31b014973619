#![allow(dead_code)]

use folio_document::{
    Document, DocumentEvent, DocumentEventKind, DocumentListeners, DocumentSettings, DocumentStore,
};
use folio_object::{DocumentObject, ObjectHooks, ObjectManager};
use folio_reflect::{
    builtin, PropertyDescriptor, PropertyFlags, ReflectedTypeDescriptor, SharedTypeRegistry,
    TypeRegistry,
};
use folio_types::ObjectId;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Built-in types plus `Group` and `Note`.
pub fn registry() -> SharedTypeRegistry {
    let mut reg = TypeRegistry::with_builtin_types();
    reg.register_native(
        &ReflectedTypeDescriptor::new("Group")
            .with_property(PropertyDescriptor::member("label", builtin::STRING))
            .with_property(PropertyDescriptor::member("count", builtin::I32))
            .with_property(PropertyDescriptor::set("tags", builtin::STRING))
            .with_property(PropertyDescriptor::constant("kind", builtin::STRING, json!("group")))
            .with_property(
                PropertyDescriptor::member("locked", builtin::BOOL)
                    .with_flags(PropertyFlags::READ_ONLY),
            ),
    )
    .unwrap();
    reg.register_native(
        &ReflectedTypeDescriptor::new("Note")
            .with_property(PropertyDescriptor::member("text", builtin::STRING)),
    )
    .unwrap();
    reg.into_shared()
}

pub fn document_at(path: impl Into<PathBuf>) -> Document {
    Document::new(
        path,
        registry(),
        ObjectManager::default(),
        DocumentListeners::shared(),
        DocumentSettings::default(),
    )
    .unwrap()
}

pub fn document() -> Document {
    document_at("unsaved.folio").with_store(MemoryStore::default())
}

/// Parent, children, and property values of every object, keyed by ID.
pub fn snapshot(doc: &Document) -> HashMap<ObjectId, (String, Option<ObjectId>, Vec<ObjectId>, Vec<(String, Value)>)> {
    let reg = folio_reflect::read_registry(doc.registry());
    doc.tree()
        .depth_first()
        .map(|o| {
            (
                o.id(),
                (
                    reg.type_name(o.type_ref()).unwrap().to_string(),
                    o.parent(),
                    o.children().to_vec(),
                    o.accessor(&reg).values(),
                ),
            )
        })
        .collect()
}

pub fn top_level(doc: &Document) -> Vec<ObjectId> {
    doc.tree().root().children().to_vec()
}

pub fn children(doc: &Document, id: ObjectId) -> Vec<ObjectId> {
    doc.object(id).unwrap().children().to_vec()
}

// ── Stores ───────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MemoryStore {
    pub files: Arc<Mutex<HashMap<PathBuf, Vec<u8>>>>,
}

impl MemoryStore {
    pub fn put(&self, path: impl Into<PathBuf>, value: &Value) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), serde_json::to_vec(value).unwrap());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Value> {
        self.files
            .lock()
            .unwrap()
            .get(path.as_ref())
            .map(|bytes| serde_json::from_slice(bytes).unwrap())
    }
}

impl DocumentStore for MemoryStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such document"))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}

pub struct FailingStore;

impl DocumentStore for FailingStore {
    fn read(&self, _path: &Path) -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "read denied"))
    }

    fn write(&self, _path: &Path, _bytes: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "write denied"))
    }
}

// ── Event & hook recorders ───────────────────────────────────────

/// Records `(audience, event kind)` pairs from both listener lists.
pub fn record_events(doc: &Document) -> Arc<Mutex<Vec<(&'static str, DocumentEventKind)>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let local = Arc::clone(&events);
    doc.listeners()
        .subscribe(move |e: &DocumentEvent| local.lock().unwrap().push(("document", e.kind.clone())));
    let global = Arc::clone(&events);
    doc.global_listeners()
        .subscribe(move |e: &DocumentEvent| global.lock().unwrap().push(("global", e.kind.clone())));
    events
}

/// Hooks that count destroyed objects.
#[derive(Clone, Default)]
pub struct CountingHooks {
    pub destroyed: Arc<Mutex<Vec<ObjectId>>>,
}

impl ObjectHooks for CountingHooks {
    fn destroy(&self, object: DocumentObject) {
        self.destroyed.lock().unwrap().push(object.id());
    }
}

pub fn counting_document() -> (Document, CountingHooks) {
    let hooks = CountingHooks::default();
    let doc = Document::new(
        "counted.folio",
        registry(),
        ObjectManager::new(hooks.clone()),
        DocumentListeners::shared(),
        DocumentSettings::default(),
    )
    .unwrap()
    .with_store(MemoryStore::default());
    (doc, hooks)
}
