//! Document notifications.

use folio_types::DocumentId;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A notification about one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEvent {
    pub document: DocumentId,
    pub kind: DocumentEventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEventKind {
    /// The modified flag changed to the given value.
    ModifiedChanged(bool),
    /// The read-only flag changed to the given value.
    ReadOnlyChanged(bool),
    /// The document was written to the given path.
    DocumentSaved(PathBuf),
    /// Views should bring the document into view.
    EnsureVisible,
    /// Views should persist their per-document state.
    SaveMetaState,
}

/// Handle returned by [`DocumentListeners::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&DocumentEvent) + Send + Sync>;

/// An ordered list of event listeners.
///
/// Each document owns one list; the list shared by all documents is passed
/// to every [`Document`](crate::Document) when it is constructed.
#[derive(Default)]
pub struct DocumentListeners {
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for DocumentListeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentListeners")
            .field("len", &self.len())
            .finish()
    }
}

impl DocumentListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list meant to be shared between documents.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Adds a listener after all existing ones.
    pub fn subscribe(&self, listener: impl Fn(&DocumentEvent) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns false if it was not subscribed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Delivers an event to every listener in subscription order.
    ///
    /// Listeners run without the list locked, so they may subscribe or
    /// unsubscribe; such changes take effect from the next event.
    pub fn broadcast(&self, event: &DocumentEvent) {
        let snapshot: Vec<Listener> = self.lock().iter().map(|(_, l)| Arc::clone(l)).collect();
        for listener in snapshot {
            listener(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
