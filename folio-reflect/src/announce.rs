//! Queue for type announcements arriving out of band.
//!
//! Another process (or a plugin loader) pushes descriptors through a
//! [`TypeAnnouncer`] at any time. They are applied to a registry only when
//! its owner calls [`TypeAnnouncements::drain_into`], at a point where no
//! graph traversal is running.

use crate::descriptor::ReflectedTypeDescriptor;
use crate::error::{RegistryError, RegistryResult};
use crate::registry::{TypeRef, TypeRegistry};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::warn;

/// Sending half of the announcement queue.
#[derive(Debug, Clone)]
pub struct TypeAnnouncer {
    sender: Sender<ReflectedTypeDescriptor>,
}

impl TypeAnnouncer {
    /// Queues a descriptor.
    pub fn announce(&self, desc: ReflectedTypeDescriptor) -> RegistryResult<()> {
        self.sender
            .send(desc)
            .map_err(|_| RegistryError::ChannelClosed)
    }

    /// Queues a JSON-encoded descriptor.
    pub fn announce_json(&self, payload: &str) -> RegistryResult<()> {
        let desc: ReflectedTypeDescriptor = serde_json::from_str(payload)
            .map_err(|e| RegistryError::MalformedAnnouncement(e.to_string()))?;
        self.announce(desc)
    }
}

/// Outcome of applying queued announcements.
#[derive(Debug, Default)]
pub struct AnnouncementReport {
    /// Types registered or updated, in arrival order.
    pub applied: Vec<TypeRef>,
    /// Types that are registered but whose parent is still unknown after
    /// the whole batch was applied.
    pub unresolved_parents: Vec<(TypeRef, String)>,
    /// Descriptors that could not be mirrored at all.
    pub failures: Vec<(String, RegistryError)>,
}

impl AnnouncementReport {
    /// True when every announcement was mirrored with a linked parent.
    pub fn is_clean(&self) -> bool {
        self.unresolved_parents.is_empty() && self.failures.is_empty()
    }
}

/// Receiving half of the announcement queue.
#[derive(Debug)]
pub struct TypeAnnouncements {
    sender: Sender<ReflectedTypeDescriptor>,
    receiver: Receiver<ReflectedTypeDescriptor>,
}

impl Default for TypeAnnouncements {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeAnnouncements {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// Returns a handle that can be moved to the announcing side.
    pub fn announcer(&self) -> TypeAnnouncer {
        TypeAnnouncer {
            sender: self.sender.clone(),
        }
    }

    /// Applies every queued descriptor to `registry`.
    pub fn drain_into(&self, registry: &mut TypeRegistry) -> AnnouncementReport {
        let mut report = AnnouncementReport::default();

        for desc in self.receiver.try_iter() {
            match registry.register_or_update(&desc) {
                Ok(ty) => report.applied.push(ty),
                Err(RegistryError::UnresolvedParent { type_ref, .. }) => {
                    report.applied.push(type_ref);
                }
                Err(err) => {
                    warn!(type_name = %desc.type_name, error = %err, "Type announcement rejected");
                    report.failures.push((desc.type_name.clone(), err));
                }
            }
        }

        let mut seen = Vec::new();
        for &ty in &report.applied {
            if seen.contains(&ty) {
                continue;
            }
            seen.push(ty);
            if let Some(entry) = registry.get(ty) {
                if let Some(parent) = entry.parent_name().filter(|_| entry.has_unresolved_parent()) {
                    report.unresolved_parents.push((ty, parent.to_string()));
                }
            }
        }
        report
    }
}
