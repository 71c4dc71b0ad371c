//! Copy-on-write entry sets

use std::sync::Arc;

use channels::ChannelHandle;
use contracts::{Computer, Identity};
use forwarders::ForwarderHandle;
use parking_lot::RwLock;

pub(crate) trait Registered {
    fn registered_identity(&self) -> Identity;
}

impl Registered for ChannelHandle {
    fn registered_identity(&self) -> Identity {
        self.identity().clone()
    }
}

impl Registered for ForwarderHandle {
    fn registered_identity(&self) -> Identity {
        self.identity().clone()
    }
}

impl Registered for dyn Computer {
    fn registered_identity(&self) -> Identity {
        self.descriptor().identity()
    }
}

/// Readers clone the `Arc` and iterate without holding the lock; writers
/// publish a whole new vector.
pub(crate) struct Collection<T: ?Sized> {
    name: &'static str,
    entries: RwLock<Arc<Vec<Arc<T>>>>,
}

impl<T: ?Sized + Registered> Collection<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RwLock::new(Arc::new(Vec::new())),
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.entries.read().clone()
    }

    pub fn find(&self, identity: &Identity) -> Option<Arc<T>> {
        self.snapshot()
            .iter()
            .find(|e| &e.registered_identity() == identity)
            .cloned()
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.find(identity).is_some()
    }

    pub fn push(&self, entry: Arc<T>) {
        let mut next: Vec<Arc<T>> = self.snapshot().iter().cloned().collect();
        next.push(entry);
        self.publish(next);
    }

    pub fn remove(&self, identity: &Identity) -> Option<Arc<T>> {
        let current = self.snapshot();
        let index = current
            .iter()
            .position(|e| &e.registered_identity() == identity)?;
        let mut next: Vec<Arc<T>> = current.iter().cloned().collect();
        let removed = next.remove(index);
        self.publish(next);
        Some(removed)
    }

    /// Empty the set, returning what it held
    pub fn take(&self) -> Vec<Arc<T>> {
        let current = self.snapshot();
        self.publish(Vec::new());
        current.iter().cloned().collect()
    }

    fn publish(&self, entries: Vec<Arc<T>>) {
        metrics::gauge!("registry_entries", "collection" => self.name).set(entries.len() as f64);
        *self.entries.write() = Arc::new(entries);
    }
}
