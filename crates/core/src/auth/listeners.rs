//! Listener bookkeeping for session change notifications.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use super::{SessionChange, SessionListener};

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<u64, SessionListener>,
}

/// Set of session listeners, called in registration order.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Mutex<Registry>>,
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. It stays registered until the returned
    /// subscription is dropped or unsubscribed.
    pub fn subscribe(&self, listener: SessionListener) -> Subscription {
        let mut registry = lock(&self.inner);
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, listener);

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers a change to every registered listener.
    ///
    /// Listeners are invoked outside the lock so they may subscribe or
    /// unsubscribe from within the callback.
    pub fn emit(&self, change: &SessionChange) {
        let listeners: Vec<SessionListener> =
            lock(&self.inner).listeners.values().cloned().collect();

        for listener in listeners {
            listener(change);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Handle to a registered listener.
#[must_use = "dropping a subscription unsubscribes the listener"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Removes the listener. Equivalent to dropping the handle.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).listeners.remove(&self.id);
        }
    }
}
