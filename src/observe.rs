//! Synchronous observer registry and subscription handles.
//!
//! DESIGN
//! ======
//! State containers and host signals notify observers in registration order,
//! after their own locks are released. A `Subscription` unregisters its
//! observer when dropped, so whoever holds the handle owns the lifetime of the
//! registration.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

#[cfg(test)]
#[path = "observe_test.rs"]
mod tests;

/// Lock a mutex, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    entries: Vec<(u64, Observer<T>)>,
}

/// A list of callbacks interested in values of type `T`.
pub struct Observers<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T: 'static> Observers<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { registry: Arc::new(Mutex::new(Registry { next_id: 0, entries: Vec::new() })) }
    }

    /// Register `observer`; it stays registered until the returned handle drops.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = {
            let mut registry = lock(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, Arc::new(observer)));
            id
        };

        let registry: Weak<Mutex<Registry<T>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Call every registered observer with `value`.
    ///
    /// The registry lock is released before any observer runs, so observers may
    /// subscribe or unsubscribe re-entrantly.
    pub fn notify(&self, value: &T) {
        let observers: Vec<Observer<T>> = lock(&self.registry)
            .entries
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(value);
        }
    }
}

impl<T: 'static> Default for Observers<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for a registration; dropping it unregisters.
#[must_use = "dropping a Subscription immediately unregisters its observer"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub(crate) fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self { cancel: Some(Box::new(cancel)) }
    }

    /// Explicitly unregister. Equivalent to dropping the handle.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("active", &self.cancel.is_some()).finish()
    }
}
