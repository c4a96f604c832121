//! Mutex-guarded state value with change notification.
//!
//! Every container keeps its fields in a `StateCell`. Mutations run under the
//! lock; observers are notified with a clone of the new value after the lock
//! is released, so an observer may read the container again without
//! deadlocking.
//!
//! Concurrent mutations may notify out of order. Each change carries a
//! sequence number assigned under the lock; observers that must not regress
//! (persistence) subscribe with `subscribe_stamped` and compare it.

use std::sync::Mutex;

use crate::observe::{Observers, Subscription, lock};

struct Stamped<S> {
    seq: u64,
    value: S,
}

pub(crate) struct StateCell<S> {
    state: Mutex<Stamped<S>>,
    observers: Observers<Stamped<S>>,
}

impl<S: Clone + 'static> StateCell<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self { state: Mutex::new(Stamped { seq: 0, value: initial }), observers: Observers::new() }
    }

    pub(crate) fn get(&self) -> S {
        lock(&self.state).value.clone()
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&lock(&self.state).value)
    }

    /// Mutate and always notify.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let (result, next) = {
            let mut state = lock(&self.state);
            let result = f(&mut state.value);
            state.seq += 1;
            (result, Stamped { seq: state.seq, value: state.value.clone() })
        };
        self.observers.notify(&next);
        result
    }

    /// Mutate and notify only when `f` returns `Some`.
    ///
    /// `f` must leave the state untouched when it returns `None`.
    pub(crate) fn try_update<R>(&self, f: impl FnOnce(&mut S) -> Option<R>) -> Option<R> {
        let (result, next) = {
            let mut state = lock(&self.state);
            let result = f(&mut state.value)?;
            state.seq += 1;
            (result, Stamped { seq: state.seq, value: state.value.clone() })
        };
        self.observers.notify(&next);
        Some(result)
    }

    pub(crate) fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&S) + Send + Sync + 'static,
    {
        self.observers.subscribe(move |stamped: &Stamped<S>| observer(&stamped.value))
    }

    /// Like `subscribe`, but also passes the change's sequence number.
    pub(crate) fn subscribe_stamped<F>(&self, observer: F) -> Subscription
    where
        F: Fn(u64, &S) + Send + Sync + 'static,
    {
        self.observers.subscribe(move |stamped: &Stamped<S>| observer(stamped.seq, &stamped.value))
    }
}
