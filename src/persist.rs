//! Snapshot persistence for state containers.
//!
//! DESIGN
//! ======
//! Each container registers exactly one persistence observer at construction
//! (`attach`). After every change the observer projects the durable subset of
//! the state and writes it as `{"state": ..., "version": N}` under a fixed key.
//! `restore` reads the same envelope back once at startup.
//!
//! ERROR HANDLING
//! ==============
//! Storage and serialization failures are logged and swallowed. A container
//! whose storage is broken keeps working in memory; a snapshot that cannot be
//! decoded (or carries another version) is ignored and defaults are used.

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::observe::{Subscription, lock};
use crate::state::cell::StateCell;
use crate::storage::KeyValueStore;

#[cfg(test)]
#[path = "persist_test.rs"]
mod tests;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    state: T,
    version: u32,
}

/// Read the snapshot stored under `key`.
///
/// Returns `None` when nothing is stored, the storage read fails, the payload
/// is malformed, or the stored version differs from `version`.
pub fn restore<T: DeserializeOwned>(storage: &dyn KeyValueStore, key: &str, version: u32) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(%key, error = %e, "snapshot read failed; starting from defaults");
            return None;
        }
    };

    let envelope: Envelope<T> = match serde_json::from_str(&raw) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!(%key, error = %e, "snapshot is malformed; starting from defaults");
            return None;
        }
    };

    if envelope.version != version {
        tracing::warn!(%key, stored = envelope.version, expected = version, "snapshot version mismatch; ignoring");
        return None;
    }

    tracing::debug!(%key, "snapshot restored");
    Some(envelope.state)
}

/// Write `value` under `key`. Best effort: failures are logged, not returned.
pub fn save<T: Serialize>(storage: &dyn KeyValueStore, key: &str, version: u32, value: &T) {
    let raw = match serde_json::to_string(&Envelope { state: value, version }) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(%key, error = %e, "snapshot serialization failed");
            return;
        }
    };
    if let Err(e) = storage.set(key, &raw) {
        tracing::warn!(%key, error = %e, "snapshot write failed; continuing in memory");
    }
}

struct Writer<P> {
    /// Newest change accepted so far.
    seq: u64,
    pending: Option<P>,
    busy: bool,
}

/// Mirror every state change of `cell` into `storage`, writing only what
/// `project` extracts.
///
/// Writes for one key never overlap and never regress: a change older than
/// one already accepted is dropped, and a change arriving while another
/// thread is writing is handed to that thread, which writes it next.
pub(crate) fn attach<S, P, F>(
    cell: &StateCell<S>,
    storage: Arc<dyn KeyValueStore>,
    key: &'static str,
    version: u32,
    project: F,
) -> Subscription
where
    S: Clone + 'static,
    P: Serialize + Send + 'static,
    F: Fn(&S) -> P + Send + Sync + 'static,
{
    let writer = Mutex::new(Writer { seq: 0, pending: None, busy: false });
    cell.subscribe_stamped(move |seq, state| {
        let mut slot = lock(&writer);
        if seq <= slot.seq {
            tracing::trace!(%key, seq, newest = slot.seq, "dropping stale snapshot");
            return;
        }
        slot.seq = seq;
        slot.pending = Some(project(state));
        if slot.busy {
            return;
        }

        slot.busy = true;
        while let Some(next) = slot.pending.take() {
            drop(slot);
            save(storage.as_ref(), key, version, &next);
            slot = lock(&writer);
        }
        slot.busy = false;
    })
}
