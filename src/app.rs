//! Process-wide context: the containers and host collaborators, built once.
//!
//! DESIGN
//! ======
//! Nothing in the crate is a global. The host constructs one `AppContext` at
//! startup and passes it (or clones of its handles) to every consumer, which
//! keeps container lifetime explicit and lets tests build isolated contexts.

use std::sync::Arc;

use crate::auth::{CredentialExchange, MockCredentialExchange};
use crate::config::ConsoleConfig;
use crate::host::{DocumentRoot, HostAppearance};
use crate::state::{PreferenceStore, SessionStore, TogglePolicy};
use crate::storage::{FileStore, KeyValueStore, MemoryStore};

#[cfg(test)]
#[path = "app_test.rs"]
mod tests;

/// Shared context handed to every consumer.
#[derive(Clone)]
pub struct AppContext {
    pub session: SessionStore,
    pub preferences: PreferenceStore,
    /// OS appearance signal; the host pushes changes in here.
    pub appearance: Arc<HostAppearance>,
    /// Presentation flag the preference container writes to.
    pub document: Arc<DocumentRoot>,
}

impl AppContext {
    /// Build the context from configuration: file-backed storage in the state
    /// directory (memory-only if it cannot be opened) and the stand-in login
    /// service.
    #[must_use]
    pub fn from_config(config: &ConsoleConfig) -> Self {
        let storage = open_storage(config);
        let backend = Arc::new(MockCredentialExchange::new(config.login_latency));
        let appearance = Arc::new(HostAppearance::new(config.system_appearance));
        Self::new(storage, backend, appearance, Arc::new(DocumentRoot::new()), config.toggle_policy)
    }

    /// Build the context from explicit parts.
    #[must_use]
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        backend: Arc<dyn CredentialExchange>,
        appearance: Arc<HostAppearance>,
        document: Arc<DocumentRoot>,
        toggle_policy: TogglePolicy,
    ) -> Self {
        let session = SessionStore::new(Arc::clone(&storage), backend);
        let preferences = PreferenceStore::new(storage, appearance.clone(), document.clone(), toggle_policy);
        Self { session, preferences, appearance, document }
    }
}

/// Open the state directory, falling back to memory-only storage with a
/// warning when it is unusable.
pub fn open_storage(config: &ConsoleConfig) -> Arc<dyn KeyValueStore> {
    match FileStore::open(&config.state_dir) {
        Ok(store) => {
            tracing::debug!(dir = %store.dir().display(), "using file storage");
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(error = %e, "state directory unusable; state will not survive restart");
            Arc::new(MemoryStore::new())
        }
    }
}
