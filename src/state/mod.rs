//! Client-side state containers.
//!
//! DESIGN
//! ======
//! State is split by concern (`session`, `preference`) so consumers depend on
//! small focused models. Each container is a cheap `Clone` handle; clones share
//! the same state, observers and persistence.

pub(crate) mod cell;
pub mod preference;
pub mod session;

pub use preference::{PreferenceSnapshot, PreferenceState, PreferenceStore, Theme, TogglePolicy};
pub use session::{LoginOutcome, SessionSnapshot, SessionState, SessionStore};

#[cfg(test)]
pub(crate) mod test_helpers {
    use std::io;
    use std::sync::{Arc, Mutex, mpsc};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Semaphore;

    use crate::auth::{AuthError, CredentialExchange, Grant, MockCredentialExchange};
    use crate::storage::{KeyValueStore, MemoryStore, StorageError};

    pub(crate) fn memory() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new())
    }

    pub(crate) fn instant_backend() -> Arc<MockCredentialExchange> {
        Arc::new(MockCredentialExchange::new(Duration::ZERO))
    }

    /// Storage whose every operation fails.
    pub(crate) struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io { key: key.to_owned(), source: io::Error::other("disk gone") })
        }

        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io { key: key.to_owned(), source: io::Error::other("disk gone") })
        }
    }

    /// Memory storage that stalls the first write containing `needle` until the
    /// test releases it.
    pub(crate) struct HeldStore {
        inner: MemoryStore,
        needle: &'static str,
        held: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
    }

    impl HeldStore {
        /// Returns the store, a receiver that fires once the write is held, and
        /// the sender that releases it.
        pub(crate) fn new(needle: &'static str) -> (Arc<Self>, mpsc::Receiver<()>, mpsc::Sender<()>) {
            let (entered_tx, entered_rx) = mpsc::channel();
            let (release_tx, release_rx) = mpsc::channel();
            let store = Arc::new(Self {
                inner: MemoryStore::new(),
                needle,
                held: Mutex::new(Some((entered_tx, release_rx))),
            });
            (store, entered_rx, release_tx)
        }
    }

    impl KeyValueStore for HeldStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if value.contains(self.needle) {
                let held = self.held.lock().unwrap().take();
                if let Some((entered, release)) = held {
                    entered.send(()).unwrap();
                    release.recv().unwrap();
                }
            }
            self.inner.set(key, value)
        }
    }

    /// Backend that refuses every login and every token.
    pub(crate) struct OfflineBackend;

    #[async_trait]
    impl CredentialExchange for OfflineBackend {
        async fn exchange(&self, _username: &str, _password: &str) -> Result<Grant, AuthError> {
            Err(AuthError::Backend("offline".into()))
        }

        async fn validate(&self, _token: &str) -> Result<(), AuthError> {
            Err(AuthError::TokenRejected("expired".into()))
        }
    }

    /// Mock backend that holds each call until the test adds a permit.
    pub(crate) struct GatedBackend {
        pub(crate) gate: Arc<Semaphore>,
        inner: MockCredentialExchange,
        reject_tokens: bool,
    }

    impl GatedBackend {
        pub(crate) fn new(reject_tokens: bool) -> Self {
            Self {
                gate: Arc::new(Semaphore::new(0)),
                inner: MockCredentialExchange::new(Duration::ZERO),
                reject_tokens,
            }
        }

        async fn wait(&self) -> Result<(), AuthError> {
            let permit = self.gate.acquire().await.map_err(|e| AuthError::Backend(e.to_string()))?;
            permit.forget();
            Ok(())
        }
    }

    #[async_trait]
    impl CredentialExchange for GatedBackend {
        async fn exchange(&self, username: &str, password: &str) -> Result<Grant, AuthError> {
            self.wait().await?;
            self.inner.exchange(username, password).await
        }

        async fn validate(&self, token: &str) -> Result<(), AuthError> {
            self.wait().await?;
            if self.reject_tokens {
                return Err(AuthError::TokenRejected("revoked".into()));
            }
            self.inner.validate(token).await
        }
    }
}
