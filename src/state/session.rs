//! Auth-session state for the current console operator.
//!
//! SYSTEM CONTEXT
//! ==============
//! Route guards and identity-aware chrome (header user menu, role-gated
//! navigation) read this container. The durable subset (`user`, `token`,
//! `is_authenticated`) survives restarts; `is_loading` and `error` never do.
//!
//! CONCURRENCY
//! ===========
//! `login` and `refresh_token` suspend while the backend answers, and other
//! calls may land in that window. Every session mutation bumps a generation
//! counter inside the state lock. A login only writes its result if the
//! generation is still the one it started with; a `logout`, `set_user` or newer
//! `login` issued meanwhile wins and the older result is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::{AuthError, CredentialExchange, Grant, User};
use crate::observe::Subscription;
use crate::persist;
use crate::state::cell::StateCell;
use crate::storage::KeyValueStore;

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;

/// Storage key for the durable session snapshot.
pub const SESSION_STORAGE_KEY: &str = "skywatch.session";
/// Snapshot layout version; bump when `SessionSnapshot` changes shape.
pub const SESSION_SNAPSHOT_VERSION: u32 = 1;

/// Full in-memory session state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub token: Option<String>,
    /// Always `user.is_some() && token.is_some()`.
    pub is_authenticated: bool,
    pub is_loading: bool,
    /// Message from the most recent failed login.
    pub error: Option<String>,
}

impl SessionState {
    /// Durable subset written to storage.
    #[must_use]
    pub fn durable(&self) -> SessionSnapshot {
        SessionSnapshot {
            user: self.user.clone(),
            token: self.token.clone(),
            is_authenticated: self.is_authenticated,
        }
    }

    /// Rebuild state from a stored snapshot. Transient fields start at their
    /// defaults and `is_authenticated` is recomputed from `user` and `token`.
    #[must_use]
    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        let is_authenticated = snapshot.user.is_some() && snapshot.token.is_some();
        if is_authenticated != snapshot.is_authenticated {
            tracing::warn!(
                stored = snapshot.is_authenticated,
                derived = is_authenticated,
                "inconsistent session snapshot; normalising"
            );
        }
        Self { user: snapshot.user, token: snapshot.token, is_authenticated, is_loading: false, error: None }
    }
}

/// What survives a restart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub token: Option<String>,
    pub is_authenticated: bool,
}

/// How a login call ended when the backend did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The grant was written into the session.
    SignedIn,
    /// Another session mutation was issued while waiting; the grant was dropped.
    Superseded,
}

/// Shared handle to the session container.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    cell: StateCell<SessionState>,
    generation: AtomicU64,
    backend: Arc<dyn CredentialExchange>,
    _persistence: Subscription,
}

impl SessionInner {
    /// Start a new generation. Only called inside a state-lock closure.
    fn bump(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

impl SessionStore {
    /// Build the container, rehydrating from `storage` and mirroring every
    /// later change back into it.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>, backend: Arc<dyn CredentialExchange>) -> Self {
        let restored: Option<SessionSnapshot> =
            persist::restore(storage.as_ref(), SESSION_STORAGE_KEY, SESSION_SNAPSHOT_VERSION);
        let initial = restored.map(SessionState::from_snapshot).unwrap_or_default();
        if initial.is_authenticated {
            tracing::info!(
                user = initial.user.as_ref().map_or("", |u| u.username.as_str()),
                "session restored"
            );
        }

        let cell = StateCell::new(initial);
        let persistence = persist::attach(
            &cell,
            storage,
            SESSION_STORAGE_KEY,
            SESSION_SNAPSHOT_VERSION,
            SessionState::durable,
        );

        Self {
            inner: Arc::new(SessionInner { cell, generation: AtomicU64::new(0), backend, _persistence: persistence }),
        }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.inner.cell.get()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.cell.read(|s| s.is_authenticated)
    }

    /// Observe every state change until the handle drops.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.inner.cell.subscribe(observer)
    }

    /// Exchange credentials and, if nothing else touched the session while
    /// waiting, sign in.
    ///
    /// `is_loading` is set for the duration and cleared on every exit path.
    /// On failure the error message lands in `error` and `user`/`token` keep
    /// their previous values.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`AuthError`] when the exchange fails.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let inner = &self.inner;
        let attempt = inner.cell.update(|state| {
            state.is_loading = true;
            state.error = None;
            inner.bump()
        });
        tracing::info!(%username, attempt, "login started");

        let result = inner.backend.exchange(username, password).await;

        let applied = inner.cell.try_update(|state| {
            if !inner.is_current(attempt) {
                return None;
            }
            state.is_loading = false;
            Some(match result {
                Ok(Grant { mut user, token }) => {
                    user.last_login = Some(now_utc());
                    state.user = Some(user);
                    state.token = Some(token);
                    state.is_authenticated = true;
                    Ok(())
                }
                Err(err) => {
                    state.error = Some(err.to_string());
                    Err(err)
                }
            })
        });

        match applied {
            None => {
                tracing::info!(%username, attempt, "login superseded; result discarded");
                Ok(LoginOutcome::Superseded)
            }
            Some(Ok(())) => {
                tracing::info!(%username, "login succeeded");
                Ok(LoginOutcome::SignedIn)
            }
            Some(Err(err)) => {
                tracing::warn!(%username, error = %err, "login failed");
                Err(err)
            }
        }
    }

    /// Sign out. Always succeeds, is idempotent, and abandons any in-flight
    /// login.
    pub fn logout(&self) {
        let inner = &self.inner;
        let was_authenticated = inner.cell.update(|state| {
            inner.bump();
            let was = state.is_authenticated;
            *state = SessionState::default();
            was
        });
        if was_authenticated {
            tracing::info!("logged out");
        }
    }

    /// Re-validate the current token; a rejected token signs the operator out.
    ///
    /// Does nothing without a token. If the session changed while the backend
    /// was answering, the stale verdict is ignored.
    pub async fn refresh_token(&self) {
        let Some(token) = self.inner.cell.read(|s| s.token.clone()) else {
            return;
        };

        match self.inner.backend.validate(&token).await {
            Ok(()) => tracing::debug!("token still valid"),
            Err(err) => {
                let inner = &self.inner;
                let cleared = inner.cell.try_update(|state| {
                    if state.token.as_deref() != Some(token.as_str()) {
                        return None;
                    }
                    inner.bump();
                    *state = SessionState::default();
                    Some(())
                });
                if cleared.is_some() {
                    tracing::info!(error = %err, "token refresh failed; signed out");
                }
            }
        }
    }

    /// Drop the last login error. Idempotent.
    pub fn clear_error(&self) {
        self.inner.cell.try_update(|state| state.error.take().map(|_| ()));
    }

    /// Replace the identity record without touching the token.
    ///
    /// Used for out-of-band profile updates. Supersedes an in-flight login.
    pub fn set_user(&self, user: User) {
        let inner = &self.inner;
        inner.cell.update(|state| {
            inner.bump();
            state.user = Some(user);
            state.is_loading = false;
            state.is_authenticated = state.token.is_some();
        });
    }
}

/// Current UTC time truncated to whole seconds.
fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(0).unwrap_or(now)
}
