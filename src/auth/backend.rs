//! Credential exchange: the seam between the session container and whatever
//! service issues operator tokens.
//!
//! TRADE-OFFS
//! ==========
//! The console ships without a real identity service. `MockCredentialExchange`
//! waits a configurable latency and then fabricates an administrator, so the
//! loading state is visible and the rest of the console can be exercised
//! end to end. It rejects blank credentials so the failure path is reachable.

use std::collections::BTreeSet;
use std::fmt::Write;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use uuid::Uuid;

use super::types::{AuthError, Grant, Role, User, WILDCARD_PERMISSION};

#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

/// Domain used for fabricated operator email addresses.
pub const MOCK_EMAIL_DOMAIN: &str = "skywatch.local";

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Exchanges credentials for a [`Grant`] and checks that issued tokens are
/// still good.
#[async_trait]
pub trait CredentialExchange: Send + Sync {
    /// Trade a username and password for an operator record and token.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] when the credentials are refused or the
    /// service cannot be reached.
    async fn exchange(&self, username: &str, password: &str) -> Result<Grant, AuthError>;

    /// Confirm `token` is still accepted.
    ///
    /// # Errors
    ///
    /// Returns an [`AuthError`] when the token is no longer valid.
    async fn validate(&self, token: &str) -> Result<(), AuthError>;
}

/// Local stand-in for the identity service.
#[derive(Debug, Clone)]
pub struct MockCredentialExchange {
    latency: Duration,
}

impl MockCredentialExchange {
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    fn fabricate_user(username: &str) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            username: username.to_owned(),
            email: format!("{username}@{MOCK_EMAIL_DOMAIN}"),
            role: Role::Admin,
            permissions: BTreeSet::from([WILDCARD_PERMISSION.to_owned()]),
            last_login: None,
        }
    }
}

#[async_trait]
impl CredentialExchange for MockCredentialExchange {
    async fn exchange(&self, username: &str, password: &str) -> Result<Grant, AuthError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        tracing::debug!(%username, "mock credential exchange granted");
        Ok(Grant { user: Self::fabricate_user(username), token: generate_token() })
    }

    async fn validate(&self, token: &str) -> Result<(), AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::TokenRejected("empty token".into()));
        }
        Ok(())
    }
}
