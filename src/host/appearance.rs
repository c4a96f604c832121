//! OS appearance signal.
//!
//! Reports the operating system's preferred light/dark appearance and
//! notifies subscribers when it changes. The value is external and its timing
//! is not under the console's control.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::observe::{Observers, Subscription, lock};

#[cfg(test)]
#[path = "appearance_test.rs"]
mod tests;

/// Effective light/dark appearance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    #[default]
    Light,
    Dark,
}

impl Appearance {
    #[must_use]
    pub fn from_dark(is_dark: bool) -> Self {
        if is_dark { Self::Dark } else { Self::Light }
    }

    #[must_use]
    pub fn is_dark(self) -> bool {
        self == Self::Dark
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Parse `light` / `dark`, case-insensitively.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

/// Subscribe/query capability for the OS appearance preference.
pub trait AppearanceSignal: Send + Sync {
    /// The appearance the OS currently prefers.
    fn current(&self) -> Appearance;

    /// Call `on_change` with the new appearance every time it changes, until
    /// the returned handle is dropped.
    fn subscribe(&self, on_change: Box<dyn Fn(Appearance) + Send + Sync>) -> Subscription;
}

/// Appearance signal fed by the host process.
///
/// The host (a desktop shell bridge, the CLI's configuration, a test) pushes
/// OS changes in through [`HostAppearance::set`].
pub struct HostAppearance {
    current: Mutex<Appearance>,
    observers: Observers<Appearance>,
}

impl HostAppearance {
    #[must_use]
    pub fn new(initial: Appearance) -> Self {
        Self { current: Mutex::new(initial), observers: Observers::new() }
    }

    /// Record a new OS appearance. Subscribers are notified only when the
    /// value actually changes.
    pub fn set(&self, appearance: Appearance) {
        let changed = {
            let mut current = lock(&self.current);
            let changed = *current != appearance;
            *current = appearance;
            changed
        };
        if changed {
            tracing::debug!(appearance = appearance.as_str(), "os appearance changed");
            self.observers.notify(&appearance);
        }
    }
}

impl Default for HostAppearance {
    fn default() -> Self {
        Self::new(Appearance::default())
    }
}

impl AppearanceSignal for HostAppearance {
    fn current(&self) -> Appearance {
        *lock(&self.current)
    }

    fn subscribe(&self, on_change: Box<dyn Fn(Appearance) + Send + Sync>) -> Subscription {
        self.observers.subscribe(move |appearance| on_change(*appearance))
    }
}
