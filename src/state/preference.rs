//! Display appearance preference.
//!
//! DESIGN
//! ======
//! `theme` is what the operator asked for; `is_dark` is what the console
//! shows. `is_dark` is resolved synchronously on every `set_theme` and, while
//! the theme is `system`, again whenever the OS appearance signal fires. The
//! resolved value is pushed to the process-wide presentation flag so
//! rendering code never resolves the preference itself.
//!
//! Only `theme` is persisted; `is_dark` is recomputed on every start.

use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};

use crate::host::{Appearance, AppearanceSignal, PresentationFlag};
use crate::observe::Subscription;
use crate::persist;
use crate::state::cell::StateCell;
use crate::storage::KeyValueStore;

#[cfg(test)]
#[path = "preference_test.rs"]
mod tests;

/// Storage key for the durable preference snapshot.
pub const PREFERENCE_STORAGE_KEY: &str = "skywatch.preferences";
pub const PREFERENCE_SNAPSHOT_VERSION: u32 = 1;

/// Operator-selected display mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    /// Follow the OS appearance signal.
    #[default]
    System,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// Resolve the effective dark flag for `theme` given the OS appearance.
#[must_use]
pub fn resolve(theme: Theme, os: Appearance) -> bool {
    match theme {
        Theme::Light => false,
        Theme::Dark => true,
        Theme::System => os.is_dark(),
    }
}

/// What `toggle_theme` does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TogglePolicy {
    /// `light` becomes `dark`; anything else becomes `light`. Toggling away
    /// from `system` lands on `light` regardless of what the OS shows.
    #[default]
    Light,
    /// Switch to the opposite of what is currently shown.
    Opposite,
}

impl TogglePolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Opposite => "opposite",
        }
    }

    #[must_use]
    pub fn next(self, state: PreferenceState) -> Theme {
        match self {
            Self::Light => {
                if state.theme == Theme::Light {
                    Theme::Dark
                } else {
                    Theme::Light
                }
            }
            Self::Opposite => {
                if state.is_dark {
                    Theme::Light
                } else {
                    Theme::Dark
                }
            }
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "light" => Some(Self::Light),
            "opposite" => Some(Self::Opposite),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PreferenceState {
    pub theme: Theme,
    pub is_dark: bool,
}

impl PreferenceState {
    #[must_use]
    pub fn durable(self) -> PreferenceSnapshot {
        PreferenceSnapshot { theme: self.theme }
    }

    #[must_use]
    pub fn appearance(self) -> Appearance {
        Appearance::from_dark(self.is_dark)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceSnapshot {
    pub theme: Theme,
}

/// Shared handle to the preference container.
#[derive(Clone)]
pub struct PreferenceStore {
    inner: Arc<PreferenceInner>,
}

struct PreferenceInner {
    cell: StateCell<PreferenceState>,
    signal: Arc<dyn AppearanceSignal>,
    flag: Arc<dyn PresentationFlag>,
    policy: TogglePolicy,
    _persistence: Subscription,
    _os_subscription: Subscription,
}

impl PreferenceInner {
    /// Store `theme`, resolve and apply. Runs inside the state lock.
    fn apply_theme(&self, state: &mut PreferenceState, theme: Theme) {
        state.theme = theme;
        state.is_dark = resolve(theme, self.signal.current());
        self.flag.apply(state.is_dark);
    }

    fn set_theme(&self, theme: Theme) {
        let is_dark = self.cell.update(|state| {
            self.apply_theme(state, theme);
            state.is_dark
        });
        tracing::debug!(theme = theme.as_str(), is_dark, "theme set");
    }

    /// Re-resolve against the signal's current value rather than the pushed
    /// one; concurrent OS changes may deliver notifications out of order.
    fn follow_os(&self) {
        let followed = self.cell.try_update(|state| {
            if state.theme != Theme::System {
                return None;
            }
            state.is_dark = self.signal.current().is_dark();
            self.flag.apply(state.is_dark);
            Some(state.is_dark)
        });
        if let Some(is_dark) = followed {
            tracing::debug!(is_dark, "following os appearance");
        }
    }
}

impl PreferenceStore {
    /// Build the container: restore `theme`, apply it once so the presentation
    /// flag matches, and start following the OS signal.
    ///
    /// The OS subscription lives as long as the container; dropping the last
    /// handle releases it.
    #[must_use]
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        signal: Arc<dyn AppearanceSignal>,
        flag: Arc<dyn PresentationFlag>,
        policy: TogglePolicy,
    ) -> Self {
        let restored: Option<PreferenceSnapshot> =
            persist::restore(storage.as_ref(), PREFERENCE_STORAGE_KEY, PREFERENCE_SNAPSHOT_VERSION);
        let theme = restored.map(|s| s.theme).unwrap_or_default();

        let cell = StateCell::new(PreferenceState { theme, is_dark: false });
        let persistence = persist::attach(
            &cell,
            storage,
            PREFERENCE_STORAGE_KEY,
            PREFERENCE_SNAPSHOT_VERSION,
            |state: &PreferenceState| state.durable(),
        );

        let inner = Arc::new_cyclic(|weak: &Weak<PreferenceInner>| {
            let weak = weak.clone();
            let os_subscription = signal.subscribe(Box::new(move |_: Appearance| {
                if let Some(inner) = weak.upgrade() {
                    inner.follow_os();
                }
            }));
            PreferenceInner {
                cell,
                signal,
                flag,
                policy,
                _persistence: persistence,
                _os_subscription: os_subscription,
            }
        });

        inner.set_theme(theme);
        Self { inner }
    }

    #[must_use]
    pub fn snapshot(&self) -> PreferenceState {
        self.inner.cell.get()
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.inner.cell.read(|s| s.theme)
    }

    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.inner.cell.read(|s| s.is_dark)
    }

    #[must_use]
    pub fn policy(&self) -> TogglePolicy {
        self.inner.policy
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&PreferenceState) + Send + Sync + 'static,
    {
        self.inner.cell.subscribe(observer)
    }

    /// Store `theme`, resolve `is_dark` against the OS signal when needed, and
    /// apply it to the presentation flag.
    pub fn set_theme(&self, theme: Theme) {
        self.inner.set_theme(theme);
    }

    /// Flip the theme according to the configured [`TogglePolicy`].
    pub fn toggle_theme(&self) -> Theme {
        let inner = &self.inner;
        let next = inner.cell.update(|state| {
            let next = inner.policy.next(*state);
            inner.apply_theme(state, next);
            next
        });
        tracing::debug!(theme = next.as_str(), "theme toggled");
        next
    }
}
