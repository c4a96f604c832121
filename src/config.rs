//! Console configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::host::Appearance;
use crate::state::TogglePolicy;

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;

pub const DEFAULT_LOGIN_LATENCY_MS: u64 = 1000;
pub const STATE_DIR_NAME: &str = "skywatch";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {var}: {value} (expected {expected})")]
    Invalid { var: &'static str, value: String, expected: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Directory holding persisted state snapshots.
    pub state_dir: PathBuf,
    /// Simulated round trip of the stand-in login service.
    pub login_latency: Duration,
    /// OS appearance reported before the host pushes any change.
    pub system_appearance: Appearance,
    pub toggle_policy: TogglePolicy,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            login_latency: Duration::from_millis(DEFAULT_LOGIN_LATENCY_MS),
            system_appearance: Appearance::Light,
            toggle_policy: TogglePolicy::Light,
        }
    }
}

impl ConsoleConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `SKYWATCH_STATE_DIR`: default `<data-local-dir>/skywatch`
    /// - `SKYWATCH_LOGIN_LATENCY_MS`: default 1000; unparsable values fall back
    /// - `SKYWATCH_SYSTEM_APPEARANCE`: `light` (default) or `dark`
    /// - `SKYWATCH_TOGGLE_POLICY`: `light` (default) or `opposite`
    ///
    /// # Errors
    ///
    /// Returns an error when an appearance or toggle policy value is not
    /// recognised.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ConsoleConfig::from_env`] but reading through `lookup`.
    ///
    /// # Errors
    ///
    /// See [`ConsoleConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let state_dir = lookup("SKYWATCH_STATE_DIR")
            .filter(|v| !v.trim().is_empty())
            .map_or_else(default_state_dir, PathBuf::from);

        let login_latency = Duration::from_millis(
            lookup("SKYWATCH_LOGIN_LATENCY_MS")
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_LOGIN_LATENCY_MS),
        );

        let system_appearance = match lookup("SKYWATCH_SYSTEM_APPEARANCE") {
            None => Appearance::Light,
            Some(raw) => Appearance::parse(&raw).ok_or(ConfigError::Invalid {
                var: "SKYWATCH_SYSTEM_APPEARANCE",
                value: raw,
                expected: "light or dark",
            })?,
        };

        let toggle_policy = match lookup("SKYWATCH_TOGGLE_POLICY") {
            None => TogglePolicy::Light,
            Some(raw) => TogglePolicy::parse(&raw).ok_or(ConfigError::Invalid {
                var: "SKYWATCH_TOGGLE_POLICY",
                value: raw,
                expected: "light or opposite",
            })?,
        };

        Ok(Self { state_dir, login_latency, system_appearance, toggle_policy })
    }
}

/// `<data-local-dir>/skywatch`, or `./.skywatch` when the platform has none.
#[must_use]
pub fn default_state_dir() -> PathBuf {
    dirs::data_local_dir().map_or_else(|| PathBuf::from(".skywatch"), |dir| dir.join(STATE_DIR_NAME))
}
