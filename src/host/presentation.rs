//! Process-wide presentation flag.
//!
//! The preference container resolves light/dark once and marks the result at
//! the document level; every rendering consumer reads that mark instead of
//! resolving the preference itself.

use std::collections::BTreeSet;
use std::sync::Mutex;

use crate::observe::lock;

#[cfg(test)]
#[path = "presentation_test.rs"]
mod tests;

/// Class marking the document as dark.
pub const DARK_CLASS: &str = "dark";
/// Class marking the document as light.
pub const LIGHT_CLASS: &str = "light";

/// Write-only sink for the resolved appearance.
pub trait PresentationFlag: Send + Sync {
    fn apply(&self, is_dark: bool);
}

/// Root element class list for the console document.
#[derive(Debug, Default)]
pub struct DocumentRoot {
    classes: Mutex<BTreeSet<String>>,
}

impl DocumentRoot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        lock(&self.classes).contains(class)
    }

    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.has_class(DARK_CLASS)
    }

    pub fn add_class(&self, class: &str) {
        lock(&self.classes).insert(class.to_owned());
    }

    pub fn remove_class(&self, class: &str) {
        lock(&self.classes).remove(class);
    }

    /// Current classes in sorted order.
    #[must_use]
    pub fn classes(&self) -> Vec<String> {
        lock(&self.classes).iter().cloned().collect()
    }
}

impl PresentationFlag for DocumentRoot {
    /// Mark the document with exactly one of `dark` or `light`; other classes
    /// are left alone.
    fn apply(&self, is_dark: bool) {
        let (add, remove) = if is_dark { (DARK_CLASS, LIGHT_CLASS) } else { (LIGHT_CLASS, DARK_CLASS) };
        self.remove_class(remove);
        self.add_class(add);
        tracing::trace!(is_dark, "presentation flag applied");
    }
}
