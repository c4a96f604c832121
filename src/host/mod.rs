//! Host environment collaborators.
//!
//! SYSTEM CONTEXT
//! ==============
//! The preference container reads the OS light/dark signal and writes the
//! resolved appearance to a process-wide presentation flag. Both are traits so
//! a browser host, a desktop shell, or a test can supply them.

pub mod appearance;
pub mod presentation;

pub use appearance::{Appearance, AppearanceSignal, HostAppearance};
pub use presentation::{DARK_CLASS, DocumentRoot, LIGHT_CLASS, PresentationFlag};
