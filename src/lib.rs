//! # skywatch
//!
//! Client-resident state for the Skywatch camera/drone-detection console.
//!
//! Two containers back the console chrome: [`state::session::SessionStore`]
//! (who is signed in) and [`state::preference::PreferenceStore`] (light/dark
//! appearance). Both mirror a durable subset of their state into a
//! [`storage::KeyValueStore`] after every change and rehydrate from it when
//! constructed. [`app::AppContext`] builds them once per process and hands
//! them to consumers by reference.

pub mod app;
pub mod auth;
pub mod config;
pub mod host;
pub mod observe;
pub mod persist;
pub mod state;
pub mod storage;
