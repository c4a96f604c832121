//! Operator identity and the login backend seam.
//!
//! SYSTEM CONTEXT
//! ==============
//! `types` defines the signed-in operator record shared with the session
//! container; `backend` is where a real credential-exchange service plugs in.
//! Today only the local stand-in exists.

pub mod backend;
pub mod types;

pub use backend::{CredentialExchange, MockCredentialExchange, generate_token};
pub use types::{AuthError, Grant, Role, User, WILDCARD_PERMISSION};
