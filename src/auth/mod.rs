//! Authentication module for managing the client session lifecycle.
//!
//! This module provides:
//! - `Session`: in-memory session state with a generation counter
//! - `CredentialStore`: persisted access/refresh pair with per-slot expiries
//! - `SessionManager`: the four lifecycle operations (initialize, login,
//!   refresh, logout) plus registration and the background refresh timer
//!
//! Access tokens live ~4 hours, refresh tokens ~7 days; the manager
//! refreshes every 4 minutes while authenticated.

pub mod manager;
pub mod session;
pub mod store;

pub use manager::SessionManager;
pub use session::Session;
pub use store::{CredentialStore, StoredPair};
