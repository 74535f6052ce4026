//! accountkit - session manager and API client for the account service.
//!
//! The library owns the client-side authentication lifecycle: credential
//! exchange, interval-based token refresh, persisted credential storage,
//! and the authenticated identity/profile. The `accountkit` binary is a
//! thin CLI over it.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiClient, ApiError};
pub use auth::{CredentialStore, SessionManager};
pub use config::Config;
pub use models::{Identity, Profile, ProfileTextUpdate};
