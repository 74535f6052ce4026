//! REST API client module for the account service.
//!
//! This module provides the `ApiClient` for communicating with the
//! Account API: token exchange and refresh, the current-user and
//! profile endpoints, registration, logout, and password reset.
//!
//! The API uses JWT bearer token authentication on the identity and
//! profile endpoints; the token endpoints themselves are anonymous.

pub mod client;
pub mod error;

pub use client::{ApiClient, TokenPair};
pub use error::ApiError;
