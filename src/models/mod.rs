//! Data models for the account service.
//!
//! This module contains the data structures returned by the Account API:
//!
//! - `Identity`: the minimal authenticated user record from `/api/me/`
//! - `Profile`, `CountryChoice`: the extended user-editable record from
//!   `/api/user-profile/`
//! - `ProfileTextUpdate`: the writable subset of profile fields

pub mod identity;
pub mod profile;

pub use identity::Identity;
pub use profile::{CountryChoice, Profile, ProfileTextUpdate};
