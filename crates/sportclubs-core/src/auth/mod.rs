//! Authentication module for obtaining and persisting access tokens.
//!
//! This module provides:
//! - `TokenProvider`: fetches bearer tokens from the accounts service and
//!   caches the latest one
//! - `LocalStorage`: a small persisted key/value store holding the token
//!
//! Tokens are re-acquired before every API request; the cached copy only
//! tells whether the user has signed in before.

pub mod storage;
pub mod token;

pub use storage::LocalStorage;
pub use token::{TokenProvider, ACCESS_TOKEN_KEY};
