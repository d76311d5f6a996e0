//! REST API client module for the InnoHassle sport service.
//!
//! This module provides the `ApiClient` for communicating with the sport
//! API to fetch clubs and FAQ entries.
//!
//! Every request is authorized with a bearer token freshly obtained from
//! the accounts service through the `TokenProvider`.

pub mod client;
pub mod error;

pub use client::{ApiClient, RequestBody};
pub use error::ApiError;
