//! Core library for sportclubs.
//!
//! Provides the authenticated client for the InnoHassle sport API, the
//! token provider it depends on, the club/group/training data model, and
//! the schedule aggregation used to build "upcoming trainings" views.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod schedule;
pub mod utils;

pub use api::{ApiClient, ApiError, RequestBody};
pub use auth::{LocalStorage, TokenProvider};
pub use config::Config;
pub use schedule::{upcoming_sessions, UpcomingSession, DEFAULT_UPCOMING_LIMIT};
