//! Utility functions for string formatting.

pub mod format;

pub use format::{format_session_range, truncate_string};
