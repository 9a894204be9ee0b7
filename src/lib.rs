//! Conference submission browser.
//!
//! Fetches conferences and their submitted sessions from the upstream
//! conference API, keeps them in a lazily initialized in-memory cache, and
//! serves normalized, filterable listings over a JSON API.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod server;
pub mod source;
pub mod telemetry;

pub use error::{Result, SessionsError};
