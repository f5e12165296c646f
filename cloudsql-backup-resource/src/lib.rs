//! Cloud SQL Backup Resource Library
//!
//! Exposes Cloud SQL backup runs as versions of a pipeline resource:
//! `check` lists them, `in` waits for one to succeed, `out` starts a new one.

pub mod auth;
pub mod client;
pub mod config;
pub mod models;
pub mod poller;
pub mod protocol;
pub mod resource;
pub mod signals;
pub mod utils;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use config::Config;
pub use utils::errors::ResourceError;
pub type Result<T> = std::result::Result<T, ResourceError>;
