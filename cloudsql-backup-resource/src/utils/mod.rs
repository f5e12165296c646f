//! Utility modules for the resource.

pub mod errors;
pub mod logger;

pub use errors::{ResourceError, Result};
