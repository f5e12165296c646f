//! The three resource verbs: `check`, `in` (here [`get`]) and `out` ([`put`]).

pub mod check;
pub mod get;
pub mod put;

pub use check::check;
pub use get::get;
pub use put::put;

/// File written into the `in` destination directory.
pub const OUTPUT_FILE: &str = "output.json";
