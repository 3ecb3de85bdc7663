//! Configuration resolution.
//!
//! The effective configuration is built in three strictly ordered passes:
//! - catalog defaults
//! - config file overlay (TOML)
//! - explicit options (highest priority)

mod catalog;
mod merge;

pub use catalog::{catalog, Setting, Validator, Value, LOG_LEVELS};
pub use merge::{Config, Options};
