//! The built-in server application.
//!
//! This module provides:
//! - the handler object the launcher constructs (bind + serve)
//! - structured logging setup

mod app;
mod observability;

pub use app::App;
pub use observability::init_tracing;
