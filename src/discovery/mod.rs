//! Settings discovery.
//!
//! Resolves which settings source governs the process, trying in order:
//! - an explicit file path or dotted module name from the command line
//! - the conventional `settings.py` in the working directory
//! - the module named by the ambient environment variable

mod activator;
mod locator;

pub use activator::{ModuleActivator, SearchPathActivator};
pub use locator::{Locator, SettingsKind, SettingsRef, SETTINGS_ENV_VAR, SETTINGS_FILE};
