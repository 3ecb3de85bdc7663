//! Error types and Result aliases for stoker.
//!
//! This module defines the error hierarchy used throughout the crate.
//! All public functions return `Result<T, Error>` or `Result<T>`. Nothing
//! in the launcher is recoverable: configuration correctness is a
//! precondition for serving, so every failure surfaces to the operator
//! and the process exits non-zero.

use thiserror::Error;

/// Result type alias using stoker's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for stoker operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Settings discovery error.
    #[error("{0}")]
    Discovery(#[from] DiscoveryError),

    /// Configuration merge error.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Server/bind error.
    #[error("{0}")]
    Server(#[from] ServerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings-discovery errors.
///
/// Every variant is terminal at the call site; configuration discovery has
/// no transient-failure class.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// An explicit argument resolved to neither a file nor a module.
    #[error("cannot find settings file or module '{argument}'")]
    NotFound { argument: String },

    /// Nothing resolved: no conventional file, no usable environment variable.
    #[error("no settings.py found in the current directory, and missing or invalid ${env_var}")]
    NoCandidates { env_var: String },

    /// Module activation failed for a reason other than the module being
    /// absent. Kept distinct so a real fault is not reported as "not found".
    #[error("failed to activate settings module '{module}': {reason}")]
    Activation { module: String, reason: String },
}

/// Module-activation errors reported through the
/// [`ModuleActivator`](crate::discovery::ModuleActivator) seam.
#[derive(Error, Debug)]
pub enum ActivationError {
    /// The module does not exist on the activator's search path.
    #[error("module '{0}' not found")]
    NotFound(String),

    /// Probing the search path failed before existence could be decided.
    #[error("failed to probe '{path}' for module '{module}': {source}")]
    Probe {
        module: String,
        path: String,
        source: std::io::Error,
    },
}

/// Configuration-merge errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but could not be read or parsed.
    #[error("failed to read config file '{path}': {reason}")]
    Load { path: String, reason: String },

    /// A setting's validator rejected the supplied value.
    #[error("invalid value for {key}: {value}")]
    InvalidSetting { key: String, value: String },

    /// A write was attempted for a name outside the recognized catalog.
    #[error("unknown setting '{key}'")]
    UnknownSetting { key: String },
}

/// Server errors raised while constructing or running the handler.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failed to bind the listen address. `code` carries the raw OS error
    /// code when one is available, for operator-facing translation.
    #[error("failed to bind to {address}: {reason}")]
    Bind {
        address: String,
        code: Option<i32>,
        reason: String,
    },

    /// The serving loop terminated with an error.
    #[error("server error: {0}")]
    Serve(String),
}

impl ConfigError {
    /// Create an invalid-setting error from a key and the rejected value.
    pub fn invalid(key: impl Into<String>, value: impl std::fmt::Display) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            value: value.to_string(),
        }
    }
}
