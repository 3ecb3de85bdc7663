//! Three-pass configuration merge.
//!
//! The effective configuration is assembled in strict order: catalog
//! defaults first, then the optional config file overlay, then explicit
//! options. Later passes win for the same key. After the merge completes
//! the configuration is read-only.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::config::catalog::{catalog, Value};
use crate::error::ConfigError;

/// Explicit runtime options for the final overlay pass.
///
/// `None` is the "unset" sentinel: the option exists in the schema but was
/// not supplied, so it must not override earlier passes.
pub type Options = BTreeMap<String, Option<toml::Value>>;

/// The effective configuration: every recognized setting with its resolved
/// value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Config {
    values: BTreeMap<&'static str, Value>,
}

impl Config {
    /// Defaults pass: every catalog key with its catalog default.
    #[must_use]
    pub fn defaults() -> Self {
        let values = catalog()
            .iter()
            .map(|(name, setting)| (*name, setting.default.clone()))
            .collect();
        Self { values }
    }

    /// Build the effective configuration from all three passes.
    ///
    /// A `config_file` that is empty or names a file that does not exist is
    /// skipped; only a present-but-unreadable file is fatal.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Load`] when the config file cannot be read or parsed,
    /// [`ConfigError::InvalidSetting`] when a recognized key carries a value
    /// its validator rejects (in either overlay pass).
    pub fn merge(config_file: Option<&Path>, options: &Options) -> Result<Self, ConfigError> {
        let mut config = Self::defaults();

        if let Some(path) = config_file {
            if !path.as_os_str().is_empty() && path.is_file() {
                config.apply_file(path)?;
            }
        }

        config.apply_options(options)?;
        Ok(config)
    }

    /// File overlay pass: fold a TOML file's top-level keys in.
    ///
    /// Unrecognized keys are skipped so one config file can serve newer
    /// launchers; recognized keys go through their validator.
    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let load_error = |reason: String| ConfigError::Load {
            path: path.display().to_string(),
            reason,
        };

        let raw = fs::read_to_string(path).map_err(|err| load_error(err.to_string()))?;
        let table: toml::Table = raw
            .parse()
            .map_err(|err: toml::de::Error| load_error(err.to_string()))?;

        for (key, value) in &table {
            let key = key.to_lowercase();
            if !catalog().contains_key(key.as_str()) {
                tracing::debug!(key = %key, "ignoring unrecognized setting in config file");
                continue;
            }
            if let Err(err) = self.set(&key, value) {
                tracing::error!(%err, file = %path.display(), "rejected config file setting");
                return Err(err);
            }
        }
        Ok(())
    }

    /// Explicit-options pass: fold supplied options in, overriding earlier
    /// passes.
    ///
    /// Keys outside the catalog are extension points of the option schema,
    /// not user error, and are ignored; `None` values are the unset marker.
    fn apply_options(&mut self, options: &Options) -> Result<(), ConfigError> {
        for (key, value) in options {
            let key = key.to_lowercase();
            let Some(value) = value else { continue };
            if !catalog().contains_key(key.as_str()) {
                continue;
            }
            self.set(&key, value)?;
        }
        Ok(())
    }

    /// Validate `raw` and store it under `key`.
    ///
    /// Writes for names outside the catalog are rejected, never dropped.
    fn set(&mut self, key: &str, raw: &toml::Value) -> Result<(), ConfigError> {
        let key = key.to_lowercase();
        let Some((name, setting)) = catalog().get_key_value(key.as_str()) else {
            return Err(ConfigError::UnknownSetting { key });
        };
        let value = setting.validator.check(name, raw)?;
        self.values.insert(*name, value);
        Ok(())
    }

    /// Look up a setting by (case-insensitive) name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key.to_lowercase().as_str())
    }

    fn str_value(&self, key: &'static str) -> &str {
        match self.values.get(key) {
            Some(Value::Str(s)) => s,
            _ => unreachable!("{key} is a recognized string setting"),
        }
    }

    fn int_value(&self, key: &'static str) -> i64 {
        match self.values.get(key) {
            Some(Value::Int(n)) => *n,
            _ => unreachable!("{key} is a recognized integer setting"),
        }
    }

    /// Listen address, as `host:port`.
    #[must_use]
    pub fn bind(&self) -> &str {
        self.str_value("bind")
    }

    /// Listen backlog size.
    #[must_use]
    pub fn backlog(&self) -> i64 {
        self.int_value("backlog")
    }

    /// Worker process count resolved for the application host.
    #[must_use]
    pub fn workers(&self) -> i64 {
        self.int_value("workers")
    }

    /// Concurrent connections per worker.
    #[must_use]
    pub fn worker_connections(&self) -> i64 {
        self.int_value("worker_connections")
    }

    /// Worker timeout in seconds.
    #[must_use]
    pub fn timeout(&self) -> i64 {
        self.int_value("timeout")
    }

    /// Graceful shutdown timeout in seconds.
    #[must_use]
    pub fn graceful_timeout(&self) -> i64 {
        self.int_value("graceful_timeout")
    }

    /// Keep-alive seconds; zero disables.
    #[must_use]
    pub fn keepalive(&self) -> i64 {
        self.int_value("keepalive")
    }

    /// Log level, normalized lowercase.
    #[must_use]
    pub fn loglevel(&self) -> &str {
        self.str_value("loglevel")
    }

    /// Process name override, when set.
    #[must_use]
    pub fn proc_name(&self) -> Option<&str> {
        let name = self.str_value("proc_name");
        (!name.is_empty()).then_some(name)
    }

    /// Pid file path, when configured.
    #[must_use]
    pub fn pidfile(&self) -> Option<&Path> {
        let path = self.str_value("pidfile");
        (!path.is_empty()).then(|| Path::new(path))
    }
}
